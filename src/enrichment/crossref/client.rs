//! Crossref HTTP client
//!
//! See: https://api.crossref.org/swagger-ui/index.html
//!
//! Crossref asks clients to identify themselves via User-Agent to get into
//! the "polite" pool.

use std::time::Duration;

use tracing::debug;

use super::{adapter, dto};
use crate::enrichment::doi::normalize_doi;
use crate::enrichment::domain::{EnrichedMetadata, EnrichmentError, EnrichmentSource};
use crate::enrichment::http::{ClientSettings, SourceHttp, log_lookup_failure};
use crate::enrichment::similarity::{clean_title_for_search, extract_first_author, is_searchable_title};

pub const DEFAULT_BASE_URL: &str = "https://api.crossref.org/works";
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_secs(1);

/// Number of search hits scored per title query
const SEARCH_ROWS: u32 = 10;

const SELECT_FIELDS: &str = "DOI,URL,title,author,published-print,published-online,issued,\
abstract,subject,container-title,references-count,is-referenced-by-count,link,license,score";

/// Crossref API client
pub struct CrossrefClient {
    http: SourceHttp,
}

impl CrossrefClient {
    /// Create a client from connection settings
    pub fn new(settings: ClientSettings) -> Result<Self, EnrichmentError> {
        Ok(Self {
            http: SourceHttp::new(EnrichmentSource::Crossref, settings, 50)?,
        })
    }

    /// Default settings for the public API
    pub fn default_settings() -> ClientSettings {
        ClientSettings::new(DEFAULT_BASE_URL, DEFAULT_RATE_LIMIT)
    }

    pub fn request_count(&self) -> u64 {
        self.http.request_count()
    }

    /// Look up a DOI, logging and swallowing any failure.
    pub async fn query_by_doi(&mut self, doi: &str) -> Option<EnrichedMetadata> {
        match self.lookup_doi(doi).await {
            Ok(metadata) => {
                debug!("Crossref: enriched DOI {}", doi);
                Some(metadata)
            }
            Err(e) => {
                log_lookup_failure(EnrichmentSource::Crossref, doi, &e);
                None
            }
        }
    }

    /// Search by title, logging and swallowing any failure.
    pub async fn query_by_title(
        &mut self,
        title: &str,
        author: Option<&str>,
    ) -> Option<EnrichedMetadata> {
        match self.search_title(title, author).await {
            Ok(metadata) => {
                debug!(
                    "Crossref: title match with confidence {:.2}",
                    metadata.confidence_score.unwrap_or_default()
                );
                Some(metadata)
            }
            Err(e) => {
                log_lookup_failure(EnrichmentSource::Crossref, title, &e);
                None
            }
        }
    }

    /// `GET /works/{doi}`
    pub async fn lookup_doi(&mut self, doi: &str) -> Result<EnrichedMetadata, EnrichmentError> {
        let doi = normalize_doi(doi)?;
        let url = self.doi_url(&doi);
        let response: dto::WorkResponse = self.http.get_json(&url, &[], &[]).await?;
        Ok(adapter::to_metadata(response.message))
    }

    /// `GET /works?query.title=...` and pick the best-scoring hit
    pub async fn search_title(
        &mut self,
        title: &str,
        author: Option<&str>,
    ) -> Result<EnrichedMetadata, EnrichmentError> {
        let clean_title = clean_title_for_search(title);
        if !is_searchable_title(&clean_title) {
            return Err(EnrichmentError::TitleTooShort(title.to_string()));
        }

        let params = search_params(&clean_title, author);
        let url = self.http.base_url().to_string();
        let response: dto::SearchResponse = self.http.get_json(&url, &params, &[]).await?;

        let items = response.message.items;
        if items.is_empty() {
            return Err(EnrichmentError::NotFound);
        }

        adapter::select_best(title, author, items)
            .ok_or_else(|| EnrichmentError::NoMatch(title.to_string()))
    }

    fn doi_url(&self, doi: &str) -> String {
        format!("{}/{}", self.http.base_url(), urlencoding::encode(doi))
    }
}

/// Query parameters for a title search.
fn search_params(clean_title: &str, author: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("query.title", clean_title.to_string()),
        ("rows", SEARCH_ROWS.to_string()),
        ("select", SELECT_FIELDS.to_string()),
    ];

    if let Some(first_author) = author
        .map(extract_first_author)
        .filter(|a| !a.is_empty())
    {
        params.push(("query.author", first_author));
    }

    params
}
