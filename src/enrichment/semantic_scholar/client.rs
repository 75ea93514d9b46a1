//! Semantic Scholar Graph API client
//!
//! See: https://api.semanticscholar.org/api-docs/graph
//!
//! An API key is optional. Without one, requests share the public rate limit
//! and 403s are common under load.

use std::time::Duration;

use tracing::debug;

use super::{adapter, dto};
use crate::enrichment::doi::{encode_doi_path, normalize_doi};
use crate::enrichment::domain::{EnrichedMetadata, EnrichmentError, EnrichmentSource};
use crate::enrichment::http::{ClientSettings, SourceHttp, log_lookup_failure};
use crate::enrichment::similarity::{clean_title_for_search, extract_first_author, is_searchable_title};

pub const DEFAULT_BASE_URL: &str = "https://api.semanticscholar.org/graph/v1";
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_secs(1);

const SEARCH_LIMIT: u32 = 20;

const PAPER_FIELDS: &str =
    "title,authors,abstract,venue,year,citationCount,referenceCount,externalIds,url,openAccessPdf";

/// Semantic Scholar API client
pub struct SemanticScholarClient {
    http: SourceHttp,
    api_key: Option<String>,
}

impl SemanticScholarClient {
    pub fn new(settings: ClientSettings, api_key: Option<String>) -> Result<Self, EnrichmentError> {
        Ok(Self {
            http: SourceHttp::new(EnrichmentSource::SemanticScholar, settings, 50)?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn default_settings() -> ClientSettings {
        ClientSettings::new(DEFAULT_BASE_URL, DEFAULT_RATE_LIMIT)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn request_count(&self) -> u64 {
        self.http.request_count()
    }

    pub async fn query_by_doi(&mut self, doi: &str) -> Option<EnrichedMetadata> {
        match self.lookup_doi(doi).await {
            Ok(metadata) => {
                debug!("Semantic Scholar: enriched DOI {}", doi);
                Some(metadata)
            }
            Err(e) => {
                log_lookup_failure(EnrichmentSource::SemanticScholar, doi, &e);
                None
            }
        }
    }

    pub async fn query_by_title(
        &mut self,
        title: &str,
        author: Option<&str>,
        year: Option<&str>,
    ) -> Option<EnrichedMetadata> {
        match self.search_title(title, author, year).await {
            Ok(metadata) => {
                debug!(
                    "Semantic Scholar: title match with confidence {:.2}",
                    metadata.confidence_score.unwrap_or_default()
                );
                Some(metadata)
            }
            Err(e) => {
                log_lookup_failure(EnrichmentSource::SemanticScholar, title, &e);
                None
            }
        }
    }

    /// `GET /paper/DOI:{doi}`
    pub async fn lookup_doi(&mut self, doi: &str) -> Result<EnrichedMetadata, EnrichmentError> {
        let doi = normalize_doi(doi)?;
        let url = self.doi_url(&doi);
        let params = [("fields", PAPER_FIELDS.to_string())];
        let headers = self.auth_headers();

        let paper: dto::Paper = self.http.get_json(&url, &params, &headers).await?;
        Ok(adapter::to_metadata(paper))
    }

    /// `GET /paper/search?query=...`
    pub async fn search_title(
        &mut self,
        title: &str,
        author: Option<&str>,
        year: Option<&str>,
    ) -> Result<EnrichedMetadata, EnrichmentError> {
        let clean_title = clean_title_for_search(title);
        if !is_searchable_title(&clean_title) {
            return Err(EnrichmentError::TitleTooShort(title.to_string()));
        }

        let url = format!("{}/paper/search", self.http.base_url());
        let params = search_params(&clean_title, author, year);
        let headers = self.auth_headers();

        let response: dto::SearchResponse = self.http.get_json(&url, &params, &headers).await?;
        if response.data.is_empty() {
            return Err(EnrichmentError::NotFound);
        }

        adapter::select_best(title, author, response.data)
            .ok_or_else(|| EnrichmentError::NoMatch(title.to_string()))
    }

    fn doi_url(&self, doi: &str) -> String {
        format!("{}/paper/DOI:{}", self.http.base_url(), encode_doi_path(doi))
    }

    fn auth_headers(&self) -> Vec<(&'static str, String)> {
        self.api_key
            .iter()
            .map(|key| ("x-api-key", key.clone()))
            .collect()
    }
}

/// Search parameters: cleaned title plus first author as free text.
fn search_params(
    clean_title: &str,
    author: Option<&str>,
    year: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut query = clean_title.to_string();
    if let Some(first_author) = author
        .map(extract_first_author)
        .filter(|a| !a.is_empty())
    {
        query.push(' ');
        query.push_str(&first_author);
    }

    let mut params = vec![
        ("query", query),
        ("limit", SEARCH_LIMIT.to_string()),
        ("fields", PAPER_FIELDS.to_string()),
    ];

    if let Some(year) = year.map(str::trim).filter(|y| !y.is_empty()) {
        params.push(("year", year.to_string()));
    }

    params
}
