//! ArXiv query API client
//!
//! See: https://info.arxiv.org/help/api/user-manual.html
//!
//! IMPORTANT: ArXiv asks for at least 3 seconds between requests. The limit
//! is enforced here regardless of configuration.

use std::time::Duration;

use tracing::{debug, warn};

use super::{adapter, arxiv_id_from_doi, atom};
use crate::enrichment::doi::clean_doi;
use crate::enrichment::domain::{EnrichedMetadata, EnrichmentError, EnrichmentSource};
use crate::enrichment::http::{ClientSettings, SourceHttp, log_lookup_failure};
use crate::enrichment::similarity::{clean_title_for_search, is_searchable_title};

pub const DEFAULT_BASE_URL: &str = "http://export.arxiv.org/api/query";

/// Hard floor on the interval between requests
pub const MIN_RATE_LIMIT: Duration = Duration::from_secs(3);

const MAX_RESULTS: u32 = 10;

/// ArXiv API client
pub struct ArxivClient {
    http: SourceHttp,
}

impl ArxivClient {
    /// Create a client. A configured rate limit below 3s is raised to 3s.
    pub fn new(mut settings: ClientSettings) -> Result<Self, EnrichmentError> {
        if settings.rate_limit < MIN_RATE_LIMIT {
            warn!(
                "ArXiv rate limit {:.1}s is below the required minimum, using {:.1}s",
                settings.rate_limit.as_secs_f64(),
                MIN_RATE_LIMIT.as_secs_f64()
            );
            settings.rate_limit = MIN_RATE_LIMIT;
        }

        Ok(Self {
            http: SourceHttp::new(EnrichmentSource::Arxiv, settings, 20)?,
        })
    }

    pub fn default_settings() -> ClientSettings {
        ClientSettings::new(DEFAULT_BASE_URL, MIN_RATE_LIMIT)
    }

    pub fn request_count(&self) -> u64 {
        self.http.request_count()
    }

    pub fn min_interval(&self) -> Duration {
        self.http.min_interval()
    }

    pub async fn query_by_doi(&mut self, doi: &str) -> Option<EnrichedMetadata> {
        match self.lookup_doi(doi).await {
            Ok(metadata) => {
                debug!("ArXiv: enriched DOI {}", doi);
                Some(metadata)
            }
            Err(e) => {
                log_lookup_failure(EnrichmentSource::Arxiv, doi, &e);
                None
            }
        }
    }

    pub async fn query_by_title(
        &mut self,
        title: &str,
        author: Option<&str>,
    ) -> Option<EnrichedMetadata> {
        match self.search_title(title, author).await {
            Ok(metadata) => {
                debug!(
                    "ArXiv: title match with confidence {:.2}",
                    metadata.confidence_score.unwrap_or_default()
                );
                Some(metadata)
            }
            Err(e) => {
                log_lookup_failure(EnrichmentSource::Arxiv, title, &e);
                None
            }
        }
    }

    /// Resolve an ArXiv-issued DOI (`10.48550/arXiv.<id>`) via `id_list`.
    ///
    /// Any other DOI is unsupported and makes no request.
    pub async fn lookup_doi(&mut self, doi: &str) -> Result<EnrichedMetadata, EnrichmentError> {
        let clean = clean_doi(doi);
        let arxiv_id = arxiv_id_from_doi(&clean)
            .ok_or_else(|| EnrichmentError::Unsupported(format!("not an ArXiv DOI: {}", doi)))?;

        let params = [("id_list", arxiv_id.to_string())];
        let entries = self.fetch(&params).await?;

        let mut metadata = entries
            .into_iter()
            .next()
            .map(adapter::to_metadata)
            .ok_or(EnrichmentError::NotFound)?;
        if metadata.doi.is_none() {
            metadata.set_doi(clean);
        }
        Ok(metadata)
    }

    /// Quoted title search, then one unquoted retry if nothing came back.
    pub async fn search_title(
        &mut self,
        title: &str,
        author: Option<&str>,
    ) -> Result<EnrichedMetadata, EnrichmentError> {
        let clean_title = clean_title_for_search(title);
        if !is_searchable_title(&clean_title) {
            return Err(EnrichmentError::TitleTooShort(title.to_string()));
        }

        let mut entries = self.fetch(&search_params(&format!("ti:\"{}\"", clean_title))).await?;
        if entries.is_empty() {
            debug!("ArXiv: no exact title hits, trying broader search");
            entries = self.fetch(&search_params(&format!("ti:{}", clean_title))).await?;
        }

        if entries.is_empty() {
            return Err(EnrichmentError::NotFound);
        }

        debug!("ArXiv: scoring {} candidates", entries.len());
        adapter::select_best(title, author, entries)
            .ok_or_else(|| EnrichmentError::NoMatch(title.to_string()))
    }

    async fn fetch(&mut self, params: &[(&str, String)]) -> Result<Vec<atom::AtomEntry>, EnrichmentError> {
        let url = self.http.base_url().to_string();
        let body = self.http.get_text(&url, params, &[]).await?;
        atom::parse_feed(&body)
    }
}

fn search_params(search_query: &str) -> Vec<(&'static str, String)> {
    vec![
        ("search_query", search_query.to_string()),
        ("start", "0".to_string()),
        ("max_results", MAX_RESULTS.to_string()),
        ("sortBy", "relevance".to_string()),
        ("sortOrder", "descending".to_string()),
    ]
}
