//! OpenAlex HTTP client
//!
//! See: https://docs.openalex.org/how-to-use-the-api/api-overview
//!
//! No key is needed. Passing a contact email as `mailto` moves requests into
//! the faster "polite pool".

use std::time::Duration;

use tracing::debug;

use super::{adapter, dto};
use crate::enrichment::doi::{encode_doi_path, normalize_doi};
use crate::enrichment::domain::{EnrichedMetadata, EnrichmentError, EnrichmentSource};
use crate::enrichment::http::{ClientSettings, SourceHttp, log_lookup_failure};
use crate::enrichment::similarity::{clean_title_for_search, is_searchable_title};

pub const DEFAULT_BASE_URL: &str = "https://api.openalex.org/works";
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);

const PER_PAGE: u32 = 10;

/// OpenAlex API client
pub struct OpenAlexClient {
    http: SourceHttp,
    email: Option<String>,
}

impl OpenAlexClient {
    pub fn new(settings: ClientSettings, email: Option<String>) -> Result<Self, EnrichmentError> {
        Ok(Self {
            http: SourceHttp::new(EnrichmentSource::OpenAlex, settings, 50)?,
            email: email.filter(|e| !e.trim().is_empty()),
        })
    }

    pub fn default_settings() -> ClientSettings {
        ClientSettings::new(DEFAULT_BASE_URL, DEFAULT_RATE_LIMIT)
    }

    pub fn request_count(&self) -> u64 {
        self.http.request_count()
    }

    pub async fn query_by_doi(&mut self, doi: &str) -> Option<EnrichedMetadata> {
        match self.lookup_doi(doi).await {
            Ok(metadata) => {
                debug!("OpenAlex: enriched DOI {}", doi);
                Some(metadata)
            }
            Err(e) => {
                log_lookup_failure(EnrichmentSource::OpenAlex, doi, &e);
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
                    "OpenAlex: title match with confidence {:.2}",
                    metadata.confidence_score.unwrap_or_default()
                );
                Some(metadata)
            }
            Err(e) => {
                log_lookup_failure(EnrichmentSource::OpenAlex, title, &e);
                None
            }
        }
    }

    /// `GET /works/https://doi.org/{doi}`; OpenAlex keys works on the DOI URL
    pub async fn lookup_doi(&mut self, doi: &str) -> Result<EnrichedMetadata, EnrichmentError> {
        let doi = normalize_doi(doi)?;
        let url = self.doi_url(&doi);
        let params = self.polite_params();
        let work: dto::Work = self.http.get_json(&url, &params, &[]).await?;
        Ok(adapter::to_metadata(work))
    }

    /// `GET /works?search=...`
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

        let params = self.search_params(&clean_title, year);
        let url = self.http.base_url().to_string();
        let response: dto::SearchResponse = self.http.get_json(&url, &params, &[]).await?;

        if response.results.is_empty() {
            return Err(EnrichmentError::NotFound);
        }

        adapter::select_best(title, author, response.results)
            .ok_or_else(|| EnrichmentError::NoMatch(title.to_string()))
    }

    fn doi_url(&self, doi: &str) -> String {
        format!("{}/https://doi.org/{}", self.http.base_url(), encode_doi_path(doi))
    }

    fn polite_params(&self) -> Vec<(&'static str, String)> {
        self.email.iter().map(|e| ("mailto", e.clone())).collect()
    }

    fn search_params(&self, clean_title: &str, year: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("search", clean_title.to_string()),
            ("per_page", PER_PAGE.to_string()),
        ];

        if let Some(year) = year
            .map(str::trim)
            .filter(|y| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()))
        {
            params.push(("filter", format!("publication_year:{}", year)));
        }

        params.extend(self.polite_params());
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(email: Option<&str>) -> OpenAlexClient {
        let settings = ClientSettings::new("http://localhost:9/works", Duration::ZERO);
        OpenAlexClient::new(settings, email.map(String::from)).unwrap()
    }

    #[test]
    fn test_doi_lookup_uses_full_doi_url() {
        let c = client(None);
        assert_eq!(
            c.doi_url("10.1234/test"),
            "http://localhost:9/works/https://doi.org/10.1234/test"
        );
        assert_eq!(
            c.doi_url("10.1002/abc;2-#"),
            "http://localhost:9/works/https://doi.org/10.1002/abc%3B2-%23"
        );
    }

    #[test]
    fn test_mailto_only_with_email() {
        assert!(client(None).polite_params().is_empty());
        assert_eq!(
            client(Some("me@example.org")).polite_params(),
            vec![("mailto", "me@example.org".to_string())]
        );
    }

    #[test]
    fn test_search_params_year_filter() {
        let c = client(Some("me@example.org"));
        let params = c.search_params("Deep Learning Survey", Some("2019"));
        assert!(params.contains(&("search", "Deep Learning Survey".to_string())));
        assert!(params.contains(&("filter", "publication_year:2019".to_string())));
        assert!(params.contains(&("mailto", "me@example.org".to_string())));

        let params = c.search_params("Deep Learning Survey", Some("forthcoming"));
        assert!(!params.iter().any(|(k, _)| *k == "filter"));
    }

    #[tokio::test]
    async fn test_invalid_doi_makes_no_request() {
        let mut c = client(None);
        assert!(c.query_by_doi("not-a-doi").await.is_none());
        assert_eq!(c.request_count(), 0);
    }
}
