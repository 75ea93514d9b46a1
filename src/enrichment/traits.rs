//! Capability trait shared by every scholarly source client.
//!
//! The orchestrator only sees `Box<dyn ScholarlyApi>`, so tests substitute
//! the recording doubles in [`mocks`] for the real HTTP clients.

use async_trait::async_trait;

use super::domain::{EnrichedMetadata, EnrichmentSource};

/// One external metadata source.
///
/// Both lookups return `None` for every kind of miss: invalid input, not
/// found, no candidate above the source's confidence floor, or a request
/// that failed after retries. Failures are logged by the implementation.
///
/// Methods take `&mut self` because a lookup advances the client's rate
/// limiter.
#[async_trait]
pub trait ScholarlyApi: Send {
    /// Which source this client talks to.
    fn source(&self) -> EnrichmentSource;

    /// Requests sent so far, retries included.
    fn request_count(&self) -> u64;

    /// Exact lookup by DOI. Results carry no confidence score.
    async fn query_by_doi(&mut self, doi: &str) -> Option<EnrichedMetadata>;

    /// Fuzzy lookup by title, optionally narrowed by author and year.
    ///
    /// Results carry the confidence of the winning candidate.
    async fn query_by_title(
        &mut self,
        title: &str,
        author: Option<&str>,
        year: Option<&str>,
    ) -> Option<EnrichedMetadata>;
}

#[async_trait]
impl ScholarlyApi for super::crossref::CrossrefClient {
    fn source(&self) -> EnrichmentSource {
        EnrichmentSource::Crossref
    }

    fn request_count(&self) -> u64 {
        self.request_count()
    }

    async fn query_by_doi(&mut self, doi: &str) -> Option<EnrichedMetadata> {
        self.query_by_doi(doi).await
    }

    async fn query_by_title(
        &mut self,
        title: &str,
        author: Option<&str>,
        _year: Option<&str>,
    ) -> Option<EnrichedMetadata> {
        self.query_by_title(title, author).await
    }
}

#[async_trait]
impl ScholarlyApi for super::semantic_scholar::SemanticScholarClient {
    fn source(&self) -> EnrichmentSource {
        EnrichmentSource::SemanticScholar
    }

    fn request_count(&self) -> u64 {
        self.request_count()
    }

    async fn query_by_doi(&mut self, doi: &str) -> Option<EnrichedMetadata> {
        self.query_by_doi(doi).await
    }

    async fn query_by_title(
        &mut self,
        title: &str,
        author: Option<&str>,
        year: Option<&str>,
    ) -> Option<EnrichedMetadata> {
        self.query_by_title(title, author, year).await
    }
}

#[async_trait]
impl ScholarlyApi for super::openalex::OpenAlexClient {
    fn source(&self) -> EnrichmentSource {
        EnrichmentSource::OpenAlex
    }

    fn request_count(&self) -> u64 {
        self.request_count()
    }

    async fn query_by_doi(&mut self, doi: &str) -> Option<EnrichedMetadata> {
        self.query_by_doi(doi).await
    }

    async fn query_by_title(
        &mut self,
        title: &str,
        author: Option<&str>,
        year: Option<&str>,
    ) -> Option<EnrichedMetadata> {
        self.query_by_title(title, author, year).await
    }
}

#[async_trait]
impl ScholarlyApi for super::arxiv::ArxivClient {
    fn source(&self) -> EnrichmentSource {
        EnrichmentSource::Arxiv
    }

    fn request_count(&self) -> u64 {
        self.request_count()
    }

    async fn query_by_doi(&mut self, doi: &str) -> Option<EnrichedMetadata> {
        self.query_by_doi(doi).await
    }

    async fn query_by_title(
        &mut self,
        title: &str,
        author: Option<&str>,
        _year: Option<&str>,
    ) -> Option<EnrichedMetadata> {
        self.query_by_title(title, author).await
    }
}
