//! Internal domain models for bibliographic enrichment.
//!
//! These types are OUR types - they don't change when external APIs change.
//! All external API responses get converted into these types via adapters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Metadata gathered for one bibliographic entry.
///
/// Produced fresh on every enrichment attempt by exactly one source; results
/// from different sources are never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichedMetadata {
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub keywords: Vec<String>,
    pub doi: Option<String>,
    /// `https://doi.org/<doi>`
    pub doi_url: Option<String>,
    /// Landing page URL
    pub url: Option<String>,
    pub arxiv_url: Option<String>,
    pub pdf_url: Option<String>,
    /// Year, year-month or full date, depending on what the source knows
    pub publication_date: Option<String>,
    pub citation_count: Option<u64>,
    pub reference_count: Option<u64>,
    pub venue: Option<String>,
    pub authors: Vec<String>,
    pub subjects: Vec<String>,
    pub is_open_access: Option<bool>,
    /// Which source produced this record
    pub source: Option<EnrichmentSource>,
    /// Match confidence (0.0 to 1.0); only set for title-based matches
    pub confidence_score: Option<f64>,
}

impl EnrichedMetadata {
    /// Empty metadata attributed to `source`.
    pub fn from_source(source: EnrichmentSource) -> Self {
        Self {
            source: Some(source),
            ..Default::default()
        }
    }

    /// Set `doi` and the matching `doi_url`.
    pub fn set_doi(&mut self, doi: impl Into<String>) {
        let doi = doi.into();
        self.doi_url = Some(format!("https://doi.org/{}", doi));
        self.doi = Some(doi);
    }

    /// Attach a title-match confidence, clamped to `[0, 1]`.
    pub fn with_confidence(mut self, score: f64) -> Self {
        self.confidence_score = Some(score.clamp(0.0, 1.0));
        self
    }
}

/// Source of enrichment data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnrichmentSource {
    #[serde(rename = "crossref")]
    Crossref,
    #[serde(rename = "semantic_scholar")]
    SemanticScholar,
    #[serde(rename = "arxiv")]
    Arxiv,
    #[serde(rename = "openalex")]
    OpenAlex,
    /// Static lookup table of known institutional reports
    #[serde(rename = "institutional", alias = "datasociety")]
    Institutional,
    /// Minimal record synthesized from the entry URL
    #[serde(rename = "url")]
    Url,
}

impl EnrichmentSource {
    /// Stable identifier, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crossref => "crossref",
            Self::SemanticScholar => "semantic_scholar",
            Self::Arxiv => "arxiv",
            Self::OpenAlex => "openalex",
            Self::Institutional => "institutional",
            Self::Url => "url",
        }
    }

    /// Human readable name for log lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Crossref => "Crossref",
            Self::SemanticScholar => "Semantic Scholar",
            Self::Arxiv => "ArXiv",
            Self::OpenAlex => "OpenAlex",
            Self::Institutional => "Institutional",
            Self::Url => "URL",
        }
    }
}

impl fmt::Display for EnrichmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during enrichment
#[derive(Debug, Clone, thiserror::Error)]
pub enum EnrichmentError {
    #[error("Invalid DOI format: {0}")]
    InvalidDoi(String),

    #[error("Title too short for reliable search: {0}")]
    TitleTooShort(String),

    #[error("Not found")]
    NotFound,

    #[error("Access denied (HTTP 403) - check API key")]
    AccessDenied,

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("Server error: HTTP {0}")]
    Server(u16),

    #[error("API request failed: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Lookup not supported: {0}")]
    Unsupported(String),

    #[error("No match found: {0}")]
    NoMatch(String),
}

impl EnrichmentError {
    /// Transient errors worth another attempt after backing off.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Server(_) | Self::Timeout(_) | Self::Network(_)
        )
    }
}
