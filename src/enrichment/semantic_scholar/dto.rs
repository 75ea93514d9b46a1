//! Semantic Scholar Graph API Data Transfer Objects
//!
//! These types match the `/graph/v1/paper/...` responses for the field set
//! we request. DO NOT use these types outside the semantic_scholar module.
//!
//! API Reference: https://api.semanticscholar.org/api-docs/graph

use serde::Deserialize;

/// `GET /paper/search` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    pub total: Option<u64>,
    pub offset: Option<u64>,
    #[serde(default)]
    pub data: Vec<Paper>,
}

/// A paper, as returned by `GET /paper/{id}` or inside search results
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub paper_id: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub venue: Option<String>,
    pub year: Option<i32>,
    pub citation_count: Option<u64>,
    pub reference_count: Option<u64>,
    pub external_ids: Option<ExternalIds>,
    /// Semantic Scholar page for the paper
    pub url: Option<String>,
    pub open_access_pdf: Option<OpenAccessPdf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub author_id: Option<String>,
    pub name: Option<String>,
}

/// Identifiers in other systems. Only the ones we use are declared;
/// numeric ids like `CorpusId` are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalIds {
    #[serde(rename = "DOI")]
    pub doi: Option<String>,
    #[serde(rename = "ArXiv")]
    pub arxiv: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAccessPdf {
    pub url: Option<String>,
    pub status: Option<String>,
}
