//! Crossref REST API Data Transfer Objects
//!
//! These types match what the Crossref `/works` endpoint returns.
//! DO NOT use these types outside the crossref module - convert to domain types.
//!
//! API Reference: https://api.crossref.org/swagger-ui/index.html

use serde::Deserialize;

/// `GET /works/{doi}` response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct WorkResponse {
    pub message: Work,
}

/// `GET /works?query...` response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub message: SearchMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchMessage {
    #[serde(default)]
    pub items: Vec<Work>,
    #[serde(rename = "total-results")]
    pub total_results: Option<u64>,
}

/// A single work record
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Work {
    #[serde(rename = "DOI")]
    pub doi: Option<String>,
    #[serde(rename = "URL")]
    pub url: Option<String>,
    /// Titles are always an array, usually of length 1
    #[serde(default)]
    pub title: Vec<String>,
    #[serde(default)]
    pub author: Vec<Author>,
    /// JATS-formatted abstract
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub container_title: Vec<String>,
    pub published_print: Option<DateParts>,
    pub published_online: Option<DateParts>,
    pub issued: Option<DateParts>,
    #[serde(default)]
    pub subject: Vec<String>,
    pub is_referenced_by_count: Option<u64>,
    pub references_count: Option<u64>,
    #[serde(default)]
    pub link: Vec<Link>,
    #[serde(default)]
    pub license: Vec<License>,
    /// Relevance score, only present on search results
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Author {
    pub given: Option<String>,
    pub family: Option<String>,
    /// Organization authors carry a name instead of given/family
    pub name: Option<String>,
}

/// `{"date-parts": [[2023, 5, 17]]}`; month and day may be missing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateParts {
    #[serde(rename = "date-parts", default)]
    pub date_parts: Vec<Vec<Option<i64>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Link {
    #[serde(rename = "URL")]
    pub url: Option<String>,
    pub content_type: Option<String>,
    pub intended_application: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct License {
    #[serde(rename = "URL")]
    pub url: Option<String>,
}
