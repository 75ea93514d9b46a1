//! OpenAlex API Data Transfer Objects
//!
//! These types match the `/works` entity. DO NOT use these types outside
//! the openalex module.
//!
//! API Reference: https://docs.openalex.org/api-entities/works/work-object

use std::collections::HashMap;

use serde::Deserialize;

/// `GET /works?search=...` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Work>,
}

/// A work entity
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Work {
    /// OpenAlex id URL (`https://openalex.org/W...`)
    pub id: Option<String>,
    /// Full DOI URL (`https://doi.org/10...`)
    pub doi: Option<String>,
    pub title: Option<String>,
    pub display_name: Option<String>,
    pub publication_year: Option<i32>,
    pub publication_date: Option<String>,
    pub cited_by_count: Option<u64>,
    pub referenced_works_count: Option<u64>,
    #[serde(default)]
    pub authorships: Vec<Authorship>,
    pub primary_location: Option<Location>,
    pub open_access: Option<OpenAccess>,
    /// word -> positions
    pub abstract_inverted_index: Option<HashMap<String, Vec<usize>>>,
    #[serde(default)]
    pub keywords: Vec<Tag>,
    #[serde(default)]
    pub concepts: Vec<Tag>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Authorship {
    pub author: Option<AuthorRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorRef {
    pub id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Location {
    pub source: Option<Source>,
    pub landing_page_url: Option<String>,
    pub pdf_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Source {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAccess {
    pub is_oa: Option<bool>,
    pub oa_url: Option<String>,
}

/// Keyword or concept with a display name
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tag {
    pub display_name: Option<String>,
    pub score: Option<f64>,
}
