//! Core data model for bibliographic entries.
//!
//! A [`BibliographicEntry`] is produced by the upstream BibTeX parser and
//! handed to the enrichment engine as JSON. Entries are immutable once
//! parsed; the citation key identifies an entry within one batch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Entry types treated as institutional reports / white papers.
const REPORT_TYPES: &[&str] = &["techreport", "report", "whitepaper"];

/// A single parsed bibliographic entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BibliographicEntry {
    /// BibTeX entry type (`article`, `inproceedings`, `techreport`, ...)
    pub entry_type: String,
    /// Citation key
    pub key: String,
    pub title: Option<String>,
    /// Authors in the order they appear in the source file
    pub authors: Vec<String>,
    pub year: Option<String>,
    /// Month, normalized to two digits by the parser when possible
    pub month: Option<String>,
    pub doi: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    /// Journal or venue name
    pub journal: Option<String>,
    /// Every field as it appeared in the source, keys lowercased by the parser
    pub raw_fields: HashMap<String, String>,
}

impl BibliographicEntry {
    /// Create an entry with just a type and key.
    pub fn new(entry_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into(),
            key: key.into(),
            ..Default::default()
        }
    }

    /// Authors joined with `" and "`, the BibTeX separator.
    ///
    /// Author similarity splits on the same separator, so each author is
    /// compared individually.
    pub fn author_query(&self) -> Option<String> {
        if self.authors.is_empty() {
            None
        } else {
            Some(self.authors.join(" and "))
        }
    }

    /// Case-insensitive raw field lookup.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.raw_fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether this entry is an institutional report or white paper.
    pub fn is_report(&self) -> bool {
        let kind = self.entry_type.to_lowercase();
        REPORT_TYPES.contains(&kind.as_str())
    }

    /// Title trimmed, or `None` when missing or blank.
    pub fn title_text(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// DOI trimmed, or `None` when missing or blank.
    pub fn doi_text(&self) -> Option<&str> {
        self.doi.as_deref().map(str::trim).filter(|d| !d.is_empty())
    }

    /// URL trimmed, or `None` when missing or blank.
    pub fn url_text(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}
