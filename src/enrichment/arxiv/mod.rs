//! ArXiv API integration
//!
//! Title search over the Atom query API, plus detection of entries that
//! were published on ArXiv so the orchestrator can try ArXiv first.

mod adapter;
pub mod atom;
mod client;

use std::sync::LazyLock;

use regex::Regex;

use crate::model::BibliographicEntry;

pub use client::ArxivClient;

/// DOI prefix ArXiv registers for its own papers
const ARXIV_DOI_PREFIX: &str = "10.48550/arxiv.";

/// Raw fields that mark an ArXiv preprint when they mention ArXiv
const ARXIV_FIELDS: &[&str] = &["archiveprefix", "eprint", "primaryclass"];

/// `2501.00123`
static NEW_STYLE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}\.\d{4,5}$").expect("valid regex"));
/// `cs-lg/0501001`
static OLD_STYLE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z-]+/\d{7}$").expect("valid regex"));

/// ArXiv identifier inside a `10.48550/arXiv.<id>` DOI.
pub fn arxiv_id_from_doi(doi: &str) -> Option<&str> {
    let head = doi.get(..ARXIV_DOI_PREFIX.len())?;
    if !head.eq_ignore_ascii_case(ARXIV_DOI_PREFIX) {
        return None;
    }
    Some(&doi[ARXIV_DOI_PREFIX.len()..]).filter(|id| !id.is_empty())
}

/// Whether `value` looks like a bare ArXiv identifier.
pub fn looks_like_arxiv_id(value: &str) -> bool {
    let value = value.trim();
    NEW_STYLE_ID.is_match(value) || OLD_STYLE_ID.is_match(value)
}

/// Whether an entry was (also) published on ArXiv.
pub fn is_arxiv_entry(entry: &BibliographicEntry) -> bool {
    if entry
        .journal
        .as_deref()
        .is_some_and(|j| j.to_lowercase().contains("arxiv"))
    {
        return true;
    }

    let mentions_arxiv = |value: &str| value.to_lowercase().contains("arxiv") || value.starts_with("arXiv:");
    if [entry.doi.as_deref(), entry.url.as_deref()]
        .into_iter()
        .flatten()
        .any(mentions_arxiv)
    {
        return true;
    }

    entry.raw_fields.iter().any(|(name, value)| {
        let name = name.to_lowercase();
        (ARXIV_FIELDS.contains(&name.as_str()) && value.to_lowercase().contains("arxiv"))
            || (name == "eprint" && looks_like_arxiv_id(value))
    })
}
