//! Adapter layer: Convert ArXiv Atom entries to domain models

use super::atom::AtomEntry;
use crate::enrichment::domain::{EnrichedMetadata, EnrichmentSource};
use crate::enrichment::similarity::{best_match, match_confidence};

/// ArXiv relevance ranking is good, so the floor matches Semantic Scholar's.
pub const MIN_CONFIDENCE: f64 = 0.6;

pub fn to_metadata(entry: AtomEntry) -> EnrichedMetadata {
    let mut metadata = EnrichedMetadata::from_source(EnrichmentSource::Arxiv);

    metadata.abstract_text = Some(entry.summary).filter(|s| !s.is_empty());
    metadata.authors = entry.authors;
    metadata.publication_date = entry
        .published
        .get(..10)
        .map(str::to_string)
        .or_else(|| Some(entry.published.clone()).filter(|p| !p.is_empty()));

    if !entry.id.is_empty() {
        metadata.arxiv_url = Some(entry.id);
    }

    if let Some(pdf_url) = entry.pdf_url {
        metadata.pdf_url = Some(pdf_url);
        metadata.is_open_access = Some(true);
    }

    if let Some(doi) = entry.doi.filter(|d| !d.is_empty()) {
        metadata.set_doi(doi);
    }

    metadata.venue = entry.journal_ref.filter(|j| !j.is_empty());
    metadata.subjects = entry.categories;

    metadata
}

/// Pick the best feed entry above [`MIN_CONFIDENCE`].
pub fn select_best(
    query_title: &str,
    query_author: Option<&str>,
    entries: Vec<AtomEntry>,
) -> Option<EnrichedMetadata> {
    let (entry, confidence) = best_match(entries, MIN_CONFIDENCE, |entry| {
        match_confidence(query_title, query_author, Some(&entry.title), &entry.authors, 0.0)
    })?;
    Some(to_metadata(entry).with_confidence(confidence))
}
