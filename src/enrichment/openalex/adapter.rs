//! Adapter layer: Convert OpenAlex DTOs to domain models

use std::collections::HashMap;

use super::dto;
use crate::enrichment::doi::clean_doi;
use crate::enrichment::domain::{EnrichedMetadata, EnrichmentSource};
use crate::enrichment::similarity::{best_match, match_confidence, strip_markup};

/// OpenAlex title matches must score above this.
pub const MIN_CONFIDENCE: f64 = 0.7;

/// Concepts kept as subjects, in OpenAlex's order.
const MAX_SUBJECTS: usize = 5;

pub fn to_metadata(work: dto::Work) -> EnrichedMetadata {
    let mut metadata = EnrichedMetadata::from_source(EnrichmentSource::OpenAlex);

    if let Some(doi) = work.doi.as_deref().map(clean_doi).filter(|d| !d.is_empty()) {
        metadata.set_doi(doi);
    }

    metadata.abstract_text = work
        .abstract_inverted_index
        .as_ref()
        .and_then(reconstruct_abstract)
        .map(|a| strip_markup(&a))
        .filter(|a| !a.is_empty());

    metadata.authors = author_names(&work.authorships);

    metadata.publication_date = work
        .publication_date
        .filter(|d| !d.is_empty())
        .or_else(|| work.publication_year.map(|y| y.to_string()));

    metadata.citation_count = work.cited_by_count;
    metadata.reference_count = work.referenced_works_count;

    if let Some(location) = work.primary_location {
        metadata.url = location.landing_page_url;
        metadata.venue = location.source.and_then(|s| s.display_name);
        metadata.pdf_url = location.pdf_url;
    }

    if let Some(oa) = work.open_access {
        metadata.is_open_access = oa.is_oa;
        if let Some(oa_url) = oa.oa_url.filter(|u| !u.is_empty()) {
            metadata.pdf_url = Some(oa_url);
        }
    }

    metadata.keywords = tag_names(&work.keywords).collect();
    metadata.subjects = tag_names(&work.concepts).take(MAX_SUBJECTS).collect();

    metadata
}

/// Rebuild abstract text from OpenAlex's word -> positions index.
///
/// Returns `None` for an empty index.
pub fn reconstruct_abstract(index: &HashMap<String, Vec<usize>>) -> Option<String> {
    let mut positioned: Vec<(usize, &str)> = index
        .iter()
        .flat_map(|(word, positions)| positions.iter().map(move |&p| (p, word.as_str())))
        .collect();

    if positioned.is_empty() {
        return None;
    }

    positioned.sort_unstable();
    Some(
        positioned
            .into_iter()
            .map(|(_, word)| word)
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// Pick the best search hit above [`MIN_CONFIDENCE`].
pub fn select_best(
    query_title: &str,
    query_author: Option<&str>,
    works: Vec<dto::Work>,
) -> Option<EnrichedMetadata> {
    let (work, confidence) = best_match(works, MIN_CONFIDENCE, |work| {
        candidate_confidence(query_title, query_author, work)
    })?;
    Some(to_metadata(work).with_confidence(confidence))
}

pub fn candidate_confidence(query_title: &str, query_author: Option<&str>, work: &dto::Work) -> f64 {
    let title = work.title.as_deref().or(work.display_name.as_deref());
    match_confidence(
        query_title,
        query_author,
        title,
        &author_names(&work.authorships),
        0.0,
    )
}

fn author_names(authorships: &[dto::Authorship]) -> Vec<String> {
    authorships
        .iter()
        .filter_map(|a| a.author.as_ref()?.display_name.clone())
        .collect()
}

fn tag_names(tags: &[dto::Tag]) -> impl Iterator<Item = String> + '_ {
    tags.iter()
        .filter_map(|t| t.display_name.clone())
        .filter(|n| !n.is_empty())
}
