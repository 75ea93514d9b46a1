//! Adapter layer: Convert Crossref DTOs to domain models
//!
//! This is the ONLY place where Crossref DTO types are converted to domain types.

use super::dto;
use crate::enrichment::domain::{EnrichedMetadata, EnrichmentSource};
use crate::enrichment::similarity::{best_match, match_confidence, strip_markup};

/// Crossref title matches must score above this.
pub const MIN_CONFIDENCE: f64 = 0.7;

/// Cap on the boost derived from Crossref's own relevance score.
const MAX_SCORE_BOOST: f64 = 0.1;

/// Convert a Crossref work into enriched metadata.
pub fn to_metadata(work: dto::Work) -> EnrichedMetadata {
    let mut metadata = EnrichedMetadata::from_source(EnrichmentSource::Crossref);

    if let Some(doi) = work.doi.filter(|d| !d.is_empty()) {
        metadata.set_doi(doi);
    }

    metadata.abstract_text = work
        .abstract_text
        .as_deref()
        .map(strip_markup)
        .filter(|a| !a.is_empty());

    metadata.authors = author_names(&work.author);

    metadata.publication_date = [&work.published_print, &work.published_online, &work.issued]
        .into_iter()
        .flatten()
        .find_map(format_date);

    metadata.venue = work.container_title.into_iter().find(|t| !t.is_empty());
    metadata.citation_count = work.is_referenced_by_count;
    metadata.reference_count = work.references_count;
    metadata.subjects = work.subject;
    metadata.url = work.url;

    metadata.pdf_url = work
        .link
        .iter()
        .find(|l| l.content_type.as_deref() == Some("application/pdf"))
        .and_then(|l| l.url.clone());

    if work
        .license
        .iter()
        .filter_map(|l| l.url.as_deref())
        .any(|u| u.contains("creativecommons.org"))
    {
        metadata.is_open_access = Some(true);
    }

    metadata
}

/// Pick the best search hit and convert it, or `None` if nothing clears
/// [`MIN_CONFIDENCE`].
pub fn select_best(
    query_title: &str,
    query_author: Option<&str>,
    items: Vec<dto::Work>,
) -> Option<EnrichedMetadata> {
    let (work, confidence) = best_match(items, MIN_CONFIDENCE, |work| {
        candidate_confidence(query_title, query_author, work)
    })?;
    Some(to_metadata(work).with_confidence(confidence))
}

/// Title/author confidence plus a small boost from Crossref's relevance score.
pub fn candidate_confidence(query_title: &str, query_author: Option<&str>, work: &dto::Work) -> f64 {
    let boost = work
        .score
        .filter(|s| *s > 0.0)
        .map_or(0.0, |s| (s / 100.0).min(MAX_SCORE_BOOST));

    match_confidence(
        query_title,
        query_author,
        work.title.first().map(String::as_str),
        &author_names(&work.author),
        boost,
    )
}

/// `given family`, or `family` alone when there is no given name.
fn author_names(authors: &[dto::Author]) -> Vec<String> {
    authors
        .iter()
        .filter_map(|a| match (&a.given, &a.family) {
            (Some(given), Some(family)) => Some(format!("{} {}", given, family)),
            (None, Some(family)) => Some(family.clone()),
            _ => None,
        })
        .collect()
}

/// `YYYY-MM-DD`, `YYYY-MM` or `YYYY` depending on how many parts are known.
fn format_date(date: &dto::DateParts) -> Option<String> {
    let parts: Vec<i64> = date
        .date_parts
        .first()?
        .iter()
        .map_while(|p| *p)
        .collect();

    match parts.as_slice() {
        [year, month, day, ..] => Some(format!("{}-{:02}-{:02}", year, month, day)),
        [year, month] => Some(format!("{}-{:02}", year, month)),
        [year] => Some(year.to_string()),
        [] => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(json: &str) -> dto::Work {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_to_metadata_full_record() {
        let w = work(
            r#"{
                "DOI": "10.1234/test",
                "URL": "https://doi.org/10.1234/test",
                "title": ["Test Paper"],
                "abstract": "<jats:p>Foo</jats:p>",
                "author": [{"given": "Jane", "family": "Doe"}, {"family": "Smith"}, {"name": "ACME Lab"}],
                "container-title": ["Nature"],
                "published-print": {"date-parts": [[2023, 5, 7]]},
                "is-referenced-by-count": 42,
                "references-count": 10,
                "subject": ["Biology"],
                "link": [{"URL": "https://example.com/p.pdf", "content-type": "application/pdf"}],
                "license": [{"URL": "https://creativecommons.org/licenses/by/4.0/"}]
            }"#,
        );

        let meta = to_metadata(w);
        assert_eq!(meta.source, Some(EnrichmentSource::Crossref));
        assert_eq!(meta.doi.as_deref(), Some("10.1234/test"));
        assert_eq!(meta.doi_url.as_deref(), Some("https://doi.org/10.1234/test"));
        assert_eq!(meta.abstract_text.as_deref(), Some("Foo"));
        assert_eq!(meta.authors, vec!["Jane Doe", "Smith"]);
        assert_eq!(meta.publication_date.as_deref(), Some("2023-05-07"));
        assert_eq!(meta.venue.as_deref(), Some("Nature"));
        assert_eq!(meta.citation_count, Some(42));
        assert_eq!(meta.reference_count, Some(10));
        assert_eq!(meta.subjects, vec!["Biology"]);
        assert_eq!(meta.pdf_url.as_deref(), Some("https://example.com/p.pdf"));
        assert_eq!(meta.is_open_access, Some(true));
        assert_eq!(meta.confidence_score, None);
    }

    #[test]
    fn test_date_precision() {
        let w = work(r#"{"published-online": {"date-parts": [[2021, 3]]}}"#);
        assert_eq!(to_metadata(w).publication_date.as_deref(), Some("2021-03"));

        let w = work(r#"{"issued": {"date-parts": [[2019]]}}"#);
        assert_eq!(to_metadata(w).publication_date.as_deref(), Some("2019"));

        let w = work(r#"{"issued": {"date-parts": [[null]]}}"#);
        assert_eq!(to_metadata(w).publication_date, None);
    }

    #[test]
    fn test_print_date_preferred() {
        let w = work(
            r#"{
                "published-print": {"date-parts": [[2020, 1, 2]]},
                "published-online": {"date-parts": [[2019, 12, 1]]}
            }"#,
        );
        assert_eq!(to_metadata(w).publication_date.as_deref(), Some("2020-01-02"));
    }

    #[test]
    fn test_select_best_applies_score_boost() {
        let items = vec![
            work(r#"{"DOI": "10.1/unrelated", "title": ["Cooking With Garlic"], "score": 80.0}"#),
            work(
                r#"{"DOI": "10.1/match", "title": ["Attention Is All You Need"],
                    "author": [{"given": "Ashish", "family": "Vaswani"}], "score": 5.0}"#,
            ),
        ];

        let meta = select_best("Attention Is All You Need", Some("Ashish Vaswani"), items).unwrap();
        assert_eq!(meta.doi.as_deref(), Some("10.1/match"));
        // perfect match plus the 0.05 boost is clamped
        assert_eq!(meta.confidence_score, Some(1.0));
    }

    #[test]
    fn test_select_best_rejects_weak_candidates() {
        let items = vec![work(
            r#"{"DOI": "10.1/x", "title": ["Deep Learning for Cooking"], "score": 100.0}"#,
        )];
        assert!(select_best("Deep Learning for Protein Folding", None, items).is_none());
    }
}
