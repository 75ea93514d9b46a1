//! Adapter layer: Convert Semantic Scholar DTOs to domain models

use super::dto;
use crate::enrichment::domain::{EnrichedMetadata, EnrichmentSource};
use crate::enrichment::similarity::{best_match, match_confidence};

/// Semantic Scholar ranks well on its own, so the floor is lower than Crossref's.
pub const MIN_CONFIDENCE: f64 = 0.6;

pub fn to_metadata(paper: dto::Paper) -> EnrichedMetadata {
    let mut metadata = EnrichedMetadata::from_source(EnrichmentSource::SemanticScholar);

    metadata.abstract_text = paper.abstract_text.filter(|a| !a.trim().is_empty());
    metadata.authors = author_names(&paper.authors);
    metadata.publication_date = paper.year.map(|y| y.to_string());
    metadata.venue = paper.venue.filter(|v| !v.is_empty());
    metadata.citation_count = paper.citation_count;
    metadata.reference_count = paper.reference_count;
    metadata.url = paper.url;

    if let Some(ids) = paper.external_ids {
        if let Some(doi) = ids.doi.filter(|d| !d.is_empty()) {
            metadata.set_doi(doi);
        }
        if let Some(arxiv_id) = ids.arxiv.filter(|a| !a.is_empty()) {
            metadata.arxiv_url = Some(format!("https://arxiv.org/abs/{}", arxiv_id));
        }
    }

    if let Some(pdf_url) = paper.open_access_pdf.and_then(|p| p.url).filter(|u| !u.is_empty()) {
        metadata.pdf_url = Some(pdf_url);
        metadata.is_open_access = Some(true);
    }

    metadata
}

/// Pick the best search hit above [`MIN_CONFIDENCE`].
pub fn select_best(
    query_title: &str,
    query_author: Option<&str>,
    papers: Vec<dto::Paper>,
) -> Option<EnrichedMetadata> {
    let (paper, confidence) = best_match(papers, MIN_CONFIDENCE, |paper| {
        match_confidence(
            query_title,
            query_author,
            paper.title.as_deref(),
            &author_names(&paper.authors),
            0.0,
        )
    })?;
    Some(to_metadata(paper).with_confidence(confidence))
}

fn author_names(authors: &[dto::Author]) -> Vec<String> {
    authors
        .iter()
        .filter_map(|a| a.name.clone())
        .filter(|n| !n.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(json: &str) -> dto::Paper {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_to_metadata() {
        let p = paper(
            r#"{
                "title": "Attention Is All You Need",
                "abstract": "The dominant sequence transduction models...",
                "authors": [{"name": "Ashish Vaswani"}, {"name": ""}],
                "venue": "NeurIPS",
                "year": 2017,
                "citationCount": 100,
                "referenceCount": 40,
                "externalIds": {"DOI": "10.5555/3295222", "ArXiv": "1706.03762"},
                "url": "https://www.semanticscholar.org/paper/abc",
                "openAccessPdf": {"url": "https://arxiv.org/pdf/1706.03762"}
            }"#,
        );

        let meta = to_metadata(p);
        assert_eq!(meta.source, Some(EnrichmentSource::SemanticScholar));
        assert_eq!(meta.authors, vec!["Ashish Vaswani"]);
        assert_eq!(meta.publication_date.as_deref(), Some("2017"));
        assert_eq!(meta.venue.as_deref(), Some("NeurIPS"));
        assert_eq!(meta.citation_count, Some(100));
        assert_eq!(meta.doi_url.as_deref(), Some("https://doi.org/10.5555/3295222"));
        assert_eq!(meta.arxiv_url.as_deref(), Some("https://arxiv.org/abs/1706.03762"));
        assert_eq!(meta.pdf_url.as_deref(), Some("https://arxiv.org/pdf/1706.03762"));
        assert_eq!(meta.is_open_access, Some(true));
    }

    #[test]
    fn test_missing_fields_stay_empty() {
        let meta = to_metadata(paper(r#"{"title": "Minimal"}"#));
        assert_eq!(meta.doi, None);
        assert!(meta.authors.is_empty());
        assert_eq!(meta.is_open_access, None);
    }

    #[test]
    fn test_select_best_uses_lower_floor() {
        // title jaccard 3/6 -> 0.35, author identical -> +0.3
        let papers = vec![paper(
            r#"{"title": "Neural Graph Networks Explained Simply Today", "authors": [{"name": "Jie Zhou"}]}"#,
        )];
        let meta = select_best("Graph Neural Networks", Some("Jie Zhou"), papers).unwrap();
        let score = meta.confidence_score.unwrap();
        assert!(score > 0.6 && score < 0.7, "score was {score}");
    }
}
