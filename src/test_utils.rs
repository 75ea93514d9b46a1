//! Test utilities and fixtures for bibfeed tests.
//!
//! Sample entries and metadata, plus a throwaway cache, so tests don't
//! repeat the same struct literals.
//!
//! # Example
//!
//! ```ignore
//! use bibfeed::test_utils::{temp_cache, mock_article};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (cache, _dir) = temp_cache();
//!     let entry = mock_article("key", "A Title Long Enough");
//!     // ... test logic
//! }
//! ```

use tempfile::TempDir;

use crate::cache::{CacheSettings, MetadataCache};
use crate::enrichment::{EnrichedMetadata, EnrichmentSource};
use crate::model::BibliographicEntry;

/// Creates an empty cache backed by a temporary directory.
///
/// Keep the `TempDir` alive for the duration of your test; the cache file
/// is deleted when it goes out of scope.
pub fn temp_cache() -> (MetadataCache, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let cache = MetadataCache::open(dir.path().join("metadata_cache.json"), CacheSettings::default());
    (cache, dir)
}

/// Creates an `article` entry with a title and two authors.
///
/// Customize with struct update syntax:
///
/// ```ignore
/// let entry = BibliographicEntry {
///     doi: Some("10.1234/test".to_string()),
///     ..mock_article("key", "Some Title")
/// };
/// ```
pub fn mock_article(key: &str, title: &str) -> BibliographicEntry {
    BibliographicEntry {
        title: Some(title.to_string()),
        authors: vec!["Jane Smith".to_string(), "Bob Lee".to_string()],
        year: Some("2021".to_string()),
        ..BibliographicEntry::new("article", key)
    }
}

/// Creates an `article` entry that has only a DOI.
pub fn mock_doi_entry(key: &str, doi: &str) -> BibliographicEntry {
    BibliographicEntry {
        doi: Some(doi.to_string()),
        ..BibliographicEntry::new("article", key)
    }
}

/// Creates metadata attributed to `source` with an abstract.
pub fn mock_metadata(source: EnrichmentSource, abstract_text: &str) -> EnrichedMetadata {
    EnrichedMetadata {
        abstract_text: Some(abstract_text.to_string()),
        authors: vec!["Jane Smith".to_string()],
        publication_date: Some("2021".to_string()),
        ..EnrichedMetadata::from_source(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_cache_starts_empty() {
        let (cache, dir) = temp_cache();
        assert!(cache.is_empty());
        assert!(cache.path().starts_with(dir.path()));
    }

    #[test]
    fn test_mock_article_defaults() {
        let entry = mock_article("k", "A Title");
        assert_eq!(entry.entry_type, "article");
        assert_eq!(entry.key, "k");
        assert_eq!(entry.authors.len(), 2);
        assert_eq!(entry.doi, None);
    }

    #[test]
    fn test_mock_metadata_source() {
        let meta = mock_metadata(EnrichmentSource::Crossref, "Foo");
        assert_eq!(meta.source, Some(EnrichmentSource::Crossref));
        assert_eq!(meta.abstract_text.as_deref(), Some("Foo"));
    }
}
