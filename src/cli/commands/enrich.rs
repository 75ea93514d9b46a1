//! Batch enrichment command.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

use crate::config::Config;
use crate::enrichment::{EnrichedMetadata, EnrichmentService};
use crate::error::{Error, Result, ResultExt};
use crate::model::BibliographicEntry;

/// Enrich every entry in `input` and write the key -> metadata map as JSON.
pub fn cmd_enrich(
    rt: &Runtime,
    config: &Config,
    input: &Path,
    output: Option<&PathBuf>,
    cache_only: bool,
) -> anyhow::Result<()> {
    let entries = read_entries(input)?;
    if entries.is_empty() {
        eprintln!("No entries in {:?}.", input);
    }

    let mut service = EnrichmentService::from_config(config)?;

    let results = if cache_only {
        service.cached_only(&entries)
    } else {
        rt.block_on(service.enrich_entries(&entries))
    };

    write_results(&results, output.map(PathBuf::as_path))?;
    eprintln!("{}", summary(&results, cache_only));
    Ok(())
}

/// Parse the JSON entry list handed over by the BibTeX parser.
fn read_entries(path: &Path) -> Result<Vec<BibliographicEntry>> {
    if !path.exists() {
        return Err(Error::not_found(path));
    }
    let contents =
        std::fs::read_to_string(path).with_context(format!("reading {}", path.display()))?;
    parse_entries(&contents).with_context(format!("parsing {}", path.display()))
}

fn parse_entries(json: &str) -> Result<Vec<BibliographicEntry>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if !value.is_array() {
        return Err(Error::invalid_input("expected a JSON array of entries"));
    }
    Ok(serde_json::from_value(value)?)
}

fn write_results(
    results: &BTreeMap<String, Option<EnrichedMetadata>>,
    output: Option<&Path>,
) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    match output {
        Some(path) => {
            std::fs::write(path, json + "\n").with_context(format!("writing {}", path.display()))
        }
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

fn summary(results: &BTreeMap<String, Option<EnrichedMetadata>>, cache_only: bool) -> String {
    let found = results.values().filter(|m| m.is_some()).count();
    let mode = if cache_only { " (cache only)" } else { "" };
    format!(
        "✓ Metadata for {} of {} entries{}, {} without",
        found,
        results.len(),
        mode,
        results.len() - found
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::EnrichmentSource;
    use tempfile::TempDir;

    #[test]
    fn test_parse_entries() {
        let json = r#"[
            {"entry_type": "article", "key": "a", "title": "A Title", "authors": ["X Y"]},
            {"entry_type": "misc", "key": "b", "url": "https://example.com"}
        ]"#;
        let entries = parse_entries(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].authors, vec!["X Y"]);
        assert_eq!(entries[1].url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_parse_entries_rejects_non_array() {
        assert!(matches!(
            parse_entries(r#"{"key": "a"}"#),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(parse_entries("[oops"), Err(Error::Json(_))));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = read_entries(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_write_results_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        let mut results = BTreeMap::new();
        results.insert(
            "a".to_string(),
            Some(EnrichedMetadata::from_source(EnrichmentSource::Crossref)),
        );
        results.insert("b".to_string(), None);

        write_results(&results, Some(&path)).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["a"]["source"], "crossref");
        assert!(written["b"].is_null());
        assert!(summary(&results, false).contains("1 of 2 entries"));
    }
}
