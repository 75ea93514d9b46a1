//! Single-source lookup, for checking what one API returns.

use tokio::runtime::Runtime;

use crate::config::Config;
use crate::enrichment::{EnrichmentSource, ScholarlyApi, build_source};

/// Query `source` by DOI, or by title when no DOI is given.
pub fn cmd_lookup(
    rt: &Runtime,
    config: &Config,
    source: EnrichmentSource,
    doi: Option<&str>,
    title: Option<&str>,
    author: Option<&str>,
    year: Option<&str>,
) -> anyhow::Result<()> {
    let Some(mut client) = build_source(config, source)? else {
        anyhow::bail!("{} is disabled in the configuration", source.display_name());
    };

    let result = rt.block_on(async {
        match (doi, title) {
            (Some(doi), _) => {
                eprintln!("Looking up DOI {} on {}...", doi, source.display_name());
                client.query_by_doi(doi).await
            }
            (None, Some(title)) => {
                eprintln!("Searching {} for {:?}...", source.display_name(), title);
                client.query_by_title(title, author, year).await
            }
            (None, None) => None,
        }
    });

    match result {
        Some(metadata) => {
            if let Some(confidence) = metadata.confidence_score {
                eprintln!("✓ Match found (confidence: {:.0}%)", confidence * 100.0);
            } else {
                eprintln!("✓ Match found");
            }
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        None => {
            eprintln!("✗ No match from {}.", source.display_name());
            eprintln!("  Run with --verbose to see why.");
        }
    }
    Ok(())
}
