//! Print the effective configuration.

use std::path::PathBuf;

use crate::config::{self, Config};

/// Print where config came from, the merged settings and which credentials are set
pub fn cmd_show_config(explicit_path: Option<&PathBuf>, config: &Config) -> anyhow::Result<()> {
    match explicit_path.cloned().or_else(config::config_path) {
        Some(path) if path.exists() => println!("# Config file: {}", path.display()),
        Some(path) => println!("# Config file: {} (not found, using defaults)", path.display()),
        None => println!("# Config file: none (using defaults)"),
    }
    println!("# Cache file: {}", config.cache_path().display());
    println!();
    print!("{}", toml::to_string_pretty(&config.masked())?);

    println!();
    println!("Credentials:");
    print_credential("Semantic Scholar API key", config.semantic_scholar_api_key().is_some());
    print_credential("OpenAlex email", config.openalex_email().is_some());
    Ok(())
}

fn print_credential(name: &str, present: bool) {
    if present {
        println!("✓ {}: set", name);
    } else {
        println!("✗ {}: not set", name);
    }
}
