//! Write a starter config file.

use std::path::{Path, PathBuf};

use crate::config::{self, Config};

/// Write `config` to `explicit_path`, or to the default location.
///
/// An existing file is only replaced with `force`.
pub fn cmd_init_config(
    explicit_path: Option<&PathBuf>,
    config: &Config,
    force: bool,
) -> anyhow::Result<()> {
    let path = write_config(config, explicit_path.map(PathBuf::as_path), force)?;
    println!("✓ Wrote config to {}", path.display());
    if config.semantic_scholar_api_key().is_some() {
        println!("  The file contains your Semantic Scholar API key.");
    }
    Ok(())
}

fn write_config(config: &Config, explicit_path: Option<&Path>, force: bool) -> anyhow::Result<PathBuf> {
    let path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => config::config_path().ok_or(config::ConfigError::NoConfigDir)?,
    };

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to replace it)",
            path.display()
        );
    }

    match explicit_path {
        Some(path) => config::save_to(config, path)?,
        None => config::save(config)?,
    }
    Ok(path)
}
