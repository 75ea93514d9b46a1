//! CLI command definitions and dispatch.
//!
//! This module provides the command-line interface for bibfeed.
//! Each subcommand is implemented in its own submodule for maintainability:
//! - `enrich`: Batch enrichment of a JSON entry list
//! - `lookup`: Query one source for one DOI or title
//! - `cache`: Cache statistics and cleanup
//! - `show_config`: Print the effective configuration
//! - `init_config`: Write a starter config file

mod cache;
mod enrich;
mod init_config;
mod lookup;
mod show_config;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::config::{self, Config, Overrides};
use crate::enrichment::EnrichmentSource;

pub use cache::{cmd_cache_clean, cmd_cache_stats};
pub use enrich::cmd_enrich;
pub use init_config::cmd_init_config;
pub use lookup::cmd_lookup;
pub use show_config::cmd_show_config;

/// Enrich bibliographic entries with metadata from scholarly APIs
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: <config dir>/bibfeed/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimum seconds between requests, for every source
    #[arg(long, global = true, value_name = "SECS")]
    pub rate_limit: Option<f64>,

    /// Request timeout in seconds, for every source
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Semantic Scholar API key (or set SEMANTIC_SCHOLAR_API_KEY env var)
    #[arg(
        long,
        global = true,
        env = "SEMANTIC_SCHOLAR_API_KEY",
        hide_env_values = true
    )]
    pub semantic_scholar_api_key: Option<String>,

    /// Contact email for the OpenAlex polite pool (or set OPENALEX_EMAIL env var)
    #[arg(long, global = true, env = "OPENALEX_EMAIL")]
    pub openalex_email: Option<String>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Enrich a JSON list of parsed entries
    Enrich {
        /// JSON array of entries from the BibTeX parser
        input: PathBuf,
        /// Write results here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Only use cached metadata; make no requests
        #[arg(long)]
        cache_only: bool,
        /// Cache file to use instead of the configured one
        #[arg(long)]
        cache: Option<PathBuf>,
    },
    /// Query a single source by DOI or title
    Lookup {
        /// Source to query
        #[arg(long, value_enum)]
        source: SourceArg,
        /// DOI to resolve
        #[arg(long, conflicts_with = "title", required_unless_present = "title")]
        doi: Option<String>,
        /// Title to search for
        #[arg(long)]
        title: Option<String>,
        /// Author(s), separated by " and "
        #[arg(long, requires = "title")]
        author: Option<String>,
        /// Publication year
        #[arg(long, requires = "title")]
        year: Option<String>,
    },
    /// Inspect or clean the metadata cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
        /// Cache file to use instead of the configured one
        #[arg(long)]
        cache: Option<PathBuf>,
    },
    /// Print the effective configuration (secrets masked)
    ShowConfig,
    /// Write the defaults, plus any flags given, to the config file
    InitConfig {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Cache maintenance actions
#[derive(Subcommand, Clone, Copy)]
pub enum CacheAction {
    /// Show record counts
    Stats,
    /// Remove expired records
    Clean,
}

/// Sources that can be queried directly
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceArg {
    Crossref,
    SemanticScholar,
    Openalex,
    Arxiv,
}

impl From<SourceArg> for EnrichmentSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Crossref => EnrichmentSource::Crossref,
            SourceArg::SemanticScholar => EnrichmentSource::SemanticScholar,
            SourceArg::Openalex => EnrichmentSource::OpenAlex,
            SourceArg::Arxiv => EnrichmentSource::Arxiv,
        }
    }
}

impl Cli {
    fn overrides(&self, cache_path: Option<&PathBuf>) -> Overrides {
        Overrides {
            rate_limit_secs: self.rate_limit,
            timeout_secs: self.timeout,
            semantic_scholar_api_key: self.semantic_scholar_api_key.clone(),
            openalex_email: self.openalex_email.clone(),
            cache_path: cache_path.cloned(),
        }
    }

    /// Config file plus command-line overrides.
    ///
    /// An explicit `--config` that can't be read is an error; the default
    /// location falls back to built-in defaults.
    fn load_config(&self, cache_path: Option<&PathBuf>) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => config::load_from(path)?,
            None => config::load(),
        };
        config.apply_overrides(&self.overrides(cache_path));
        Ok(config)
    }
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Enrich {
            input,
            output,
            cache_only,
            cache,
        } => {
            let config = cli.load_config(cache.as_ref())?;
            let rt = Runtime::new()?;
            cmd_enrich(&rt, &config, input, output.as_ref(), *cache_only)
        }
        Commands::Lookup {
            source,
            doi,
            title,
            author,
            year,
        } => {
            let config = cli.load_config(None)?;
            let rt = Runtime::new()?;
            cmd_lookup(
                &rt,
                &config,
                (*source).into(),
                doi.as_deref(),
                title.as_deref(),
                author.as_deref(),
                year.as_deref(),
            )
        }
        Commands::Cache { action, cache } => {
            let config = cli.load_config(cache.as_ref())?;
            match action {
                CacheAction::Stats => cmd_cache_stats(&config),
                CacheAction::Clean => cmd_cache_clean(&config),
            }
        }
        Commands::ShowConfig => {
            let config = cli.load_config(None)?;
            cmd_show_config(cli.config.as_ref(), &config)
        }
        Commands::InitConfig { force } => {
            // Start from defaults so a broken file can be replaced
            let mut config = Config::default();
            config.apply_overrides(&cli.overrides(None));
            cmd_init_config(cli.config.as_ref(), &config, *force)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_enrich() {
        let cli = Cli::try_parse_from([
            "bibfeed",
            "--rate-limit",
            "2",
            "enrich",
            "refs.json",
            "-o",
            "out.json",
            "--cache-only",
        ])
        .unwrap();

        assert_eq!(cli.rate_limit, Some(2.0));
        match cli.command {
            Commands::Enrich {
                input,
                output,
                cache_only,
                cache,
            } => {
                assert_eq!(input, PathBuf::from("refs.json"));
                assert_eq!(output, Some(PathBuf::from("out.json")));
                assert!(cache_only);
                assert_eq!(cache, None);
            }
            _ => panic!("expected enrich"),
        }
    }

    #[test]
    fn test_lookup_requires_doi_or_title() {
        assert!(Cli::try_parse_from(["bibfeed", "lookup", "--source", "crossref"]).is_err());
        assert!(
            Cli::try_parse_from([
                "bibfeed", "lookup", "--source", "crossref", "--doi", "10.1/x", "--title", "T"
            ])
            .is_err()
        );

        let cli = Cli::try_parse_from([
            "bibfeed",
            "lookup",
            "--source",
            "semantic-scholar",
            "--title",
            "Attention Is All You Need",
            "--year",
            "2017",
        ])
        .unwrap();
        match cli.command {
            Commands::Lookup { source, year, .. } => {
                assert_eq!(source, SourceArg::SemanticScholar);
                assert_eq!(year.as_deref(), Some("2017"));
            }
            _ => panic!("expected lookup"),
        }
    }

    #[test]
    fn test_source_arg_maps_to_source() {
        assert_eq!(
            EnrichmentSource::from(SourceArg::Openalex),
            EnrichmentSource::OpenAlex
        );
        assert_eq!(EnrichmentSource::from(SourceArg::Arxiv), EnrichmentSource::Arxiv);
    }

    #[test]
    fn test_parse_init_config() {
        let cli = Cli::try_parse_from([
            "bibfeed",
            "--config",
            "custom.toml",
            "--openalex-email",
            "me@example.org",
            "init-config",
            "--force",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.command, Commands::InitConfig { force: true }));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "bibfeed",
            "--timeout",
            "30",
            "--openalex-email",
            "me@example.org",
            "cache",
            "stats",
        ])
        .unwrap();
        let overrides = cli.overrides(Some(&PathBuf::from("c.json")));
        assert_eq!(overrides.timeout_secs, Some(30.0));
        assert_eq!(overrides.openalex_email.as_deref(), Some("me@example.org"));
        assert_eq!(overrides.cache_path, Some(PathBuf::from("c.json")));
    }
}
