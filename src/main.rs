//! bibfeed - metadata enrichment for bibliographic feeds.
//!
//! Takes the entries parsed from a BibTeX export and looks each one up in
//! Crossref, OpenAlex, Semantic Scholar and ArXiv, caching what it finds so
//! scheduled feed rebuilds only query new or recently failed entries.

pub mod cache;
pub mod cli;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod model;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging; RUST_LOG can add directives for other crates
    let level = if args.verbose {
        "bibfeed=debug"
    } else {
        "bibfeed=info"
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    cli::run_command(&args)
}
