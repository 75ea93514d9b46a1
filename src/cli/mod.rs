//! Command-line interface for bibfeed.
//!
//! This module provides CLI commands for enriching entry lists, querying a
//! single source, and inspecting the cache and configuration.

mod commands;

pub use commands::{CacheAction, Cli, Commands, SourceArg, run_command};
