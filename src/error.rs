//! Application-wide error types.
//!
//! This module provides a unified error hierarchy for the application.
//! Library modules use specific error types via `thiserror`, while
//! CLI/main uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level application error enum
//! - Module-specific errors ([`EnrichmentError`], [`CacheError`], [`ConfigError`])
//!   for detailed handling
//! - All errors implement `std::error::Error` for compatibility
//!
//! [`EnrichmentError`]: crate::enrichment::EnrichmentError
//! [`CacheError`]: crate::cache::CacheError
//! [`ConfigError`]: crate::config::ConfigError
//!
//! # Example
//!
//! ```ignore
//! use bibfeed::error::{Error, Result, ResultExt};
//!
//! fn read_entries(path: &Path) -> Result<Vec<BibliographicEntry>> {
//!     let json = std::fs::read_to_string(path).with_context("reading entries")?;
//!     Ok(serde_json::from_str(&json)?)
//! }
//! ```

use std::path::PathBuf;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
///
/// Aggregates errors from all subsystems for unified handling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON input or output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Enrichment error
    #[error("Enrichment error: {0}")]
    Enrichment(#[from] crate::enrichment::EnrichmentError),

    /// Cache file error
    #[error("Cache error: {0}")]
    Cache(#[from] crate::cache::CacheError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// File not found
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Input that isn't a list of entries
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, serde_json::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Json(e).context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("/path/to/refs.json");
        assert!(err.to_string().contains("/path/to/refs.json"));
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::invalid_input("expected an array").context("while reading refs.json");
        let msg = err.to_string();
        assert!(msg.contains("while reading refs.json"));
        assert!(msg.contains("expected an array"));
    }

    #[test]
    fn test_enrichment_error_converts() {
        let err: Error = crate::enrichment::EnrichmentError::NotFound.into();
        assert!(err.to_string().starts_with("Enrichment error"));
    }

    #[test]
    fn test_result_ext() {
        let result: std::result::Result<(), serde_json::Error> =
            serde_json::from_str::<()>("nope").map(|_| ());
        let with_ctx = result.with_context("parsing entries");
        assert!(with_ctx.unwrap_err().to_string().contains("parsing entries"));
    }
}
