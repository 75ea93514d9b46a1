//! Bibliographic enrichment module - finds metadata for entries in scholarly indexes.
//!
//! # Architecture
//!
//! This module follows a clean separation between:
//! - **Domain models** (`domain.rs`) - Internal types that represent our business logic
//! - **API DTOs** (`crossref/dto.rs`, `openalex/dto.rs`, ...) - Exact API response shapes
//! - **Adapters** - Convert DTOs to domain models
//! - **Clients** - HTTP clients for external APIs, behind the [`ScholarlyApi`] trait
//! - **Similarity** - Fuzzy title/author matching shared by every client
//! - **Service** - High-level orchestration of the enrichment flow
//!
//! This decoupling means:
//! 1. API changes don't ripple through our codebase
//! 2. We can test API contracts independently
//! 3. We can swap providers without changing business logic
//!
//! # Usage
//!
//! ```ignore
//! use bibfeed::enrichment::EnrichmentService;
//!
//! let config = bibfeed::config::load();
//! let mut service = EnrichmentService::from_config(&config)?;
//!
//! let results = service.enrich_entries(&entries).await;
//! for (key, metadata) in &results {
//!     println!("{}: {:?}", key, metadata.as_ref().and_then(|m| m.doi.as_deref()));
//! }
//! ```

pub mod arxiv;
pub mod breaker;
pub mod crossref;
pub mod doi;
pub mod domain;
pub mod fallback;
pub mod http;
pub mod openalex;
pub mod semantic_scholar;
pub mod service;
pub mod similarity;
pub mod traits;

pub use arxiv::ArxivClient;
pub use crossref::CrossrefClient;
pub use domain::{EnrichedMetadata, EnrichmentError, EnrichmentSource};
pub use http::ClientSettings;
pub use openalex::OpenAlexClient;
pub use semantic_scholar::SemanticScholarClient;
pub use service::{EnrichmentConfig, EnrichmentService, build_source};
pub use traits::ScholarlyApi;
