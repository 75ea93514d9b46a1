//! Semantic Scholar API integration
//!
//! Good abstracts and citation counts; also the last resort in both the
//! DOI and title chains.

pub mod dto;
mod adapter;
mod client;

pub use client::SemanticScholarClient;
