//! Crossref API integration
//!
//! DOI lookups and fuzzy title search against the Crossref `/works` endpoint.

pub mod dto;
mod adapter;
mod client;

pub use client::CrossrefClient;
