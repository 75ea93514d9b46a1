//! OpenAlex API integration
//!
//! Abstracts arrive as an inverted index and are rebuilt in the adapter.

pub mod dto;
mod adapter;
mod client;

pub use client::OpenAlexClient;
