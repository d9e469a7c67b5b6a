//! DhakaFlix Mirror Search Core Library
//!
//! Provides an async API for searching a set of LAN media mirrors at once and
//! resolving search hits into playable files.
//!
//! # Overview
//!
//! The mirrors are independent HTTP file servers that all speak the same
//! search RPC but answer in one of two response shapes. This crate provides:
//! - A fan-out search that queries every mirror concurrently under one
//!   deadline, then merges, deduplicates and ranks whatever came back
//! - Noise filtering and bigram relevance scoring for listing titles
//! - A bounded directory crawler that finds playable files inside a folder
//! - Parsers for search responses, directory listings and episode pages
//!
//! # Example
//!
//! ```no_run
//! use dhakaflix_core::{DhakaflixSource, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let source = DhakaflixSource::new()?;
//!
//!     let results = source.search("interstellar").await?;
//!     for entry in &results {
//!         println!("{}: {}", entry.title, entry.location);
//!     }
//!
//!     if let Some(entry) = results.first() {
//!         for episode in source.list_episodes(&entry.location).await? {
//!             let links = source.playable_links(&episode.url)?;
//!             println!("{} -> {}", episode.name, links[0].url);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Partial results
//!
//! A mirror that is down or slow never fails a search. Anything that has not
//! answered by [`SearchConfig::overall_deadline`] is abandoned and the search
//! returns what the other mirrors sent. Only when no mirror answers at all
//! does [`DhakaflixSource::search`] return [`DhakaflixError::NoResults`].

pub mod adapter;
pub mod cache;
mod client;
pub mod config;
pub mod crawl;
mod error;
pub mod parser;
pub mod relevance;
pub mod search;
mod source;
mod types;
pub mod url;

// Re-export client types
pub use client::DhakaflixClient;

// Re-export configuration
pub use config::{
    ClientConfig, CrawlConfig, EpisodeSort, ProtocolVariant, RelevanceConfig, SearchConfig,
    ServerDescriptor, SourceConfig, TagMatch,
};

// Re-export error types
pub use error::{DhakaflixError, Result};

// Re-export the building blocks
pub use crawl::CrawlResolver;
pub use relevance::Relevance;
pub use search::SearchCoordinator;

// Re-export main API
pub use source::DhakaflixSource;

// Re-export data types
pub use types::{Entry, Episode, EpisodeCandidate, VideoLink};
