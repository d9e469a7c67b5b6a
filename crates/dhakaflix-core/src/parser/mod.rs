//! Parsers for mirror responses
//!
//! Contains modules for parsing the different response and page types.

pub mod episodes;
pub mod listing;
pub mod search;

pub use episodes::{EpisodePage, parse_episode_number, parse_movie_episode, parse_series_episodes};
pub use listing::{DirectoryListing, parse_catalog_page, parse_directory};
pub use search::parse_search_response;

use scraper::{ElementRef, Selector};

use crate::error::{DhakaflixError, Result};

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| DhakaflixError::ParseError(format!("Invalid selector {}: {:?}", css, e)))
}

/// Text nodes that are direct children of the element
pub(crate) fn own_text(element: &ElementRef) -> String {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| text.to_string())
        .collect()
}
