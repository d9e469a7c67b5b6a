//! Search RPC response parsers
//!
//! The mirrors answer the same `{"action":"get","search":{…}}` request in
//! two shapes, selected per server by [`ProtocolVariant`].

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::config::{ProtocolVariant, ServerDescriptor};
use crate::error::{DhakaflixError, Result};
use crate::types::Entry;
use crate::url::{folder_thumbnail, host_root, sanitize_url, title_from_href};

static SIZED_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"href"\s*:\s*"([^"]+)"[^{}]*?"size"\s*:\s*(null|\d+)"#).expect("static pattern")
});
static REPEATED_SLASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/{2,}").expect("static pattern"));

#[derive(Debug, Deserialize)]
struct SearchArrayResponse {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    href: String,
}

/// Parses a search RPC response body into entries
///
/// Locations from either shape go through [`sanitize_url`], so the same
/// file reported by both shapes has the same location. Entries are
/// returned unfiltered; noise and relevance filtering happen
/// after all servers have answered.
///
/// # Errors
/// Returns `ParseError` if a `SearchArray` body is not valid JSON
pub fn parse_search_response(body: &str, server: &ServerDescriptor) -> Result<Vec<Entry>> {
    match server.protocol {
        ProtocolVariant::SearchArray => {
            parse_search_array(body, &server.base_url, &server.thumbnail_file)
        }
        ProtocolVariant::SizedPairs => {
            parse_sized_pairs(body, &server.base_url, &server.thumbnail_file)
        }
    }
}

/// `{"search":[{"href":"/ID/Folder/"}, …]}`, folder-ness from the trailing `/`
fn parse_search_array(body: &str, base_url: &str, thumbnail_file: &str) -> Result<Vec<Entry>> {
    let response: SearchArrayResponse = serde_json::from_str(body)
        .map_err(|e| DhakaflixError::ParseError(format!("search response: {}", e)))?;

    let base = base_url.trim_end_matches('/');
    let entries = response
        .search
        .into_iter()
        .filter_map(|hit| {
            let href = hit.href.replace('\\', "/");
            let title = title_from_href(&href);
            if title.is_empty() {
                return None;
            }

            let location = sanitize_url(&if href.starts_with('/') {
                format!("{}{}", base, href)
            } else {
                format!("{}/{}", base, href)
            });

            Some(Entry {
                title,
                preview_image: folder_thumbnail(&location, thumbnail_file),
                location,
                is_folder: None,
            })
        })
        .collect();

    Ok(entries)
}

/// Loose body with repeated `"href":"…"` … `"size":null|N` pairs
///
/// Hrefs may use backslashes or escaped slashes; `size: null` marks a
/// folder, whose location is normalised to end in `/`.
fn parse_sized_pairs(body: &str, base_url: &str, thumbnail_file: &str) -> Result<Vec<Entry>> {
    let host = host_root(base_url)
        .ok_or_else(|| DhakaflixError::InvalidUrl(base_url.to_string()))?;

    let mut entries = Vec::new();
    for caps in SIZED_PAIR.captures_iter(body) {
        let raw = caps[1].replace('\\', "/");
        let href = REPEATED_SLASH.replace_all(raw.trim(), "/").into_owned();
        let is_folder = caps[2].eq_ignore_ascii_case("null");

        let title = title_from_href(&href);
        if title.is_empty() {
            continue;
        }

        let path = if href.starts_with('/') { href } else { format!("/{}", href) };
        let location = sanitize_url(&if is_folder && !path.ends_with('/') {
            format!("{}{}/", host, path)
        } else {
            format!("{}{}", host, path)
        });

        if entries.iter().any(|e: &Entry| e.location == location) {
            continue;
        }

        entries.push(Entry {
            title,
            preview_image: folder_thumbnail(&location, thumbnail_file),
            location,
            is_folder: Some(is_folder),
        });
    }

    Ok(entries)
}
