//! Search RPC against a single mirror
//!
//! Every mirror accepts the same request; only the response shape differs,
//! and that is handled by [`parse_search_response`].

use serde_json::{Value, json};
use tracing::debug;

use crate::client::DhakaflixClient;
use crate::config::ServerDescriptor;
use crate::error::Result;
use crate::parser::parse_search_response;
use crate::types::Entry;
use crate::url::search_endpoint;

/// Request body for a case-insensitive search under `path`
pub fn search_payload(path: &str, pattern: &str) -> Value {
    json!({
        "action": "get",
        "search": {
            "href": path,
            "pattern": pattern,
            "ignorecase": true,
        }
    })
}

/// Runs one search against one mirror path
///
/// Bounded by the server's own timeout. Entries come back unfiltered.
///
/// # Errors
/// Any transport, status or parse failure. Callers fanning out over many
/// servers treat an error as an empty answer.
pub async fn search_server(
    client: &DhakaflixClient,
    server: &ServerDescriptor,
    path: &str,
    pattern: &str,
) -> Result<Vec<Entry>> {
    let endpoint = search_endpoint(&server.base_url, &server.server_id);
    let body = client
        .post_json(&endpoint, &search_payload(path, pattern), server.timeout)
        .await?;
    let entries = parse_search_response(&body, server)?;

    debug!(server = %server.name, path, pattern, hits = entries.len(), "server answered");
    Ok(entries)
}
