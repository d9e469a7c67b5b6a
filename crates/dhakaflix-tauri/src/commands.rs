//! Tauri commands for the DhakaFlix source
//!
//! This module contains all Tauri command implementations. Errors cross
//! the boundary as their display strings.

use dhakaflix_core::{Entry, Episode, ServerDescriptor, VideoLink};
use serde::Serialize;
use tauri::State;
use tracing::debug;

use crate::SourceState;

/// A configured mirror as the frontend sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub name: String,
    pub server_id: String,
    pub base_url: String,
}

impl From<&ServerDescriptor> for ServerInfo {
    fn from(server: &ServerDescriptor) -> Self {
        Self {
            name: server.name.clone(),
            server_id: server.server_id.clone(),
            base_url: server.base_url.clone(),
        }
    }
}

/// Search every mirror
///
/// A blank query returns the popular listing instead.
///
/// # Errors
/// Returns error message as String if no mirror answered
#[tauri::command]
pub async fn search(state: State<'_, SourceState>, query: String) -> Result<Vec<Entry>, String> {
    debug!(query = %query, "search command");
    state.source.search(&query).await.map_err(|e| e.to_string())
}

/// Popular listing from every mirror
#[tauri::command]
pub async fn list_popular(state: State<'_, SourceState>) -> Result<Vec<Entry>, String> {
    state.source.list_popular().await.map_err(|e| e.to_string())
}

/// Playable episodes behind an entry location
///
/// # Errors
/// Returns error message as String if nothing playable was found in time
#[tauri::command]
pub async fn list_episodes(
    state: State<'_, SourceState>,
    location: String,
) -> Result<Vec<Episode>, String> {
    debug!(location = %location, "list_episodes command");
    state
        .source
        .list_episodes(&location)
        .await
        .map_err(|e| e.to_string())
}

/// Stream description for an episode URL
#[tauri::command]
pub async fn playable_links(
    state: State<'_, SourceState>,
    url: String,
) -> Result<Vec<VideoLink>, String> {
    state.source.playable_links(&url).map_err(|e| e.to_string())
}

/// Configured mirrors
#[tauri::command]
pub fn servers(state: State<'_, SourceState>) -> Vec<ServerInfo> {
    state.source.servers().iter().map(ServerInfo::from).collect()
}
