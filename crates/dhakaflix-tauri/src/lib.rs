//! DhakaFlix Tauri Integration
//!
//! Provides a Tauri plugin that exposes the DhakaFlix mirror search to the
//! frontend.
//!
//! # Usage
//!
//! Register the plugin in your Tauri application:
//!
//! ```ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(dhakaflix_tauri::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! Then invoke commands from the frontend:
//!
//! ```javascript
//! import { invoke } from '@tauri-apps/api/core';
//!
//! const entries = await invoke('plugin:dhakaflix|search', { query: 'interstellar' });
//! const episodes = await invoke('plugin:dhakaflix|list_episodes', {
//!   location: entries[0].location
//! });
//! const links = await invoke('plugin:dhakaflix|playable_links', { url: episodes[0].url });
//! ```

use std::sync::Arc;

use dhakaflix_core::{DhakaflixSource, SourceConfig};
use tauri::{
    Manager, Runtime,
    plugin::{Builder, TauriPlugin},
};

mod commands;

pub use commands::ServerInfo;

/// Source shared by every command
///
/// The source is internally synchronised, so commands share it through an
/// `Arc` and run concurrently; the search cache is shared with them.
pub struct SourceState {
    pub(crate) source: Arc<DhakaflixSource>,
}

impl SourceState {
    /// Create state for the stock mirror set
    ///
    /// # Errors
    /// Returns error string if the source cannot be built
    pub fn new() -> Result<Self, String> {
        Self::with_config(SourceConfig::dhakaflix())
    }

    /// Create state from a custom configuration
    ///
    /// # Errors
    /// Returns error string if the configuration is invalid
    pub fn with_config(config: SourceConfig) -> Result<Self, String> {
        let source = DhakaflixSource::with_config(config).map_err(|e| e.to_string())?;
        Ok(Self {
            source: Arc::new(source),
        })
    }
}

/// Initialize the dhakaflix plugin with the stock mirror set
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    init_with_config(SourceConfig::dhakaflix())
}

/// Initialize the dhakaflix plugin with a custom mirror set
///
/// # Example
/// ```ignore
/// let mut config = dhakaflix_core::SourceConfig::dhakaflix();
/// config.search.overall_deadline = std::time::Duration::from_secs(10);
/// tauri::Builder::default()
///     .plugin(dhakaflix_tauri::init_with_config(config))
///     .run(tauri::generate_context!())
///     .expect("error while running tauri application");
/// ```
pub fn init_with_config<R: Runtime>(config: SourceConfig) -> TauriPlugin<R> {
    Builder::new("dhakaflix")
        .invoke_handler(tauri::generate_handler![
            commands::search,
            commands::list_popular,
            commands::list_episodes,
            commands::playable_links,
            commands::servers
        ])
        .setup(move |app, _api| {
            let state = SourceState::with_config(config.clone())
                .map_err(Box::<dyn std::error::Error>::from)?;
            app.manage(state);
            Ok(())
        })
        .build()
}

// Re-export types for convenience
pub use dhakaflix_core::{Entry, Episode, VideoLink};
