//! Core data types for the DhakaFlix source
//!
//! Contains the records passed between the adapter, the coordinator,
//! the crawl resolver and the host boundary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A folder or file discovered on a mirror
///
/// All fields implement Serialize and Deserialize for Tauri compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Display name, the last path segment percent-decoded
    pub title: String,

    /// Absolute address on the mirror (host plus path)
    pub location: String,

    /// Folder flag as reported by the server, `None` when the wire format
    /// does not carry one
    pub is_folder: Option<bool>,

    /// Folder art published by the mirror, if any
    pub preview_image: Option<String>,
}

impl Entry {
    /// Whether the entry is a container
    ///
    /// Uses the explicit flag when the server sent one and falls back to the
    /// trailing separator in `location`.
    pub fn is_container(&self) -> bool {
        self.is_folder.unwrap_or_else(|| self.location.ends_with('/'))
    }
}

/// A playable file found while crawling a directory tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeCandidate {
    pub display_name: String,
    pub file_location: String,
}

/// An episode as handed back to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Episode title
    pub name: String,

    /// Address of the video file or its download page
    pub url: String,

    /// Parsed episode number; crawled files get one parsed from their name
    pub episode_number: Option<f32>,

    /// Quality and size badge text (e.g., "1080p 1.2 GB")
    pub quality: Option<String>,
}

impl From<EpisodeCandidate> for Episode {
    fn from(candidate: EpisodeCandidate) -> Self {
        Self {
            name: candidate.display_name,
            url: candidate.file_location,
            episode_number: None,
            quality: None,
        }
    }
}

/// A stream the host can hand to its player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoLink {
    pub url: String,
    pub label: String,
    /// Extra request headers the player must send (e.g., `Referer`)
    pub headers: HashMap<String, String>,
}
