//! Bounded directory crawl for playable files
//!
//! Starting from a folder, walk its sub-directories concurrently until a
//! directory with playable files turns up. A directory that has files is a
//! leaf: its sub-directories (extras, samples) are not visited. The walk
//! never leaves the starting folder, never fetches a directory twice and
//! stops after `max_depth` levels.

use std::collections::HashSet;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use crate::client::DhakaflixClient;
use crate::config::{CrawlConfig, EpisodeSort};
use crate::error::{DhakaflixError, Result};
use crate::parser::listing::{is_video_file, parse_directory};
use crate::relevance::Relevance;
use crate::types::EpisodeCandidate;
use crate::url::title_from_href;

/// Resolves a folder location into the playable files beneath it
#[derive(Clone)]
pub struct CrawlResolver {
    client: DhakaflixClient,
    config: Arc<CrawlConfig>,
    relevance: Arc<Relevance>,
}

/// State shared by every branch of one crawl
struct Walk {
    client: DhakaflixClient,
    config: Arc<CrawlConfig>,
    relevance: Arc<Relevance>,
    root: Url,
    visited: Mutex<HashSet<String>>,
    fetch_slots: Semaphore,
}

impl CrawlResolver {
    pub fn new(client: DhakaflixClient, config: CrawlConfig, relevance: Arc<Relevance>) -> Self {
        Self {
            client,
            config: Arc::new(config),
            relevance,
        }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawls from `start` and returns the playable files found
    ///
    /// A location that is itself a playable file resolves to that file
    /// without any fetch.
    ///
    /// # Errors
    /// - `InvalidUrl` - `start` is not an absolute URL
    /// - `NoResults` - Nothing playable was found
    pub async fn resolve(&self, start: &str) -> Result<Vec<EpisodeCandidate>> {
        let start_url = Url::parse(start).map_err(|e| {
            DhakaflixError::InvalidUrl(format!("{}: {}", start, e))
        })?;

        if is_video_file(start_url.path(), &self.config.video_extensions) {
            return Ok(vec![EpisodeCandidate {
                display_name: title_from_href(start_url.path()),
                file_location: start_url.to_string(),
            }]);
        }

        self.crawl(start_url, None).await
    }

    /// Crawls from a directory whose page may already be in hand
    ///
    /// `first_page` saves a round trip when the caller fetched the start
    /// page to classify it.
    ///
    /// # Errors
    /// `NoResults` when the walk finds no playable file.
    pub async fn crawl(
        &self,
        start: Url,
        first_page: Option<String>,
    ) -> Result<Vec<EpisodeCandidate>> {
        let root = as_directory(start);
        let walk = Arc::new(Walk {
            client: self.client.clone(),
            config: Arc::clone(&self.config),
            relevance: Arc::clone(&self.relevance),
            root: root.clone(),
            visited: Mutex::new(HashSet::from([root.to_string()])),
            fetch_slots: Semaphore::new(self.config.max_concurrent_fetches),
        });

        let mut files = visit(walk, root.clone(), self.config.max_depth, first_page).await;

        if files.is_empty() {
            info!(root = %root, "crawl found no playable files");
            return Err(DhakaflixError::NoResults(format!(
                "no playable files under {}",
                root
            )));
        }

        sort_candidates(&mut files, self.config.sort);
        info!(root = %root, files = files.len(), "crawl complete");
        Ok(files)
    }
}

/// Visits one directory, descending while no files have been seen
///
/// Failures end the branch with nothing; siblings carry on. Children run as
/// separate tasks so a deep tree does not grow the stack.
fn visit(
    walk: Arc<Walk>,
    dir: Url,
    depth: u32,
    page: Option<String>,
) -> BoxFuture<'static, Vec<EpisodeCandidate>> {
    async move {
        let html = match page {
            Some(html) => html,
            None => match fetch_directory(&walk, &dir).await {
                Some(html) => html,
                None => return Vec::new(),
            },
        };

        let listing = match parse_directory(
            &html,
            &dir,
            &walk.root,
            &walk.config.video_extensions,
            &walk.relevance,
        ) {
            Ok(listing) => listing,
            Err(e) => {
                warn!(dir = %dir, error = %e, "unreadable directory page");
                return Vec::new();
            }
        };

        if !listing.files.is_empty() {
            debug!(dir = %dir, files = listing.files.len(), "found playable files");
            return listing.files;
        }
        if depth == 0 {
            debug!(dir = %dir, "depth limit reached");
            return Vec::new();
        }

        let unvisited: Vec<Url> = {
            let mut visited = walk.visited.lock().await;
            listing
                .subdirs
                .into_iter()
                .filter(|subdir| visited.insert(subdir.to_string()))
                .collect()
        };

        let mut children = JoinSet::new();
        for subdir in unvisited {
            children.spawn(visit(Arc::clone(&walk), subdir, depth - 1, None));
        }

        let mut files = Vec::new();
        while let Some(joined) = children.join_next().await {
            match joined {
                Ok(found) => files.extend(found),
                Err(e) => warn!(dir = %dir, error = %e, "crawl branch did not complete"),
            }
        }
        files
    }
    .boxed()
}

/// Fetches a directory page while holding a fetch slot
///
/// The slot is released before any recursion so nested branches can never
/// wait on their own parents.
async fn fetch_directory(walk: &Walk, dir: &Url) -> Option<String> {
    let Ok(_slot) = walk.fetch_slots.acquire().await else {
        return None;
    };

    match walk.client.fetch(dir.as_str(), walk.config.fetch_timeout).await {
        Ok(html) => Some(html),
        Err(e) => {
            warn!(dir = %dir, error = %e, "directory fetch failed");
            None
        }
    }
}

fn as_directory(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Orders by display name, falling back to location for equal names
fn sort_candidates(files: &mut [EpisodeCandidate], sort: EpisodeSort) {
    files.sort_by(|a, b| {
        let ascending = a
            .display_name
            .cmp(&b.display_name)
            .then_with(|| a.file_location.cmp(&b.file_location));
        match sort {
            EpisodeSort::NameAscending => ascending,
            EpisodeSort::NameDescending => ascending.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, location: &str) -> EpisodeCandidate {
        EpisodeCandidate {
            display_name: name.to_string(),
            file_location: location.to_string(),
        }
    }

    #[test]
    fn test_sort_candidates_descending() {
        let mut files = vec![
            candidate("E01.mkv", "http://h/a/E01.mkv"),
            candidate("E03.mkv", "http://h/b/E03.mkv"),
            candidate("E02.mkv", "http://h/a/E02.mkv"),
        ];
        sort_candidates(&mut files, EpisodeSort::NameDescending);
        let names: Vec<&str> = files.iter().map(|f| f.display_name.as_str()).collect();
        assert_eq!(names, vec!["E03.mkv", "E02.mkv", "E01.mkv"]);
    }

    #[test]
    fn test_sort_candidates_ascending_ties_by_location() {
        let mut files = vec![
            candidate("E01.mkv", "http://h/b/E01.mkv"),
            candidate("E01.mkv", "http://h/a/E01.mkv"),
        ];
        sort_candidates(&mut files, EpisodeSort::NameAscending);
        assert_eq!(files[0].file_location, "http://h/a/E01.mkv");
    }

    #[test]
    fn test_as_directory() {
        let url = as_directory(Url::parse("http://h/TV/Show").unwrap());
        assert_eq!(url.as_str(), "http://h/TV/Show/");
        let url = as_directory(Url::parse("http://h/TV/Show/").unwrap());
        assert_eq!(url.as_str(), "http://h/TV/Show/");
    }

    #[tokio::test]
    async fn test_resolve_file_location_needs_no_fetch() {
        let resolver = CrawlResolver::new(
            DhakaflixClient::new().unwrap(),
            CrawlConfig::default(),
            Arc::new(Relevance::default()),
        );
        let files = resolver
            .resolve("http://127.0.0.1:9/Movies/Heat%20(1995).mkv")
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].display_name, "Heat (1995).mkv");
    }

    #[tokio::test]
    async fn test_resolve_rejects_relative_location() {
        let resolver = CrawlResolver::new(
            DhakaflixClient::new().unwrap(),
            CrawlConfig::default(),
            Arc::new(Relevance::default()),
        );
        let result = resolver.resolve("Movies/Heat/").await;
        assert!(matches!(result, Err(DhakaflixError::InvalidUrl(_))));
    }
}
