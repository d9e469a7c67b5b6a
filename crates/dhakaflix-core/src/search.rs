//! Fan-out search over every configured mirror
//!
//! One query becomes one task per (server, search path, query variant).
//! Tasks run concurrently under a single overall deadline; whatever has
//! answered by then is merged, deduplicated by location, filtered and
//! ranked. A slow or dead mirror costs at most the deadline and never
//! fails the search on its own.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::adapter::search_server;
use crate::cache::SearchCache;
use crate::client::DhakaflixClient;
use crate::config::{SearchConfig, ServerDescriptor};
use crate::error::{DhakaflixError, Result};
use crate::relevance::Relevance;
use crate::types::Entry;

/// One unit of fan-out work
#[derive(Debug, Clone)]
struct SearchTask {
    server: Arc<ServerDescriptor>,
    path: String,
    pattern: String,
}

/// What came back before the deadline
#[derive(Debug, Default)]
struct FanOut {
    entries: Vec<Entry>,
    answered: usize,
    failed: usize,
    abandoned: usize,
}

/// Concurrent multi-server search with caching
pub struct SearchCoordinator {
    client: DhakaflixClient,
    servers: Vec<Arc<ServerDescriptor>>,
    config: SearchConfig,
    relevance: Arc<Relevance>,
    cache: SearchCache,
}

impl SearchCoordinator {
    pub fn new(
        client: DhakaflixClient,
        servers: Vec<ServerDescriptor>,
        config: SearchConfig,
        relevance: Arc<Relevance>,
    ) -> Self {
        let cache = SearchCache::new(config.cache_ttl);
        Self {
            client,
            servers: servers.into_iter().map(Arc::new).collect(),
            config,
            relevance,
            cache,
        }
    }

    /// Searches every mirror and returns ranked, deduplicated entries
    ///
    /// A fresh cached answer for the same query is returned without any
    /// network traffic. Empty answers are never cached.
    ///
    /// # Errors
    /// - `InvalidQuery` - The query is blank
    /// - `NoResults` - No mirror answered before the deadline
    pub async fn search(&self, query: &str) -> Result<Vec<Entry>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DhakaflixError::InvalidQuery(
                "search query cannot be empty".to_string(),
            ));
        }

        if let Some(hit) = self.cache.get(query).await {
            debug!(query, results = hit.len(), "cache hit");
            return Ok(hit);
        }

        let tasks = self.plan(query);
        let fan_out = self.dispatch(tasks).await;

        if fan_out.answered == 0 {
            warn!(
                query,
                failed = fan_out.failed,
                abandoned = fan_out.abandoned,
                "no server answered"
            );
            return Err(DhakaflixError::NoResults(format!(
                "no server answered for {}",
                query
            )));
        }

        let results = self.merge(fan_out.entries, query);
        info!(
            query,
            results = results.len(),
            answered = fan_out.answered,
            failed = fan_out.failed,
            abandoned = fan_out.abandoned,
            "search complete"
        );

        self.cache.insert(query, results.clone()).await;
        Ok(results)
    }

    /// Expands a query into per-server, per-path, per-variant tasks
    fn plan(&self, query: &str) -> Vec<SearchTask> {
        let variants: Vec<String> = std::iter::once(query.to_string())
            .chain(
                self.config
                    .query_suffixes
                    .iter()
                    .take(self.config.max_query_variants)
                    .map(|suffix| format!("{}{}", query, suffix)),
            )
            .collect();

        let mut tasks = Vec::new();
        for server in &self.servers {
            for path in &server.search_paths {
                for pattern in &variants {
                    tasks.push(SearchTask {
                        server: Arc::clone(server),
                        path: path.clone(),
                        pattern: pattern.clone(),
                    });
                }
            }
        }
        tasks
    }

    /// Runs every task concurrently until all finish or the deadline passes
    ///
    /// Tasks still running at the deadline are aborted and contribute
    /// nothing.
    async fn dispatch(&self, tasks: Vec<SearchTask>) -> FanOut {
        let deadline = Instant::now() + self.config.overall_deadline;
        let mut set = JoinSet::new();

        for task in tasks {
            let client = self.client.clone();
            set.spawn(async move {
                let result = search_server(&client, &task.server, &task.path, &task.pattern).await;
                (task, result)
            });
        }

        let mut fan_out = FanOut::default();
        loop {
            match timeout_at(deadline, set.join_next()).await {
                Ok(Some(Ok((_, Ok(entries))))) => {
                    fan_out.answered += 1;
                    fan_out.entries.extend(entries);
                }
                Ok(Some(Ok((task, Err(e))))) => {
                    fan_out.failed += 1;
                    warn!(server = %task.server.name, path = %task.path, error = %e, "server search failed");
                }
                Ok(Some(Err(e))) => {
                    fan_out.failed += 1;
                    warn!(error = %e, "search task did not complete");
                }
                Ok(None) => break,
                Err(_) => {
                    fan_out.abandoned = set.len();
                    warn!(abandoned = fan_out.abandoned, "search deadline reached, returning partial results");
                    set.abort_all();
                    break;
                }
            }
        }

        fan_out
    }

    /// Deduplicates, collapses and ranks everything that came back
    ///
    /// Entries are put in location order before deduplication so the
    /// surviving copy does not depend on which server answered first.
    fn merge(&self, mut entries: Vec<Entry>, query: &str) -> Vec<Entry> {
        entries.sort_by(|a, b| {
            a.location
                .cmp(&b.location)
                .then_with(|| a.title.cmp(&b.title))
        });
        entries.dedup_by(|later, first| later.location == first.location);

        let accepted: Vec<Entry> = entries
            .into_iter()
            .filter(|e| self.relevance.accepts(e, query))
            .collect();

        let accepted = if self.config.collapse_nested {
            collapse_nested(accepted)
        } else {
            accepted
        };

        self.relevance.order(accepted, query)
    }
}

/// Drops files that live inside a container in the same set
///
/// When a search matches both a folder and the files in it, only the folder
/// is kept. Containers always survive, nested or not.
pub fn collapse_nested(entries: Vec<Entry>) -> Vec<Entry> {
    let containers: HashSet<String> = entries
        .iter()
        .filter(|e| e.is_container())
        .map(|e| container_prefix(&e.location))
        .collect();

    entries
        .into_iter()
        .filter(|entry| {
            entry.is_container()
                || !containers
                    .iter()
                    .any(|folder| entry.location.starts_with(folder.as_str()))
        })
        .collect()
}

fn container_prefix(location: &str) -> String {
    if location.ends_with('/') {
        location.to_string()
    } else {
        format!("{}/", location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, location: &str) -> Entry {
        Entry {
            title: title.to_string(),
            location: location.to_string(),
            is_folder: None,
            preview_image: None,
        }
    }

    #[test]
    fn test_collapse_nested_keeps_outer_folder() {
        let entries = vec![
            entry("Dark", "http://h/TV/Dark/"),
            entry("Dark S01E01.mkv", "http://h/TV/Dark/Season 1/Dark S01E01.mkv"),
            entry("Season 1", "http://h/TV/Dark/Season 1/"),
            entry("Dark Matter", "http://h/TV/Dark Matter/"),
        ];
        let titles: Vec<String> = collapse_nested(entries)
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Dark", "Season 1", "Dark Matter"]);
    }

    #[test]
    fn test_collapse_nested_keeps_nested_folders() {
        let entries = vec![
            entry("Naruto", "http://h/Anime/Naruto/"),
            entry("Naruto Shippuden", "http://h/Anime/Naruto/Naruto Shippuden/"),
            entry("Naruto E01.mkv", "http://h/Anime/Naruto/Naruto E01.mkv"),
        ];
        let titles: Vec<String> = collapse_nested(entries)
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Naruto", "Naruto Shippuden"]);
    }

    #[test]
    fn test_collapse_nested_respects_explicit_folder_flag() {
        let mut folder = entry("Heat (1995)", "http://h/Movies/Heat (1995)");
        folder.is_folder = Some(true);
        let file = entry("Heat.mkv", "http://h/Movies/Heat (1995)/Heat.mkv");
        let kept = collapse_nested(vec![folder, file]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Heat (1995)");
    }

    #[test]
    fn test_collapse_nested_leaves_siblings() {
        let entries = vec![
            entry("A", "http://h/x/A/"),
            entry("AB", "http://h/x/AB/"),
            entry("A.mkv", "http://h/x/A.mkv"),
        ];
        assert_eq!(collapse_nested(entries).len(), 3);
    }
}
