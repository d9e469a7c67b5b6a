//! Short-lived search result cache
//!
//! Process-scoped map from query to its last completed result set. Entries
//! are never evicted; a stale entry is simply ignored and overwritten by the
//! next completed search for the same query.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::types::Entry;

#[derive(Debug, Clone)]
struct CacheEntry {
    results: Vec<Entry>,
    stored_at: Instant,
}

/// Query cache with a fixed time-to-live
///
/// Safe to share between concurrent searches; on a race the last writer
/// wins.
#[derive(Debug)]
pub struct SearchCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl SearchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Results for `query` if they were stored less than one TTL ago
    pub async fn get(&self, query: &str) -> Option<Vec<Entry>> {
        let entries = self.entries.read().await;
        entries
            .get(query)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.results.clone())
    }

    /// Stores a completed result set; empty sets are not cached
    pub async fn insert(&self, query: &str, results: Vec<Entry>) {
        if results.is_empty() {
            return;
        }
        self.entries.write().await.insert(
            query.to_string(),
            CacheEntry {
                results,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of stored queries, fresh or stale
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
