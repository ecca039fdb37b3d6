//! Time-bounded cache of built street graphs, keyed by area.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::StreetGraph;

struct CachedGraph {
    graph: Arc<StreetGraph>,
    fetched_at: Instant,
}

/// Street graphs keyed by [`BoundingBox::key`](crime_route_geography_models::BoundingBox::key).
///
/// Entries expire after `ttl`. When full, the oldest entry is evicted.
/// A `max_entries` of zero disables caching.
pub struct GraphCache {
    ttl: Duration,
    max_entries: usize,
    entries: Mutex<BTreeMap<String, CachedGraph>>,
}

impl GraphCache {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the cached graph for `key` unless it has expired.
    pub fn get(&self, key: &str) -> Option<Arc<StreetGraph>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.get(key)?.fetched_at.elapsed() >= self.ttl {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| Arc::clone(&entry.graph))
    }

    /// Stores a graph, evicting expired entries and then the oldest entry
    /// if the cache is full.
    pub fn insert(&self, key: String, graph: Arc<StreetGraph>) {
        if self.max_entries == 0 {
            return;
        }

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);

        while entries.len() >= self.max_entries {
            let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.fetched_at)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            log::debug!("Evicting cached street graph {oldest}");
            entries.remove(&oldest);
        }

        entries.insert(
            key,
            CachedGraph {
                graph,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Number of live and not yet purged entries.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::grid_network;

    fn graph() -> Arc<StreetGraph> {
        Arc::new(StreetGraph::from_network(&grid_network(2), true))
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = GraphCache::new(Duration::from_secs(60), 4);
        cache.insert("a".to_string(), graph());
        assert!(cache.get("a").is_some());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn evicts_oldest_when_full() {
        let cache = GraphCache::new(Duration::from_secs(3600), 2);
        cache.insert("a".to_string(), graph());
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.insert("b".to_string(), graph());
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.insert("c".to_string(), graph());

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let cache = GraphCache::new(Duration::from_secs(3600), 0);
        cache.insert("a".to_string(), graph());
        assert!(cache.get("a").is_none());
    }
}
