use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::record::HadithResult;

struct CacheEntry {
    data: Arc<Vec<HadithResult>>,
    fetched_at: Instant,
}

/// Parsed editions keyed by slug, each valid for a fixed TTL.
pub struct EditionCache {
    editions: DashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl EditionCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            editions: DashMap::new(),
            ttl,
            max_entries,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, slug: &str) -> Option<Arc<Vec<HadithResult>>> {
        self.get_at(slug, Instant::now())
    }

    pub fn get_at(&self, slug: &str, now: Instant) -> Option<Arc<Vec<HadithResult>>> {
        let fresh = self
            .editions
            .get(slug)
            .filter(|entry| now.saturating_duration_since(entry.fetched_at) <= self.ttl)
            .map(|entry| entry.data.clone());

        match fresh {
            Some(data) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(data)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, slug: &str, data: Arc<Vec<HadithResult>>) {
        self.insert_at(slug, data, Instant::now());
    }

    pub fn insert_at(&self, slug: &str, data: Arc<Vec<HadithResult>>, now: Instant) {
        if self.editions.len() >= self.max_entries && !self.editions.contains_key(slug) {
            // Make room: expired entries first, then the oldest one
            self.prune_expired_at(now);
            if self.editions.len() >= self.max_entries {
                let oldest = self
                    .editions
                    .iter()
                    .min_by_key(|r| r.value().fetched_at)
                    .map(|r| r.key().clone());
                if let Some(key) = oldest {
                    self.editions.remove(&key);
                }
            }
        }
        self.editions.insert(
            slug.to_string(),
            CacheEntry {
                data,
                fetched_at: now,
            },
        );
    }

    /// Drop entries older than the TTL. Returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        self.prune_expired_at(Instant::now())
    }

    pub fn prune_expired_at(&self, now: Instant) -> usize {
        let before = self.editions.len();
        self.editions
            .retain(|_, entry| now.saturating_duration_since(entry.fetched_at) <= self.ttl);
        before.saturating_sub(self.editions.len())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            editions_cached: self.editions.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub editions_cached: usize,
    pub hits: usize,
    pub misses: usize,
}
