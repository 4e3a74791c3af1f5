//! Fixed-window counters keyed by client IP or chat session.

use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    started: Instant,
}

impl WindowEntry {
    fn new(now: Instant) -> Self {
        Self { count: 0, started: now }
    }

    fn expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.started) > window
    }
}

/// Allows `limit` calls per key within each window. The window starts at the
/// first call and resets once it has fully elapsed.
pub struct RateLimiter {
    entries: DashMap<String, WindowEntry>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            limit,
            window,
        }
    }

    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| WindowEntry::new(now));

        if entry.expired(now, self.window) {
            *entry = WindowEntry::new(now);
        }

        if entry.count >= self.limit {
            return false;
        }
        entry.count += 1;
        true
    }

    pub fn prune_expired_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.expired(now, self.window));
        before.saturating_sub(self.entries.len())
    }

    pub fn tracked(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffTopicStrike {
    pub count: u32,
    pub remaining: u32,
    pub should_close: bool,
}

/// Counts off-topic chat messages per session. Each strike refreshes the
/// timeout; a session left alone longer than the timeout starts over.
pub struct OffTopicTracker {
    entries: DashMap<String, WindowEntry>,
    threshold: u32,
    timeout: Duration,
}

impl OffTopicTracker {
    pub fn new(threshold: u32, timeout: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            threshold,
            timeout,
        }
    }

    pub fn is_closed(&self, session: &str) -> bool {
        self.is_closed_at(session, Instant::now())
    }

    pub fn is_closed_at(&self, session: &str, now: Instant) -> bool {
        self.entries
            .get(session)
            .is_some_and(|entry| !entry.expired(now, self.timeout) && entry.count >= self.threshold)
    }

    pub fn record(&self, session: &str) -> OffTopicStrike {
        self.record_at(session, Instant::now())
    }

    pub fn record_at(&self, session: &str, now: Instant) -> OffTopicStrike {
        let mut entry = self
            .entries
            .entry(session.to_string())
            .or_insert_with(|| WindowEntry::new(now));

        if entry.expired(now, self.timeout) {
            *entry = WindowEntry::new(now);
        }
        entry.count += 1;
        entry.started = now;

        OffTopicStrike {
            count: entry.count,
            remaining: self.threshold.saturating_sub(entry.count),
            should_close: entry.count >= self.threshold,
        }
    }

    pub fn prune_expired_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.expired(now, self.timeout));
        before.saturating_sub(self.entries.len())
    }
}
