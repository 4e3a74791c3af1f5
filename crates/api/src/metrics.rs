use hadith::CacheStats;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,
    rate_limited_requests: AtomicUsize,
    off_topic_rejections: AtomicUsize,
    closed_chats: AtomicUsize,

    // Per-endpoint counts
    search_requests: AtomicUsize,
    explain_requests: AtomicUsize,
    chat_requests: AtomicUsize,

    // Timing (in microseconds)
    total_search_time_us: AtomicU64,
    total_explain_time_us: AtomicU64,
    total_chat_time_us: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            rate_limited_requests: AtomicUsize::new(0),
            off_topic_rejections: AtomicUsize::new(0),
            closed_chats: AtomicUsize::new(0),
            search_requests: AtomicUsize::new(0),
            explain_requests: AtomicUsize::new(0),
            chat_requests: AtomicUsize::new(0),
            total_search_time_us: AtomicU64::new(0),
            total_explain_time_us: AtomicU64::new(0),
            total_chat_time_us: AtomicU64::new(0),
        })
    }

    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_off_topic(&self, closed: bool) {
        self.off_topic_rejections.fetch_add(1, Ordering::Relaxed);
        if closed {
            self.closed_chats.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_search(&self, duration: Duration) {
        self.search_requests.fetch_add(1, Ordering::Relaxed);
        self.total_search_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_explain(&self, duration: Duration) {
        self.explain_requests.fetch_add(1, Ordering::Relaxed);
        self.total_explain_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_chat(&self, duration: Duration) {
        self.chat_requests.fetch_add(1, Ordering::Relaxed);
        self.total_chat_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self, cache: CacheStats) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            rate_limited_requests: self.rate_limited_requests.load(Ordering::Relaxed),
            off_topic_rejections: self.off_topic_rejections.load(Ordering::Relaxed),
            closed_chats: self.closed_chats.load(Ordering::Relaxed),
            search_requests: self.search_requests.load(Ordering::Relaxed),
            explain_requests: self.explain_requests.load(Ordering::Relaxed),
            chat_requests: self.chat_requests.load(Ordering::Relaxed),
            avg_search_time_ms: avg_time_ms(&self.total_search_time_us, &self.search_requests),
            avg_explain_time_ms: avg_time_ms(&self.total_explain_time_us, &self.explain_requests),
            avg_chat_time_ms: avg_time_ms(&self.total_chat_time_us, &self.chat_requests),
            cache,
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    let cnt = count.load(Ordering::Relaxed) as f64;
    if cnt > 0.0 {
        total / cnt / 1000.0 // Convert to ms
    } else {
        0.0
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub rate_limited_requests: usize,
    pub off_topic_rejections: usize,
    pub closed_chats: usize,
    pub search_requests: usize,
    pub explain_requests: usize,
    pub chat_requests: usize,
    pub avg_search_time_ms: f64,
    pub avg_explain_time_ms: f64,
    pub avg_chat_time_ms: f64,
    pub cache: CacheStats,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_cache() -> CacheStats {
        CacheStats {
            editions_cached: 0,
            hits: 0,
            misses: 0,
        }
    }

    #[test]
    fn test_counts_and_averages() {
        let metrics = Metrics::new();
        metrics.record_request(true);
        metrics.record_request(false);
        metrics.record_search(Duration::from_millis(10));
        metrics.record_search(Duration::from_millis(30));
        metrics.record_off_topic(false);
        metrics.record_off_topic(true);

        let snapshot = metrics.snapshot(empty_cache());
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.failed_requests, 1);
        assert_eq!(snapshot.search_requests, 2);
        assert!((snapshot.avg_search_time_ms - 20.0).abs() < 1e-9);
        assert_eq!(snapshot.avg_chat_time_ms, 0.0);
        assert_eq!(snapshot.off_topic_rejections, 2);
        assert_eq!(snapshot.closed_chats, 1);
    }
}
