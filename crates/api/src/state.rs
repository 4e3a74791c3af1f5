use anyhow::{Context, Result};
use assistant::{Assistant, ChatModel, OpenAiClient};
use hadith::{EditionCache, EditionsClient, HadithSource, SearchEngine};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::limiter::{OffTopicTracker, RateLimiter};
use crate::metrics::Metrics;

/// Everything the handlers share. Owned by the server, one per process.
pub struct AppState {
    pub config: AppConfig,
    pub search: SearchEngine,
    pub assistant: Assistant,
    pub explain_limiter: RateLimiter,
    pub chat_limiter: RateLimiter,
    pub off_topic: OffTopicTracker,
    pub metrics: Arc<Metrics>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PruneReport {
    pub rate_limit_entries: usize,
    pub off_topic_entries: usize,
    pub cached_editions: usize,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        source: Arc<dyn HadithSource>,
        model: Arc<dyn ChatModel>,
    ) -> Arc<Self> {
        let cache = EditionCache::new(
            Duration::from_secs(config.cache.ttl_secs),
            config.cache.max_entries,
        );
        let window = Duration::from_secs(config.rate_limits.window_secs);

        Arc::new(Self {
            search: SearchEngine::new(source, cache),
            assistant: Assistant::new(model),
            explain_limiter: RateLimiter::new(config.rate_limits.explain_per_window, window),
            chat_limiter: RateLimiter::new(config.rate_limits.chat_per_window, window),
            off_topic: OffTopicTracker::new(
                config.rate_limits.off_topic_threshold,
                Duration::from_secs(config.rate_limits.off_topic_timeout_secs),
            ),
            metrics: Metrics::new(),
            config,
        })
    }

    /// Wire up the real editions API and completion endpoint.
    pub fn from_config(config: AppConfig) -> Result<Arc<Self>> {
        let source = EditionsClient::new(config.upstream.editions_url.clone(), config.upstream_timeout())
            .context("Failed to build hadith API client")?;
        let model = OpenAiClient::new(
            config.ai.base_url.clone(),
            config.ai.api_key.clone(),
            config.ai.model.clone(),
            config.ai_timeout(),
        )
        .context("Failed to build completion client")?;

        Ok(Self::new(config, Arc::new(source), Arc::new(model)))
    }

    /// Drop expired counters and cache entries.
    pub fn prune_expired(&self) -> PruneReport {
        let now = Instant::now();
        PruneReport {
            rate_limit_entries: self.explain_limiter.prune_expired_at(now)
                + self.chat_limiter.prune_expired_at(now),
            off_topic_entries: self.off_topic.prune_expired_at(now),
            cached_editions: self.search.cache().prune_expired_at(now),
        }
    }
}
