use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ai: AiConfig,
    pub rate_limits: RateLimitConfig,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Public origin of the front end; CORS is restricted to it when set
    pub public_api_base: Option<String>,
    pub json_logs: bool,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub chat_per_window: u32,
    pub explain_per_window: u32,
    pub window_secs: u64,
    pub off_topic_threshold: u32,
    pub off_topic_timeout_secs: u64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub editions_url: String,
    pub request_timeout_secs: u64,
    #[serde(skip_serializing)]
    pub sunnah_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_entries: usize,
    pub prune_interval_secs: u64,
}

impl fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("editions_url", &self.editions_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("sunnah_api_key", &self.sunnah_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 3000,
                public_api_base: None,
                json_logs: false,
            },
            ai: AiConfig {
                api_key: None,
                base_url: assistant::llm::DEFAULT_BASE_URL.to_string(),
                model: assistant::llm::DEFAULT_MODEL.to_string(),
                request_timeout_secs: 30,
            },
            rate_limits: RateLimitConfig {
                chat_per_window: 50,
                explain_per_window: 20,
                window_secs: 24 * 60 * 60,
                off_topic_threshold: 3,
                off_topic_timeout_secs: 30 * 60,
            },
            upstream: UpstreamConfig {
                editions_url: hadith::source::DEFAULT_EDITIONS_URL.to_string(),
                request_timeout_secs: 30,
                sunnah_api_key: None,
            },
            cache: CacheConfig {
                ttl_secs: 60 * 60,
                max_entries: 64,
                prune_interval_secs: 10 * 60,
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from a variable lookup, falling back to defaults for unset values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            server: ServerConfig {
                port: parse_or(&get, "PORT", defaults.server.port)?,
                public_api_base: get("NEXT_PUBLIC_API_BASE"),
                json_logs: get("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            },
            ai: AiConfig {
                api_key: get("OPENAI_API_KEY"),
                base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.ai.base_url),
                model: get("OPENAI_MODEL").unwrap_or(defaults.ai.model),
                request_timeout_secs: defaults.ai.request_timeout_secs,
            },
            rate_limits: RateLimitConfig {
                chat_per_window: parse_or(&get, "CHAT_RATE_LIMIT", defaults.rate_limits.chat_per_window)?,
                explain_per_window: parse_or(
                    &get,
                    "EXPLAIN_RATE_LIMIT",
                    defaults.rate_limits.explain_per_window,
                )?,
                ..defaults.rate_limits
            },
            upstream: UpstreamConfig {
                editions_url: get("HADITH_API_BASE").unwrap_or(defaults.upstream.editions_url),
                request_timeout_secs: defaults.upstream.request_timeout_secs,
                sunnah_api_key: get("SUNNAH_API_KEY"),
            },
            cache: CacheConfig {
                ttl_secs: parse_or(&get, "CACHE_TTL_SECS", defaults.cache.ttl_secs)?,
                ..defaults.cache
            },
        })
    }

    /// Problems worth a warning at startup. None of them prevent serving search.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        match self.ai.api_key.as_deref() {
            None => warnings.push(
                "Missing OPENAI_API_KEY: /api/explain and /api/chat will answer 500".to_string(),
            ),
            Some(key) if key.len() < 10 || key.contains(' ') => {
                warnings.push("OPENAI_API_KEY has invalid format".to_string())
            }
            Some(_) => {}
        }

        if self.upstream.sunnah_api_key.is_some() {
            warnings.push(
                "SUNNAH_API_KEY is set but the legacy sunnah.com source is not supported; ignoring it"
                    .to_string(),
            );
        }

        warnings
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai.request_timeout_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.request_timeout_secs)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Invalid {key} value: {raw:?}")),
        None => Ok(default),
    }
}
