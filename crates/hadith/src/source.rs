use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::record::Edition;

pub const DEFAULT_EDITIONS_URL: &str = "https://cdn.jsdelivr.net/gh/fawazahmed0/hadith-api@1/editions";

/// Anything that can hand out a full edition document by slug.
#[async_trait]
pub trait HadithSource: Send + Sync {
    async fn fetch_edition(&self, slug: &str) -> Result<Edition, SourceError>;
}

/// Client for the public fawazahmed0 hadith editions API.
#[derive(Clone)]
pub struct EditionsClient {
    base_url: String,
    client: reqwest::Client,
}

impl EditionsClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("BayyinahHub/1.0")
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn edition_url(&self, slug: &str) -> String {
        format!("{}/{}.json", self.base_url, slug)
    }
}

#[async_trait]
impl HadithSource for EditionsClient {
    async fn fetch_edition(&self, slug: &str) -> Result<Edition, SourceError> {
        let url = self.edition_url(slug);
        debug!(%url, "Fetching edition");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(slug, status = %response.status(), "Hadith API returned an error status");
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice::<Edition>(&body).map_err(|e| SourceError::Format(e.to_string()))
    }
}
