use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request to hadith API failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("hadith API returned status {0}")]
    Status(u16),

    #[error("unexpected hadith API response format: {0}")]
    Format(String),
}

impl SourceError {
    /// Upstream HTTP status when the failure was an error response.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            SourceError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("collection {slug} is unavailable: {source}")]
    CollectionUnavailable {
        slug: String,
        #[source]
        source: SourceError,
    },
}

impl SearchError {
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            SearchError::CollectionUnavailable { source, .. } => source.upstream_status(),
        }
    }
}
