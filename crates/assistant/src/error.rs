use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("no API key configured for the completion endpoint")]
    MissingApiKey,

    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("completion endpoint returned status {0}")]
    Status(u16),

    #[error("invalid completion response: {0}")]
    InvalidResponse(String),
}

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}
