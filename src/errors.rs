// src/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Invalid API key")]
    Auth,

    #[error("API rate limit exceeded")]
    RateLimit,

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Unexpected response structure: {0}")]
    MalformedResponse(String),

    #[error("API request failed with status {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("API returned an error: {0}")]
    ApiResponse(String),

    #[error("Polling timed out after {0} seconds")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl VideoError {
    /// Only rate-limit and network failures are worth another attempt;
    /// everything else aborts the submit immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VideoError::RateLimit | VideoError::Network(_))
    }
}

pub type Result<T> = std::result::Result<T, VideoError>;
