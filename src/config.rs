// src/config.rs
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VideoError};

/// Aspect ratios the veo3 endpoint accepts.
pub const ACCEPTED_ASPECT_RATIOS: &[&str] = &["16:9", "9:16"];

/// Duration hint bounds in seconds. The API may silently ignore the hint.
pub const MIN_DURATION_SECS: u32 = 1;
pub const MAX_DURATION_SECS: u32 = 8;

/// High-level application configuration loaded from environment variables.
/// The engine treats every field as an externally-injected constant.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub api_base: String,
    pub video_endpoint: String,
    pub status_endpoint: String,
    pub model: String,
    pub max_concurrent_requests: usize,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub polling_interval: Duration,
    pub max_polling_time: Duration,
}

impl AppConfig {
    /// Load configuration from environment variables.
    /// `API_KEY` is required; everything else falls back to defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("API_KEY").map_err(|_| {
            VideoError::Config("No API key configured. Please set API_KEY.".to_string())
        })?;

        let api_base = std::env::var("API_BASE_URL")
            .unwrap_or_else(|_| "https://api.kie.ai".to_string());
        let video_endpoint = std::env::var("API_VIDEO_ENDPOINT")
            .unwrap_or_else(|_| "/api/v1/veo/generate".to_string());
        let status_endpoint = std::env::var("API_STATUS_ENDPOINT")
            .unwrap_or_else(|_| "/api/v1/veo/record-info".to_string());
        let model =
            std::env::var("VIDEO_MODEL").unwrap_or_else(|_| "veo3_fast".to_string());

        Ok(AppConfig {
            api_key,
            api_base,
            video_endpoint,
            status_endpoint,
            model,
            max_concurrent_requests: env_number("MAX_CONCURRENT_REQUESTS", 20)?,
            max_retries: env_number("MAX_RETRIES", 3)?,
            retry_delay: Duration::from_secs(env_number("RETRY_DELAY", 2)?),
            polling_interval: Duration::from_secs(env_number("POLLING_INTERVAL", 5)?),
            max_polling_time: Duration::from_secs(env_number("MAX_POLLING_TIME", 600)?),
        })
    }
}

fn env_number<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| VideoError::Config(format!("{} is not a valid number: {}", key, raw))),
        Err(_) => Ok(default),
    }
}

/// Per-request generation parameters supplied by the caller.
///
/// `duration` is a pass-through hint: the veo3 endpoint is known to ignore
/// it for some models, so it is validated but never serialized into the
/// request body.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GenerationSettings {
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,

    /// Requested clip length in seconds (hint only).
    #[serde(default = "default_duration")]
    pub duration: u32,

    /// Completion webhook forwarded verbatim to the API when set.
    #[serde(default)]
    pub callback_url: Option<String>,
}

fn default_aspect_ratio() -> String {
    "16:9".to_string()
}

fn default_duration() -> u32 {
    8
}

impl Default for GenerationSettings {
    fn default() -> Self {
        GenerationSettings {
            aspect_ratio: default_aspect_ratio(),
            duration: default_duration(),
            callback_url: None,
        }
    }
}

impl GenerationSettings {
    /// Check the settings against the values the remote API accepts.
    pub fn validate(&self) -> Result<()> {
        if !ACCEPTED_ASPECT_RATIOS.contains(&self.aspect_ratio.as_str()) {
            return Err(VideoError::Config(format!(
                "Unsupported aspect ratio '{}'. Accepted: {}",
                self.aspect_ratio,
                ACCEPTED_ASPECT_RATIOS.join(", ")
            )));
        }
        if self.duration < MIN_DURATION_SECS || self.duration > MAX_DURATION_SECS {
            return Err(VideoError::Config(format!(
                "Duration {}s out of range {}..={}s",
                self.duration, MIN_DURATION_SECS, MAX_DURATION_SECS
            )));
        }
        Ok(())
    }
}
