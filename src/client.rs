// src/client.rs

use log::warn;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::config::{AppConfig, GenerationSettings};
use crate::errors::{Result, VideoError};

/// A client for the veo3 generation API. One instance (and its underlying
/// connection pool) is shared by every concurrent job lifecycle.
pub struct VideoClient {
    client: Client,
    config: AppConfig,
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    prompt: &'a str,
    #[serde(rename = "aspectRatio")]
    aspect_ratio: &'a str,
    model: &'a str,
    #[serde(rename = "callBackUrl", skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
}

/// Outer response shape: `{code, msg, data}`.
#[derive(Deserialize)]
struct ApiEnvelope<T> {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<T>,
}

#[derive(Deserialize, Default)]
struct SubmitData {
    #[serde(rename = "taskId", default)]
    task_id: Option<String>,
}

/// Decoded status payload for one task.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct StatusData {
    /// 0 = still generating, 1 = success, anything else = failure.
    #[serde(rename = "successFlag", default)]
    pub success_flag: i64,

    /// JSON-encoded copy of the original request parameters.
    #[serde(rename = "paramJson", default)]
    pub param_json: Option<String>,

    #[serde(default)]
    pub response: Option<StatusPayload>,

    #[serde(rename = "errorMessage", default)]
    pub error_message: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct StatusPayload {
    #[serde(rename = "resultUrls", default)]
    pub result_urls: Vec<String>,
}

impl VideoClient {
    /// Creates a new `VideoClient`. Failure here is a setup-level error
    /// and propagates to the caller.
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| VideoError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Submits one prompt and returns the task id issued by the service.
    ///
    /// Rate-limit and network failures are retried up to `max_retries`
    /// attempts with linear backoff (`retry_delay * attempt`); auth and
    /// response-shape errors abort immediately.
    pub async fn submit(&self, prompt: &str, settings: &GenerationSettings) -> Result<String> {
        let url = format!(
            "{}{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.video_endpoint
        );
        let body = SubmitRequest {
            prompt,
            aspect_ratio: &settings.aspect_ratio,
            model: &self.config.model,
            callback_url: settings.callback_url.as_deref(),
        };

        let mut attempt = 1;
        loop {
            match self.try_submit(&url, &body).await {
                Ok(task_id) => return Ok(task_id),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_delay * attempt;
                    warn!(
                        "Submit attempt {}/{} failed ({}), retrying in {:?}",
                        attempt, self.config.max_retries, err, delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_submit(&self, url: &str, body: &SubmitRequest<'_>) -> Result<String> {
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(VideoError::Network)?;

        let envelope: ApiEnvelope<SubmitData> = Self::decode(resp).await?;
        envelope
            .data
            .and_then(|d| d.task_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                VideoError::MalformedResponse("Response carries no taskId".to_string())
            })
    }

    /// Fetches the current status envelope for a task. Not retried here:
    /// the polling loop above already repeats.
    pub async fn poll(&self, task_id: &str) -> Result<StatusData> {
        let url = format!(
            "{}{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.status_endpoint
        );

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .query(&[("taskId", task_id)])
            .send()
            .await
            .map_err(VideoError::Network)?;

        let envelope: ApiEnvelope<StatusData> = Self::decode(resp).await?;
        envelope.data.ok_or_else(|| {
            VideoError::MalformedResponse("Status response carries no data".to_string())
        })
    }

    /// Shared HTTP status triage and strict envelope decoding.
    async fn decode<T: serde::de::DeserializeOwned + Default>(
        resp: reqwest::Response,
    ) -> Result<ApiEnvelope<T>> {
        let status = resp.status();
        match status {
            StatusCode::OK => {
                let text = resp.text().await.map_err(VideoError::Network)?;
                let envelope: ApiEnvelope<T> = serde_json::from_str(&text).map_err(|e| {
                    VideoError::MalformedResponse(format!("Invalid response body: {}", e))
                })?;
                if envelope.code != 200 {
                    return Err(VideoError::ApiResponse(
                        envelope.msg.unwrap_or_else(|| "Unknown error".to_string()),
                    ));
                }
                Ok(envelope)
            }
            StatusCode::UNAUTHORIZED => Err(VideoError::Auth),
            StatusCode::TOO_MANY_REQUESTS => Err(VideoError::RateLimit),
            _ => {
                let body = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "Could not read error body".to_string());
                Err(VideoError::ApiError {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
