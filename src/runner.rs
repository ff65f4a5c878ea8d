// src/runner.rs
use std::sync::Arc;

use chrono::Utc;
use futures::future;
use log::{error, info};
use tokio::sync::Semaphore;
use tokio::time::{Instant, sleep};
use uuid::Uuid;

use crate::client::{StatusData, VideoClient};
use crate::config::GenerationSettings;
use crate::errors::{Result, VideoError};
use crate::models::{JobResult, JobStatus};

/// Invoked with the latest snapshot every time a job is submitted or polled.
pub type ProgressCallback = Arc<dyn Fn(&JobResult) + Send + Sync>;

/// Map a raw status payload onto a job snapshot.
///
/// The remote side reports a single success flag: 0 means still
/// generating (it does not distinguish pending from processing), 1 means
/// success, anything else means failure. A flag of 1 without any result
/// URL is an inconsistent response; the snapshot stays non-terminal so
/// the caller polls again.
fn snapshot_from(task_id: &str, data: StatusData) -> JobResult {
    let prompt = data
        .param_json
        .as_deref()
        .and_then(|raw| serde_json::from_str::<serde_json::Value>(raw).ok())
        .and_then(|v| v.get("prompt").and_then(|p| p.as_str()).map(str::to_string))
        .unwrap_or_default();

    let mut result = JobResult {
        task_id: task_id.to_string(),
        prompt,
        status: JobStatus::Pending,
        video_url: None,
        error_message: None,
        created_at: None,
        completed_at: None,
    };

    match data.success_flag {
        0 => {}
        1 => {
            let urls = data.response.map(|r| r.result_urls).unwrap_or_default();
            if let Some(url) = urls.into_iter().find(|u| !u.is_empty()) {
                result.status = JobStatus::Completed;
                result.video_url = Some(url);
                result.completed_at = Some(Utc::now());
            }
        }
        _ => {
            result.status = JobStatus::Failed;
            result.error_message = Some(
                data.error_message
                    .unwrap_or_else(|| "Unknown error".to_string()),
            );
        }
    }

    result
}

/// Submit one prompt and return the freshly created pending job.
pub async fn generate_video(
    client: &VideoClient,
    prompt: &str,
    settings: &GenerationSettings,
) -> Result<JobResult> {
    settings.validate()?;
    let task_id = client.submit(prompt, settings).await?;
    info!("Submitted task {}", task_id);
    Ok(JobResult::pending(task_id, prompt))
}

/// Fetch one status snapshot for a task.
pub async fn check_status(client: &VideoClient, task_id: &str) -> Result<JobResult> {
    let data = client.poll(task_id).await?;
    Ok(snapshot_from(task_id, data))
}

/// Poll a task until it reaches a terminal state.
///
/// Sleeps `polling_interval` between polls; that sleep and the HTTP calls
/// are the only suspension points. Exceeding `max_polling_time` (measured
/// from loop entry) yields `VideoError::Timeout` and abandons the job
/// locally; the remote side keeps running it.
pub async fn wait_for_completion(
    client: &VideoClient,
    task_id: &str,
    on_progress: Option<ProgressCallback>,
) -> Result<JobResult> {
    let budget = client.config().max_polling_time;
    let start = Instant::now();

    loop {
        if start.elapsed() > budget {
            return Err(VideoError::Timeout(budget.as_secs()));
        }

        let snapshot = check_status(client, task_id).await?;

        if let Some(cb) = &on_progress {
            cb(&snapshot);
        }

        if snapshot.status.is_terminal() {
            return Ok(snapshot);
        }

        sleep(client.config().polling_interval).await;
    }
}

/// Full lifecycle for one prompt: submit, then poll to a terminal state.
/// The terminal snapshot is merged onto the submitted record so the
/// submission timestamp survives into the final result.
async fn run_job(
    client: &VideoClient,
    prompt: &str,
    settings: &GenerationSettings,
    on_progress: Option<ProgressCallback>,
) -> Result<JobResult> {
    let mut job = generate_video(client, prompt, settings).await?;
    if let Some(cb) = &on_progress {
        cb(&job);
    }

    let terminal = wait_for_completion(client, &job.task_id, on_progress).await?;
    job.merge_poll(&terminal);
    Ok(job)
}

/// Run one lifecycle per prompt under the configured concurrency cap and
/// return exactly one result per input, index-stable.
///
/// Jobs are independent: an error in one lifecycle is converted into a
/// synthetic failed result with a locally generated placeholder id and
/// never cancels or blocks the others. This function itself does not fail;
/// setup errors belong to `VideoClient::new`.
pub async fn batch_generate(
    client: &VideoClient,
    prompts: &[String],
    settings: &GenerationSettings,
    on_progress: Option<ProgressCallback>,
) -> Vec<JobResult> {
    let semaphore = Arc::new(Semaphore::new(client.config().max_concurrent_requests));
    let total = prompts.len();

    let futures: Vec<_> = prompts
        .iter()
        .enumerate()
        .map(|(index, prompt)| {
            let semaphore = Arc::clone(&semaphore);
            let on_progress = on_progress.clone();
            async move {
                // Permit is held for the whole submit/poll lifetime and
                // released on every exit path.
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return JobResult::failed(
                            format!("failed-{}", Uuid::new_v4()),
                            prompt.clone(),
                            "Concurrency limiter closed",
                        );
                    }
                };

                match run_job(client, prompt, settings, on_progress).await {
                    Ok(result) => {
                        info!("Job {}/{} finished: {}", index + 1, total, result.status);
                        result
                    }
                    Err(err) => {
                        error!("Job {}/{} failed: {}", index + 1, total, err);
                        JobResult::failed(
                            format!("failed-{}", Uuid::new_v4()),
                            prompt.clone(),
                            err.to_string(),
                        )
                    }
                }
            }
        })
        .collect();

    future::join_all(futures).await
}
