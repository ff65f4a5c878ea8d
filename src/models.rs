// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of one remote generation job.
/// Transitions only move forward: pending → processing → completed | failed.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One generation attempt, from submission to terminal state.
///
/// Invariant: `video_url` is non-empty iff the job completed and
/// `error_message` is non-empty iff it failed; neither is set while the
/// job is still in flight.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobResult {
    /// Task identifier issued by the remote service, or a locally
    /// generated `failed-<uuid>` placeholder for synthetic failures.
    pub task_id: String,
    pub prompt: String,
    pub status: JobStatus,
    pub video_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobResult {
    /// Freshly submitted job, stamped with the submission time.
    pub fn pending(task_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        JobResult {
            task_id: task_id.into(),
            prompt: prompt.into(),
            status: JobStatus::Pending,
            video_url: None,
            error_message: None,
            created_at: Some(Utc::now()),
            completed_at: None,
        }
    }

    /// Synthetic failure produced locally when a job lifecycle errors out.
    pub fn failed(
        task_id: impl Into<String>,
        prompt: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        JobResult {
            task_id: task_id.into(),
            prompt: prompt.into(),
            status: JobStatus::Failed,
            video_url: None,
            error_message: Some(message.into()),
            created_at: Some(Utc::now()),
            completed_at: None,
        }
    }

    /// Fold a polling snapshot into this record.
    ///
    /// Status moves forward only: a terminal record never changes, and a
    /// non-terminal snapshot on an already-polled job advances pending to
    /// processing rather than regressing it. The submission timestamp is
    /// always kept; the snapshot contributes the terminal fields.
    pub fn merge_poll(&mut self, snapshot: &JobResult) {
        if self.status.is_terminal() {
            return;
        }

        if snapshot.status.is_terminal() {
            self.status = snapshot.status;
            self.video_url = snapshot.video_url.clone();
            self.error_message = snapshot.error_message.clone();
            self.completed_at = snapshot.completed_at;
        } else {
            // A non-terminal poll confirms the remote side is working on
            // the job; pending advances to processing, never backward.
            self.status = JobStatus::Processing;
        }

        if self.prompt.is_empty() && !snapshot.prompt.is_empty() {
            self.prompt = snapshot.prompt.clone();
        }
    }
}

/// Summary derived from a batch of job results.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BatchStatistics {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub pending: usize,
    pub success_rate: f64,
    pub average_completion_secs: f64,
}

/// Aggregate counters and timings over a result set.
pub fn compute_statistics(results: &[JobResult]) -> BatchStatistics {
    let total = results.len();
    let completed = results
        .iter()
        .filter(|r| r.status == JobStatus::Completed)
        .count();
    let failed = results
        .iter()
        .filter(|r| r.status == JobStatus::Failed)
        .count();
    let pending = total - completed - failed;

    let completion_secs: Vec<f64> = results
        .iter()
        .filter(|r| r.status == JobStatus::Completed)
        .filter_map(|r| match (r.created_at, r.completed_at) {
            (Some(start), Some(end)) => {
                Some((end - start).num_milliseconds() as f64 / 1000.0)
            }
            _ => None,
        })
        .collect();

    let average_completion_secs = if completion_secs.is_empty() {
        0.0
    } else {
        completion_secs.iter().sum::<f64>() / completion_secs.len() as f64
    };

    let success_rate = if total > 0 {
        completed as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    BatchStatistics {
        total,
        completed,
        failed,
        pending,
        success_rate,
        average_completion_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn completed_job(secs: i64) -> JobResult {
        let start = Utc::now();
        JobResult {
            task_id: "t".to_string(),
            prompt: "p".to_string(),
            status: JobStatus::Completed,
            video_url: Some("https://example.com/v.mp4".to_string()),
            error_message: None,
            created_at: Some(start),
            completed_at: Some(start + TimeDelta::seconds(secs)),
        }
    }

    #[test]
    fn test_counters_partition_the_result_set() {
        let results = vec![
            completed_job(10),
            JobResult::failed("failed-x", "p", "boom"),
            JobResult::pending("a", "p"),
        ];
        let stats = compute_statistics(&results);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed + stats.failed + stats.pending, stats.total);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.pending, 1);
    }

    #[test]
    fn test_success_rate_bounds() {
        let stats = compute_statistics(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.average_completion_secs, 0.0);

        let stats = compute_statistics(&[completed_job(4), completed_job(8)]);
        assert_eq!(stats.success_rate, 100.0);
        assert!((stats.average_completion_secs - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_processing_counts_as_pending() {
        let mut job = JobResult::pending("a", "p");
        job.status = JobStatus::Processing;
        let stats = compute_statistics(&[job]);
        assert_eq!(stats.pending, 1);
    }

    #[test]
    fn test_merge_poll_moves_forward_only() {
        let mut job = JobResult::pending("a", "make a video");
        let created = job.created_at;

        // First non-terminal poll: pending advances to processing.
        let snapshot = JobResult {
            task_id: "a".to_string(),
            prompt: String::new(),
            status: JobStatus::Pending,
            video_url: None,
            error_message: None,
            created_at: None,
            completed_at: None,
        };
        job.merge_poll(&snapshot);
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.created_at, created);
        assert_eq!(job.prompt, "make a video");

        // Terminal poll: completed fields come from the snapshot.
        let done = completed_job(3);
        job.merge_poll(&done);
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.video_url.is_some());
        assert!(job.error_message.is_none());
        assert_eq!(job.created_at, created);
        assert!(job.completed_at.is_some());

        // Terminal records never change.
        let failed = JobResult::failed("a", "p", "late failure");
        job.merge_poll(&failed);
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.error_message.is_none());
    }

    #[test]
    fn test_terminal_invariant() {
        let done = completed_job(1);
        assert!(done.video_url.is_some());
        assert!(done.error_message.is_none());

        let failed = JobResult::failed("failed-y", "p", "bad prompt");
        assert!(failed.video_url.is_none());
        assert_eq!(failed.error_message.as_deref(), Some("bad prompt"));
    }
}
