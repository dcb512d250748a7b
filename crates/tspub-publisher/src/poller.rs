//! Upload job registration and status polling.
//!
//! The first poll follows registration immediately. Waits between polls grow
//! linearly from `initial` by `step` and are capped at `max_interval`. Each
//! wait is clamped to the time left before the deadline, so a job that never
//! finishes is polled one last time at the deadline and then reported as
//! timed out.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tspub_api_client::PublishingApi;
use tspub_core::models::{FileId, UploadJob, UploadStatus};
use tspub_core::{PublishError, PublishResult, Settings};

/// Consecutive retryable poll failures tolerated before giving up.
pub const MAX_TRANSIENT_POLL_FAILURES: u32 = 3;

/// Linear backoff with an upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub step: Duration,
    pub max_interval: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            step: Duration::from_secs(1),
            max_interval: Duration::from_secs(10),
        }
    }
}

impl BackoffPolicy {
    pub fn with_max_interval(max_interval: Duration) -> Self {
        Self {
            max_interval,
            ..Self::default()
        }
    }

    /// Wait after poll number `attempt` (zero based).
    pub fn interval(&self, attempt: u32) -> Duration {
        self.initial
            .saturating_add(self.step.saturating_mul(attempt))
            .min(self.max_interval)
    }
}

/// Registers uploaded objects for processing and polls them to a terminal status.
#[derive(Clone)]
pub struct UploadStatusPoller {
    api: Arc<dyn PublishingApi>,
    timeout: Duration,
    backoff: BackoffPolicy,
}

impl UploadStatusPoller {
    pub fn new(api: Arc<dyn PublishingApi>, timeout: Duration, backoff: BackoffPolicy) -> Self {
        Self {
            api,
            timeout,
            backoff,
        }
    }

    pub fn from_settings(api: Arc<dyn PublishingApi>, settings: &Settings) -> Self {
        Self::new(
            api,
            settings.upload_timeout(),
            BackoffPolicy::with_max_interval(settings.poll_max_interval()),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Register the object stored at `remote_key` and seed the job with the returned status.
    pub async fn register(&self, source: &Path, remote_key: &str) -> PublishResult<UploadJob> {
        let state = self.api.register_upload(remote_key).await?;
        tracing::info!(
            file = %source.display(),
            job_id = %state.job_id,
            status = %state.status,
            "Upload registered for processing"
        );
        Ok(UploadJob::new(source.to_path_buf(), remote_key.to_string(), state))
    }

    /// Poll `job` until it leaves queued/processing or the upload timeout elapses.
    ///
    /// Returns the remote file id when the job succeeded. A job that is
    /// already terminal is not polled.
    pub async fn wait(&self, job: &mut UploadJob) -> PublishResult<FileId> {
        let start = Instant::now();
        let deadline = start + self.timeout;
        let mut polls: u32 = 0;
        let mut transient_failures: u32 = 0;

        while !job.is_terminal() {
            polls += 1;
            match self.api.upload_status(&job.job_id).await {
                Ok(state) => {
                    transient_failures = 0;
                    tracing::debug!(
                        job_id = %job.job_id,
                        status = %state.status,
                        attempt = polls,
                        "Upload status polled"
                    );
                    job.apply(state);
                }
                Err(e) if e.is_retryable() && transient_failures < MAX_TRANSIENT_POLL_FAILURES => {
                    transient_failures += 1;
                    tracing::warn!(
                        job_id = %job.job_id,
                        error = %e,
                        failures = transient_failures,
                        "Upload status poll failed, will poll again"
                    );
                }
                Err(e) => return Err(e),
            }
            if job.is_terminal() {
                break;
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(
                    file = %job.display_name(),
                    job_id = %job.job_id,
                    status = %job.status,
                    elapsed_secs = start.elapsed().as_secs(),
                    "Upload processing timed out"
                );
                return Err(PublishError::Timeout {
                    file: job.display_name(),
                    elapsed_secs: start.elapsed().as_secs(),
                });
            }

            sleep(self.backoff.interval(polls - 1).min(deadline - now)).await;
        }

        match (job.status, job.file_id()) {
            (UploadStatus::Success, Some(file_id)) => {
                tracing::info!(
                    file = %job.display_name(),
                    job_id = %job.job_id,
                    file_id = file_id,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Upload processed"
                );
                Ok(file_id)
            }
            (UploadStatus::Success, None) => Err(PublishError::ProcessingFailure {
                file: job.display_name(),
                status: job.status.to_string(),
                message: Some("job succeeded without a file id".to_string()),
            }),
            (status, _) => {
                tracing::error!(
                    file = %job.display_name(),
                    job_id = %job.job_id,
                    status = %status,
                    message = job.message.as_deref().unwrap_or(""),
                    "Upload processing failed"
                );
                Err(PublishError::ProcessingFailure {
                    file: job.display_name(),
                    status: status.to_string(),
                    message: job.message.clone(),
                })
            }
        }
    }

    /// Register the uploaded object and wait for its file id.
    pub async fn process(&self, source: &Path, remote_key: &str) -> PublishResult<FileId> {
        let mut job = self.register(source, remote_key).await?;
        self.wait(&mut job).await
    }
}

impl std::fmt::Debug for UploadStatusPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadStatusPoller")
            .field("timeout", &self.timeout)
            .field("backoff", &self.backoff)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_linear_then_capped() {
        let backoff = BackoffPolicy::with_max_interval(Duration::from_secs(3));
        let waits: Vec<u64> = (0..6).map(|a| backoff.interval(a).as_secs()).collect();
        assert_eq!(waits, vec![1, 2, 3, 3, 3, 3]);
    }

    #[test]
    fn test_backoff_default() {
        let backoff = BackoffPolicy::default();
        assert_eq!(backoff.interval(0), Duration::from_secs(1));
        assert_eq!(backoff.interval(4), Duration::from_secs(5));
        assert_eq!(backoff.interval(100), Duration::from_secs(10));
    }
}
