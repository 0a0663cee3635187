//! Per-job polling loops and their lifecycle.
//!
//! [`ExportPoller`] owns one tokio task per tracked in-flight job,
//! each guarded by a child [`CancellationToken`] of a master token.
//! The caller periodically hands the poller its current list of jobs
//! via [`sync_jobs`](ExportPoller::sync_jobs); the poller reconciles
//! that against the running tasks.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, RwLock};
use tokio_util::sync::CancellationToken;

use stayport_core::{ExportError, ExportJob, ExportStatus};

use crate::config::{backoff_delay, PollerConfig};
use crate::events::{PollerEvent, StopReason};
use crate::fetcher::StatusFetcher;
use crate::visibility::{wait_until_visible, VisibilityHandle};

/// Broadcast channel capacity for poller events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How long teardown waits for each task to exit.
const TASK_EXIT_TIMEOUT: Duration = Duration::from_secs(5);

/// The slice of an export job the poller needs: identifier plus the
/// status the caller last saw.
#[derive(Debug, Clone)]
pub struct JobRef {
    pub job_id: String,
    pub status: ExportStatus,
}

impl JobRef {
    pub fn new(job_id: impl Into<String>, status: ExportStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
        }
    }
}

impl From<&ExportJob> for JobRef {
    fn from(job: &ExportJob) -> Self {
        Self::new(job.job_id.clone(), job.status)
    }
}

/// Maintains one polling loop per tracked in-flight export job.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct ExportPoller {
    inner: Arc<PollerInner>,
}

struct PollerInner {
    fetcher: Arc<dyn StatusFetcher>,
    config: PollerConfig,
    /// Live polling tasks indexed by `job_id`. At most one per job.
    jobs: RwLock<HashMap<String, TrackedJob>>,
    /// Jobs whose loops ended for good (terminal, 404, error budget).
    /// Never polled again, even if they reappear in the input list.
    retired: RwLock<HashSet<String>>,
    event_tx: broadcast::Sender<PollerEvent>,
    visibility: watch::Receiver<bool>,
    /// Master cancellation token -- cancelled during shutdown.
    cancel: CancellationToken,
}

/// Bookkeeping for a single job's polling task.
struct TrackedJob {
    task_handle: tokio::task::JoinHandle<()>,
    /// Per-job cancellation token (child of the master token).
    cancel: CancellationToken,
}

impl ExportPoller {
    /// Create a poller that considers the page always visible.
    pub fn new(fetcher: Arc<dyn StatusFetcher>, config: PollerConfig) -> Self {
        Self::with_visibility(fetcher, config, &VisibilityHandle::default())
    }

    /// Create a poller gated on a host-supplied visibility signal.
    pub fn with_visibility(
        fetcher: Arc<dyn StatusFetcher>,
        config: PollerConfig,
        visibility: &VisibilityHandle,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(PollerInner {
                fetcher,
                config,
                jobs: RwLock::new(HashMap::new()),
                retired: RwLock::new(HashSet::new()),
                event_tx,
                visibility: visibility.subscribe(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Subscribe to poller events.
    pub fn subscribe(&self) -> broadcast::Receiver<PollerEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Job ids with a live polling task.
    pub async fn tracked_job_ids(&self) -> Vec<String> {
        self.inner.jobs.read().await.keys().cloned().collect()
    }

    /// Reconcile the tracked set against the caller's current job list.
    ///
    /// Starts a loop for every `queued`/`processing` job not already
    /// tracked (or retired), and cancels the loop of every job that
    /// disappeared from the list. Jobs that are already terminal in
    /// the input are never polled.
    pub async fn sync_jobs(&self, jobs: &[JobRef]) {
        let wanted: HashSet<&str> = jobs.iter().map(|j| j.job_id.as_str()).collect();

        let mut tracked = self.inner.jobs.write().await;

        let gone: Vec<String> = tracked
            .keys()
            .filter(|id| !wanted.contains(id.as_str()))
            .cloned()
            .collect();
        for job_id in gone {
            if let Some(job) = tracked.remove(&job_id) {
                tracing::debug!(%job_id, "Job removed from tracked list, cancelling its loop");
                job.cancel.cancel();
                let _ = self.inner.event_tx.send(PollerEvent::PollingStopped {
                    job_id,
                    reason: StopReason::Removed,
                });
            }
        }

        let retired = self.inner.retired.read().await;
        for job in jobs {
            if job.status.is_terminal()
                || retired.contains(&job.job_id)
                || tracked.contains_key(&job.job_id)
            {
                continue;
            }
            let task = self.spawn_job(job.job_id.clone());
            tracked.insert(job.job_id.clone(), task);
        }
    }

    /// Stop polling one job immediately.
    ///
    /// Idempotent: stopping an unknown or already-stopped job is a
    /// no-op. No status request issued after this call references the
    /// job, and a poll already in flight has its result discarded.
    pub async fn stop_job(&self, job_id: &str) {
        let removed = self.inner.jobs.write().await.remove(job_id);
        let Some(job) = removed else {
            return;
        };
        job.cancel.cancel();
        let _ = self.inner.event_tx.send(PollerEvent::PollingStopped {
            job_id: job_id.to_string(),
            reason: StopReason::Removed,
        });
        let _ = tokio::time::timeout(TASK_EXIT_TIMEOUT, job.task_handle).await;
    }

    /// Tear down every polling loop.
    ///
    /// After this resolves, no task is live and no timer will fire.
    pub async fn shutdown(&self) {
        tracing::debug!("Shutting down export poller");
        self.inner.cancel.cancel();

        // Drain under the lock, await outside it: a task that is busy
        // retiring itself needs the same lock to finish.
        let drained: Vec<(String, TrackedJob)> =
            self.inner.jobs.write().await.drain().collect();
        for (job_id, job) in drained {
            job.cancel.cancel();
            if tokio::time::timeout(TASK_EXIT_TIMEOUT, job.task_handle)
                .await
                .is_err()
            {
                tracing::warn!(%job_id, "Polling task did not exit within timeout");
            }
        }
    }

    /// Spawn the polling task for one job.
    fn spawn_job(&self, job_id: String) -> TrackedJob {
        let cancel = self.inner.cancel.child_token();
        let inner = Arc::clone(&self.inner);
        let task_cancel = cancel.clone();

        tracing::debug!(%job_id, "Starting polling loop");
        let task_handle = tokio::spawn(async move {
            poll_job(inner, job_id, task_cancel).await;
        });

        TrackedJob {
            task_handle,
            cancel,
        }
    }
}

/// One job's polling loop: immediate first poll, then fixed-interval
/// polling with per-job exponential backoff on errors.
///
/// Exits when the job reaches a terminal state, the backend says the
/// job is gone, the consecutive-error budget runs out, or the token
/// is cancelled. Every exit path other than cancellation retires the
/// job so it is never polled again.
async fn poll_job(inner: Arc<PollerInner>, job_id: String, cancel: CancellationToken) {
    let mut visibility = inner.visibility.clone();
    let mut consecutive_errors = 0u32;

    loop {
        // Due polls are deferred while the page is hidden and fire
        // immediately once visibility is restored.
        if !wait_until_visible(&mut visibility, &cancel).await {
            return;
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => return,
            result = inner.fetcher.fetch_status(&job_id) => result,
        };
        // The job may have been removed while the poll was in flight;
        // a late response must not be acted upon.
        if cancel.is_cancelled() {
            return;
        }

        let delay = match result {
            Ok(status) => {
                consecutive_errors = 0;
                let terminal = status.status.is_terminal();
                let reason = match status.status {
                    ExportStatus::Completed => Some(StopReason::Completed),
                    ExportStatus::Failed => Some(StopReason::Failed),
                    _ => None,
                };
                tracing::debug!(
                    %job_id,
                    status = %status.status,
                    progress = status.progress_percentage,
                    "Export job status",
                );
                let _ = inner.event_tx.send(PollerEvent::StatusUpdated {
                    job_id: job_id.clone(),
                    status,
                });
                if terminal {
                    retire(&inner, &job_id, reason.unwrap_or(StopReason::Completed)).await;
                    return;
                }
                inner.config.base_interval
            }
            Err(ExportError::NotFound) => {
                tracing::warn!(%job_id, "Export job not found or expired, polling stopped");
                retire(&inner, &job_id, StopReason::NotFound).await;
                return;
            }
            Err(error) => {
                consecutive_errors += 1;
                if consecutive_errors >= inner.config.max_consecutive_errors {
                    tracing::warn!(
                        %job_id,
                        errors = consecutive_errors,
                        error = %error,
                        "Consecutive poll failures exhausted the error budget, polling stopped",
                    );
                    retire(&inner, &job_id, StopReason::ErrorBudgetExhausted).await;
                    return;
                }
                let delay = backoff_delay(&inner.config, consecutive_errors);
                tracing::debug!(
                    %job_id,
                    errors = consecutive_errors,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Poll failed, backing off",
                );
                delay
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Mark a job's polling as permanently finished and announce it.
async fn retire(inner: &PollerInner, job_id: &str, reason: StopReason) {
    inner.retired.write().await.insert(job_id.to_string());
    inner.jobs.write().await.remove(job_id);
    let _ = inner.event_tx.send(PollerEvent::PollingStopped {
        job_id: job_id.to_string(),
        reason,
    });
}
