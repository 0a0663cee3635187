//! Events published by the poller.

use serde::Serialize;

use stayport_core::ExportJobStatus;

/// A poller-level event, delivered via `tokio::sync::broadcast`.
#[derive(Debug, Clone, Serialize)]
pub enum PollerEvent {
    /// A poll succeeded and returned the job's current status.
    ///
    /// Emitted once per successful poll, including the poll that
    /// observes a terminal state.
    StatusUpdated {
        job_id: String,
        status: ExportJobStatus,
    },

    /// The poller will issue no further polls for this job.
    PollingStopped { job_id: String, reason: StopReason },
}

/// Why a job's polling loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The job reached `completed`.
    Completed,
    /// The job reached `failed`.
    Failed,
    /// The backend answered 404: the job expired or never existed.
    NotFound,
    /// Too many consecutive poll errors; the job is left in its last
    /// known state.
    ErrorBudgetExhausted,
    /// The job was removed from the tracked list.
    Removed,
}
