//! Export job types.
//!
//! [`ExportJobStatus`] is the wire shape returned by the backend's
//! `GET /export/status/{job_id}` endpoint. [`ExportJob`] is the
//! client-side record kept for each submitted export, updated from
//! successive status responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filters::{HotelExportFilters, MappingExportFilters};

/// Which dataset an export job covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    /// Hotel master data (optionally with locations, contacts, mappings).
    Hotel,
    /// Supplier-to-property mapping data.
    Mapping,
}

impl ExportType {
    /// Wire representation, as used in query parameters.
    pub fn as_str(self) -> &'static str {
        match self {
            ExportType::Hotel => "hotel",
            ExportType::Mapping => "mapping",
        }
    }
}

/// Lifecycle state of an export job.
///
/// Transitions are `queued -> processing -> {completed, failed}`.
/// [`Completed`](ExportStatus::Completed) and
/// [`Failed`](ExportStatus::Failed) are terminal: once a job reaches
/// either, its status never changes again and no further polling is
/// warranted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl ExportStatus {
    /// Whether this status is terminal (`completed` or `failed`).
    pub fn is_terminal(self) -> bool {
        matches!(self, ExportStatus::Completed | ExportStatus::Failed)
    }

    /// Wire representation, as used in query parameters.
    pub fn as_str(self) -> &'static str {
        match self {
            ExportStatus::Queued => "queued",
            ExportStatus::Processing => "processing",
            ExportStatus::Completed => "completed",
            ExportStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status response for a single export job.
///
/// Job identifiers are opaque strings of the form `exp_<token>`; they
/// are never parsed, only compared and echoed back to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJobStatus {
    pub job_id: String,
    pub status: ExportStatus,
    /// Completion percentage (0-100).
    #[serde(default)]
    pub progress_percentage: u8,
    #[serde(default)]
    pub processed_records: u64,
    #[serde(default)]
    pub total_records: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Set once the job leaves `queued`.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// Set only in a terminal state.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Present only when `status` is `failed`.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Present only when `status` is `completed`.
    #[serde(default)]
    pub download_url: Option<String>,
    /// When the finished export artifact will be purged.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// The filter payload a job was submitted with.
///
/// Retained on [`ExportJob`] for retry and debugging; never mutated
/// after submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFilters {
    Hotel(HotelExportFilters),
    Mapping(MappingExportFilters),
}

impl ExportFilters {
    pub fn export_type(&self) -> ExportType {
        match self {
            ExportFilters::Hotel(_) => ExportType::Hotel,
            ExportFilters::Mapping(_) => ExportType::Mapping,
        }
    }
}

/// Client-side record of a submitted export job.
///
/// Created immediately after a successful submission and thereafter
/// updated via [`apply_status`](ExportJob::apply_status) as status
/// responses arrive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    pub job_id: String,
    pub export_type: ExportType,
    pub status: ExportStatus,
    /// Completion percentage (0-100).
    pub progress: u8,
    pub processed_records: u64,
    pub total_records: u64,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub download_url: Option<String>,
    /// The originating filters, kept verbatim.
    pub filters: ExportFilters,
}

impl ExportJob {
    /// Create a record for a freshly submitted job.
    pub fn new(job_id: impl Into<String>, filters: ExportFilters) -> Self {
        Self {
            job_id: job_id.into(),
            export_type: filters.export_type(),
            status: ExportStatus::Queued,
            progress: 0,
            processed_records: 0,
            total_records: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            expires_at: None,
            error_message: None,
            download_url: None,
            filters,
        }
    }

    /// Merge a status response into this record.
    ///
    /// Ignores responses for a different `job_id` and refuses to move a
    /// job out of a terminal state.
    pub fn apply_status(&mut self, status: &ExportJobStatus) {
        if status.job_id != self.job_id || self.status.is_terminal() {
            return;
        }
        self.status = status.status;
        self.progress = status.progress_percentage.min(100);
        self.processed_records = status.processed_records;
        self.total_records = status.total_records;
        if self.started_at.is_none() {
            self.started_at = status.started_at;
        }
        self.completed_at = status.completed_at;
        self.expires_at = status.expires_at;
        self.error_message = status.error_message.clone();
        self.download_url = status.download_url.clone();
    }
}
