//! REST client for the export backend.
//!
//! [`ExportApi`] wraps the authenticated export endpoints (job
//! creation, status, listing, deletion, download) over [`reqwest`].
//! Authentication is supplied through the [`Session`] seam so the
//! client never reaches into process-global state.

pub mod api;
pub mod download;
pub mod session;

pub use api::{ClearedJobs, CreatedJob, ExportApi, JobList, ListJobsQuery};
pub use download::{DownloadError, DownloadedExport};
pub use session::{Session, StaticSession};
