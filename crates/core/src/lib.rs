//! Shared domain types for the Stayport export subsystem.
//!
//! This crate holds everything the export client and the job poller
//! agree on:
//!
//! - [`types`] — job status wire shapes and the client-side
//!   [`ExportJob`](types::ExportJob) record.
//! - [`filters`] — hotel and mapping export filter payloads, including
//!   the pre-transmission sanitization rules.
//! - [`error`] — the status-code-driven [`ExportError`](error::ExportError)
//!   taxonomy used at the client boundary.

pub mod error;
pub mod filters;
pub mod types;

pub use error::ExportError;
pub use filters::{
    ExportFormat, FieldSelection, FilterCriteria, HotelExportFilters, MappingExportFilters,
};
pub use types::{ExportFilters, ExportJob, ExportJobStatus, ExportStatus, ExportType};
