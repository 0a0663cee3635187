//! Status-fetch seam between the poller and the REST client.
//!
//! The poller only needs one operation from the outside world, so it
//! is expressed as a trait: production wires in [`ExportApi`], tests
//! wire in a scripted fake with no HTTP involved.

use async_trait::async_trait;

use stayport_core::{ExportError, ExportJobStatus};
use stayport_export::ExportApi;

/// Source of job status responses.
#[async_trait]
pub trait StatusFetcher: Send + Sync + 'static {
    /// Fetch the current status of one job.
    ///
    /// An [`ExportError::NotFound`] return is a permanent signal (the
    /// job expired or never existed), not a transient failure.
    async fn fetch_status(&self, job_id: &str) -> Result<ExportJobStatus, ExportError>;
}

#[async_trait]
impl StatusFetcher for ExportApi {
    async fn fetch_status(&self, job_id: &str) -> Result<ExportJobStatus, ExportError> {
        self.get_status(job_id).await
    }
}
