//! Per-job status polling for in-flight export jobs.
//!
//! [`ExportPoller`] keeps one independent polling task per tracked
//! job: an immediate first poll, a fixed interval while polls
//! succeed, per-job exponential backoff on transient errors with a
//! hard cap on consecutive failures, suspension while the page is not
//! visible, and guaranteed task teardown on removal or shutdown.
//! Status changes are published on a broadcast channel.

pub mod config;
pub mod events;
pub mod fetcher;
pub mod poller;
pub mod visibility;

pub use config::PollerConfig;
pub use events::{PollerEvent, StopReason};
pub use fetcher::StatusFetcher;
pub use poller::{ExportPoller, JobRef};
pub use visibility::VisibilityHandle;
