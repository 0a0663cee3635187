//! Tunable polling parameters and the backoff schedule.

use std::time::Duration;

/// Tunable parameters for the per-job polling loops.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Interval between successful polls of one job.
    pub base_interval: Duration,
    /// Consecutive failures after which a job's loop stops for good.
    pub max_consecutive_errors: u32,
    /// Backoff grows as `base_interval × multiplier^errors`.
    pub backoff_multiplier: f64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(5),
            max_consecutive_errors: 3,
            backoff_multiplier: 2.0,
        }
    }
}

/// Delay before the next poll after `consecutive_errors` failures.
///
/// Zero errors yields the base interval; each error doubles it (with
/// the default multiplier). The error counter is per job, so one
/// flaky job's backoff never slows its neighbours down.
pub fn backoff_delay(config: &PollerConfig, consecutive_errors: u32) -> Duration {
    config
        .base_interval
        .mul_f64(config.backoff_multiplier.powi(consecutive_errors as i32))
}
