//! Page-visibility signal.
//!
//! Polling is pure overhead while nobody is looking at the page, so
//! the host environment reports visibility through a
//! [`VisibilityHandle`] and the poller defers every due poll while
//! hidden. Restoring visibility releases all waiting loops, which
//! poll immediately rather than catching up on missed intervals.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Host-side handle for reporting page visibility.
///
/// Cheap to clone; all clones feed the same signal.
#[derive(Debug, Clone)]
pub struct VisibilityHandle {
    tx: watch::Sender<bool>,
}

impl VisibilityHandle {
    /// Create a handle with the given initial visibility.
    pub fn new(visible: bool) -> Self {
        let (tx, _rx) = watch::channel(visible);
        Self { tx }
    }

    /// Report a visibility change. Idempotent.
    pub fn set_visible(&self, visible: bool) {
        self.tx.send_replace(visible);
    }

    /// Current visibility.
    pub fn is_visible(&self) -> bool {
        *self.tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for VisibilityHandle {
    /// Visible; hosts without a visibility concept never need to
    /// touch the handle.
    fn default() -> Self {
        Self::new(true)
    }
}

/// Block until the page is visible or the token is cancelled.
///
/// Returns `false` on cancellation. A closed channel (host dropped
/// the handle) counts as permanently visible.
pub(crate) async fn wait_until_visible(
    rx: &mut watch::Receiver<bool>,
    cancel: &CancellationToken,
) -> bool {
    loop {
        if *rx.borrow_and_update() {
            return true;
        }
        tokio::select! {
            _ = cancel.cancelled() => return false,
            changed = rx.changed() => {
                if changed.is_err() {
                    return true;
                }
            }
        }
    }
}
