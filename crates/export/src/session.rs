//! Authentication seam for the export client.
//!
//! The embedding application owns credential storage (and whatever
//! "send the user back to the login page" means in its context); the
//! export client only needs to read tokens and to signal that the
//! session became invalid.

use std::sync::{PoisonError, RwLock};

/// Credential source injected into [`ExportApi`](crate::ExportApi).
///
/// [`invalidate`](Session::invalidate) is called exactly when the
/// backend answers 401: the session cannot be silently retried, so the
/// implementation should clear stored credentials and trigger
/// re-authentication.
pub trait Session: Send + Sync {
    /// Current bearer token, if a session exists.
    fn bearer_token(&self) -> Option<String>;

    /// Secondary API key sent as `X-API-Key` on download requests.
    ///
    /// Distinguishes privileged from metered-access accounts; absence
    /// is not an error.
    fn api_key(&self) -> Option<String> {
        None
    }

    /// The backend rejected the session; discard local credentials.
    fn invalidate(&self);
}

/// In-memory [`Session`] backed by an `RwLock`.
///
/// Suitable for service-side embedding and for tests; browser-style
/// hosts will implement [`Session`] over their own storage.
#[derive(Debug, Default)]
pub struct StaticSession {
    bearer_token: RwLock<Option<String>>,
    api_key: RwLock<Option<String>>,
}

impl StaticSession {
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self {
            bearer_token: RwLock::new(Some(bearer_token.into())),
            api_key: RwLock::new(None),
        }
    }

    pub fn with_api_key(self, api_key: impl Into<String>) -> Self {
        *self.api_key.write().unwrap_or_else(PoisonError::into_inner) = Some(api_key.into());
        self
    }

    /// Whether the session still holds a bearer token.
    pub fn is_active(&self) -> bool {
        self.bearer_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

// An `Option<String>` cannot be left half-written by a panicking
// holder, so a poisoned lock is still safe to read through.
impl Session for StaticSession {
    fn bearer_token(&self) -> Option<String> {
        self.bearer_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn api_key(&self) -> Option<String> {
        self.api_key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn invalidate(&self) {
        self.bearer_token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.api_key
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
