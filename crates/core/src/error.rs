//! Error taxonomy for export API calls.
//!
//! Backend responses are normalized into [`ExportError`] at the client
//! boundary so that callers branch on a small, fixed set of cases
//! instead of raw status codes. The `Display` impl of each variant is
//! the user-safe message.

/// Normalized failure of an export API call.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// 401 -- the session is invalid. The local session has already
    /// been invalidated by the time this is returned; never retried.
    #[error("Your session has expired. Please sign in again")]
    Unauthorized,

    /// 403 -- the account lacks permission; never retried.
    #[error("Permission denied: {0}. Contact an administrator for access")]
    Forbidden(String),

    /// 404 -- the job expired or never existed. The poller treats this
    /// as a signal to stop polling that job permanently.
    #[error("This export is no longer available (not found or expired)")]
    NotFound,

    /// 400/409/422 -- the request itself is malformed; never retried.
    #[error("Invalid export request: {0}")]
    Validation(String),

    /// 5xx -- transient server-side failure; safe to retry.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// No response at all (DNS, connect, timeout); retried like 5xx.
    #[error("Network error: {0}")]
    Network(String),

    /// The response arrived but its body did not match the documented
    /// shape. Not retried: the backend is misbehaving, not overloaded.
    #[error("Malformed response from server: {0}")]
    Decode(String),
}

impl ExportError {
    /// Classify a non-2xx response by status code.
    ///
    /// `body` is the raw response text; a `message`/`detail`/`error`
    /// field is extracted when the body is JSON.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = message_from_body(body);
        match status {
            401 => ExportError::Unauthorized,
            403 => ExportError::Forbidden(
                message.unwrap_or_else(|| "insufficient privileges".to_string()),
            ),
            404 => ExportError::NotFound,
            400 | 409 | 422 => ExportError::Validation(
                message.unwrap_or_else(|| "request rejected by the server".to_string()),
            ),
            s => ExportError::Server {
                status: s,
                message: message.unwrap_or_else(|| truncated(body)),
            },
        }
    }

    /// Whether retrying the same request can plausibly succeed.
    ///
    /// Only server-side (5xx) and transport failures qualify; every
    /// 4xx-derived variant is definitive.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExportError::Server { .. } | ExportError::Network(_))
    }
}

/// Pull a human-readable message out of a JSON error body, trying the
/// field names the backend is known to use.
fn message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    for key in ["message", "detail", "error"] {
        if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

/// Cap raw (non-JSON) bodies so HTML error pages do not end up in logs
/// or user-facing messages wholesale.
fn truncated(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no response body".to_string();
    }
    match trimmed.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
