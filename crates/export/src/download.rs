//! Authenticated, retrying export downloads.
//!
//! Download is only called once a job is known complete, so its
//! failure mode is different from the rest of the client: a bounded
//! retry loop absorbs transient 5xx/network faults, and whatever
//! survives it is returned as a [`DownloadError`] with a message fit
//! to show the user.

use std::time::Duration;

use bytes::Bytes;

use stayport_core::ExportError;

use crate::api::{transport_error, ExportApi};

/// Number of attempts before a download is declared failed.
const DOWNLOAD_ATTEMPTS: u32 = 3;
/// Delay before the second attempt; grows by [`DOWNLOAD_DELAY_GROWTH`].
const DOWNLOAD_BASE_DELAY: Duration = Duration::from_secs(1);
/// Multiplier applied to the delay after each failed attempt.
const DOWNLOAD_DELAY_GROWTH: f64 = 1.5;

/// A fetched export artifact, uniform across body encodings.
///
/// The backend may answer with the raw binary export or with a JSON
/// body; either way callers get one byte payload they can offer the
/// user as a file.
#[derive(Debug, Clone)]
pub struct DownloadedExport {
    pub bytes: Bytes,
    /// Response `Content-Type`, defaulting to `application/octet-stream`.
    pub content_type: String,
    /// Name to save the artifact under.
    pub file_name: String,
}

impl DownloadedExport {
    /// Whether the payload is a JSON document.
    pub fn is_json(&self) -> bool {
        self.content_type
            .split(';')
            .next()
            .map(str::trim)
            .is_some_and(|t| t == "application/json" || t.ends_with("+json"))
    }
}

/// Terminal failure of [`ExportApi::download`] after the retry budget
/// was exhausted (or a definitive error was hit).
#[derive(Debug, thiserror::Error)]
#[error("Download of export {job_id} failed after {attempts} attempt(s): {source}")]
pub struct DownloadError {
    pub job_id: String,
    pub attempts: u32,
    #[source]
    pub source: ExportError,
}

impl ExportApi {
    /// Download a completed export's artifact.
    ///
    /// Sends the bearer token and, when the session carries one, the
    /// secondary `X-API-Key` header. Retries up to 3 times with
    /// growing delays on 5xx and network failures; 401/403/404 are
    /// definitive and fail immediately.
    pub async fn download(&self, job_id: &str) -> Result<DownloadedExport, DownloadError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.try_download(job_id).await {
                Ok(artifact) => {
                    tracing::info!(
                        %job_id,
                        attempt,
                        bytes = artifact.bytes.len(),
                        content_type = %artifact.content_type,
                        "Export downloaded",
                    );
                    return Ok(artifact);
                }
                Err(source) if source.is_retryable() && attempt < DOWNLOAD_ATTEMPTS => {
                    let delay = retry_delay(attempt);
                    tracing::warn!(
                        %job_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %source,
                        "Export download failed, retrying",
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(source) => {
                    tracing::error!(%job_id, attempt, error = %source, "Export download failed");
                    return Err(DownloadError {
                        job_id: job_id.to_string(),
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }

    /// One download attempt.
    async fn try_download(&self, job_id: &str) -> Result<DownloadedExport, ExportError> {
        let mut builder = self.authed(
            reqwest::Method::GET,
            &format!("/export/download/{job_id}"),
        );
        if let Some(api_key) = self.session.api_key() {
            builder = builder.header("X-API-Key", api_key);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let response = self.ensure_success(response).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let disposition = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(transport_error)?;
        let file_name = file_name_for(job_id, &content_type, disposition.as_deref());

        Ok(DownloadedExport {
            bytes,
            content_type,
            file_name,
        })
    }
}

/// Delay before attempt `attempt + 1` (1-based): base × 1.5^(attempt-1).
fn retry_delay(attempt: u32) -> Duration {
    DOWNLOAD_BASE_DELAY.mul_f64(DOWNLOAD_DELAY_GROWTH.powi(attempt.saturating_sub(1) as i32))
}

/// Pick a file name: the `Content-Disposition` filename when the
/// backend supplies one, otherwise `<job_id>.<ext>` derived from the
/// content type.
fn file_name_for(job_id: &str, content_type: &str, disposition: Option<&str>) -> String {
    if let Some(name) = disposition.and_then(disposition_file_name) {
        return name;
    }
    let essence = content_type.split(';').next().unwrap_or("").trim();
    let extension = match essence {
        "application/json" => "json",
        "text/csv" => "csv",
        "application/zip" => "zip",
        _ => "bin",
    };
    format!("{job_id}.{extension}")
}

/// Extract `filename="..."` (or the unquoted form) from a
/// `Content-Disposition` header value.
fn disposition_file_name(value: &str) -> Option<String> {
    let lowered = value.to_ascii_lowercase();
    let idx = lowered.find("filename=")?;
    let raw = value[idx + "filename=".len()..]
        .split(';')
        .next()?
        .trim()
        .trim_matches('"');
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}
