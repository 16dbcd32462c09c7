//! Upload packaging and result classification.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{info, warn};

use super::{BackendResponse, DriveBackend, UploadForm};
use crate::Result;

/// Default marker whose presence in a response body means success.
pub const DEFAULT_SUCCESS_MARKER: &str = "✅";

/// Outcome of an upload the backend answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResult {
    /// Whether the backend reported success.
    pub success: bool,
    /// Response body as received.
    pub raw_response_text: String,
    /// HTTP status (diagnostic only).
    pub http_status: Option<u16>,
}

/// Sends uploads to the backend and interprets the answers.
pub struct Dispatcher {
    backend: Arc<dyn DriveBackend>,
    success_marker: String,
}

impl Dispatcher {
    /// Create a dispatcher with the default success marker.
    pub fn new(backend: Arc<dyn DriveBackend>) -> Self {
        Self::with_marker(backend, DEFAULT_SUCCESS_MARKER)
    }

    /// Create a dispatcher with a custom success marker.
    pub fn with_marker(backend: Arc<dyn DriveBackend>, success_marker: impl Into<String>) -> Self {
        Self {
            backend,
            success_marker: success_marker.into(),
        }
    }

    /// The backend uploads go to.
    pub fn backend(&self) -> &Arc<dyn DriveBackend> {
        &self.backend
    }

    /// Send a file to `folder` (`None` or empty for root).
    ///
    /// Returns `Err` only when the backend could not be reached.
    pub async fn dispatch(
        &self,
        bytes: &[u8],
        filename: &str,
        mime_type: &str,
        folder: Option<&str>,
    ) -> Result<BackendResult> {
        let form = package(bytes, filename, mime_type, folder);
        let response = self.backend.upload(&form).await?;
        let result = self.classify(response);

        if result.success {
            info!(
                filename,
                folder = folder.unwrap_or(""),
                size = bytes.len(),
                "Upload accepted"
            );
        } else {
            warn!(
                filename,
                folder = folder.unwrap_or(""),
                status = ?result.http_status,
                response = %result.raw_response_text,
                "Upload rejected"
            );
        }

        Ok(result)
    }

    /// Decide whether a backend answer means success.
    ///
    /// A JSON object with a boolean `success` field decides by that field.
    /// Otherwise the body must contain the success marker; the HTTP status
    /// is not considered.
    pub fn classify(&self, response: BackendResponse) -> BackendResult {
        let success = structured_success(&response.body)
            .unwrap_or_else(|| response.body.contains(&self.success_marker));

        BackendResult {
            success,
            raw_response_text: response.body,
            http_status: response.status,
        }
    }
}

/// Build the form fields for an upload.
pub(crate) fn package(bytes: &[u8], filename: &str, mime_type: &str, folder: Option<&str>) -> UploadForm {
    UploadForm {
        file: STANDARD.encode(bytes),
        filename: filename.to_string(),
        mime_type: mime_type.to_string(),
        folder: folder.filter(|f| !f.is_empty()).map(str::to_string),
    }
}

fn structured_success(body: &str) -> Option<bool> {
    let value: serde_json::Value = serde_json::from_str(body.trim()).ok()?;
    value.as_object()?.get("success")?.as_bool()
}
