//! Storage backend access for drivebot.
//!
//! The backend is a web app that accepts form-encoded uploads and lists
//! folders as JSON. [`DriveBackend`] is the seam between the bot and the
//! transport; [`AppsScriptClient`] is the HTTP implementation.

mod apps_script;
mod dispatcher;

use async_trait::async_trait;
use serde::Serialize;

use crate::folder::FolderEntry;
use crate::Result;

pub use apps_script::{parse_folder_list, AppsScriptClient};
pub use dispatcher::{BackendResult, Dispatcher};

/// Form fields of an upload request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadForm {
    /// Base64-encoded file content.
    pub file: String,
    /// Target filename.
    pub filename: String,
    /// MIME type of the content.
    pub mime_type: String,
    /// Target folder path; omitted for the root folder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

/// Raw backend answer to an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    /// HTTP status code, when the transport has one.
    pub status: Option<u16>,
    /// Response body text.
    pub body: String,
}

/// Operations the bot needs from the storage backend.
#[async_trait]
pub trait DriveBackend: Send + Sync {
    /// Fetch the flat folder list.
    async fn list_folders(&self) -> Result<Vec<FolderEntry>>;

    /// Send one upload.
    ///
    /// Errors only on transport failure; any answer, successful or not, is
    /// returned as a [`BackendResponse`].
    async fn upload(&self, form: &UploadForm) -> Result<BackendResponse>;
}
