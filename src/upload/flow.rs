//! Upload orchestration.
//!
//! [`UploadFlow`] runs the state machine from [`super::state`] against the
//! session store and hands finished uploads to the dispatcher.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::state::{transition, Action, UploadEvent};
use crate::backend::{BackendResult, Dispatcher};
use crate::session::{ChatId, SessionStore};

/// Describes an upload that was sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    /// Final filename.
    pub filename: String,
    /// MIME type sent.
    pub mime_type: String,
    /// Target folder; `None` is root.
    pub folder: Option<String>,
}

/// Result of feeding one event into the upload flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// A file was captured and the user should choose its name.
    AwaitingName {
        original_name: String,
        discarded: Option<String>,
    },
    /// The message carried no document or photo.
    InputMissing,
    /// Text arrived but no file was waiting for a name.
    NothingPending,
    /// The backend accepted the upload.
    Uploaded {
        report: UploadReport,
        result: BackendResult,
    },
    /// The backend answered without reporting success.
    Rejected {
        report: UploadReport,
        result: BackendResult,
    },
    /// The backend could not be reached.
    TransportFailed { report: UploadReport, error: String },
}

/// Per-conversation upload flow.
pub struct UploadFlow {
    store: Arc<SessionStore>,
    dispatcher: Arc<Dispatcher>,
    skip_keyword: String,
}

impl UploadFlow {
    /// Create a new upload flow.
    pub fn new(
        store: Arc<SessionStore>,
        dispatcher: Arc<Dispatcher>,
        skip_keyword: impl Into<String>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            skip_keyword: skip_keyword.into(),
        }
    }

    /// Reply that keeps the original filename.
    pub fn skip_keyword(&self) -> &str {
        &self.skip_keyword
    }

    /// Feed one event for a conversation through the flow.
    pub async fn handle(&self, chat_id: ChatId, event: UploadEvent) -> FlowOutcome {
        let skip_keyword = self.skip_keyword.as_str();
        let action = self
            .store
            .update_upload(chat_id, |state| transition(state, event, skip_keyword))
            .await;

        match action {
            Action::AskForName {
                original_name,
                discarded,
            } => {
                if let Some(previous) = &discarded {
                    debug!(chat_id, previous = %previous, "Replaced pending upload");
                }
                info!(chat_id, file = %original_name, "File captured, awaiting name");
                FlowOutcome::AwaitingName {
                    original_name,
                    discarded,
                }
            }
            Action::AskForFile => FlowOutcome::InputMissing,
            Action::NothingPending => FlowOutcome::NothingPending,
            Action::Dispatch { upload, filename } => {
                let folder = self.store.get_folder(chat_id).await;
                let report = UploadReport {
                    filename,
                    mime_type: upload.mime_type.clone(),
                    folder,
                };

                match self
                    .dispatcher
                    .dispatch(
                        &upload.bytes,
                        &report.filename,
                        &report.mime_type,
                        report.folder.as_deref(),
                    )
                    .await
                {
                    Ok(result) if result.success => FlowOutcome::Uploaded { report, result },
                    Ok(result) => FlowOutcome::Rejected { report, result },
                    Err(e) => {
                        warn!(chat_id, file = %report.filename, "Upload failed: {}", e);
                        FlowOutcome::TransportFailed {
                            report,
                            error: e.to_string(),
                        }
                    }
                }
            }
        }
    }
}
