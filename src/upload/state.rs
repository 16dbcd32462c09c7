//! Per-conversation upload state and its transition function.

use std::time::{Duration, Instant};

/// Filename given to photos, which carry no original name.
pub const PHOTO_FILE_NAME: &str = "photo.jpg";

/// MIME type given to photos.
pub const PHOTO_MIME_TYPE: &str = "image/jpeg";

/// Filename used when a document arrives without one.
pub const FALLBACK_DOCUMENT_NAME: &str = "document";

/// MIME type used when a document arrives without one.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// File content carried by an incoming chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaPayload {
    /// A document with its declared name and MIME type.
    Document {
        bytes: Vec<u8>,
        file_name: Option<String>,
        mime_type: Option<String>,
    },
    /// A photo (already resolved to its largest size).
    Photo { bytes: Vec<u8> },
}

/// A captured file waiting for the user to choose its final name.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    /// Raw file content.
    pub bytes: Vec<u8>,
    /// Name the file arrived with.
    pub original_name: String,
    /// MIME type to send to the backend.
    pub mime_type: String,
    /// When the file was captured.
    captured_at: Instant,
}

impl PendingUpload {
    /// Create a pending upload captured now.
    pub fn new(bytes: Vec<u8>, original_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            captured_at: Instant::now(),
        }
    }

    /// Capture a media payload.
    pub fn capture(payload: MediaPayload) -> Self {
        match payload {
            MediaPayload::Document {
                bytes,
                file_name,
                mime_type,
            } => Self::new(
                bytes,
                file_name
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| FALLBACK_DOCUMENT_NAME.to_string()),
                mime_type
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string()),
            ),
            MediaPayload::Photo { bytes } => Self::new(bytes, PHOTO_FILE_NAME, PHOTO_MIME_TYPE),
        }
    }

    /// Check whether the upload has waited longer than `ttl`.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.captured_at.elapsed() >= ttl
    }
}

/// Upload state of one conversation.
#[derive(Debug, Clone, Default)]
pub enum UploadState {
    /// No file is pending.
    #[default]
    Idle,
    /// A file was received and the bot asked for its final name.
    AwaitingNameChoice(PendingUpload),
}

impl UploadState {
    /// Check whether a file is pending.
    pub fn is_awaiting(&self) -> bool {
        matches!(self, UploadState::AwaitingNameChoice(_))
    }
}

/// Input to the upload state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// A message that should carry a file; `None` when it has no document or photo.
    Media(Option<MediaPayload>),
    /// A plain text reply.
    Text(String),
}

/// What the caller must do after a transition.
#[derive(Debug, Clone)]
pub enum Action {
    /// Ask the user for the final name of the captured file.
    AskForName {
        original_name: String,
        /// Name of a previously pending file that was discarded.
        discarded: Option<String>,
    },
    /// The message had no document or photo.
    AskForFile,
    /// Text arrived while no file was pending.
    NothingPending,
    /// Send the file to the backend under `filename`.
    Dispatch {
        upload: PendingUpload,
        filename: String,
    },
}

/// Apply one event to a conversation's upload state.
pub fn transition(state: UploadState, event: UploadEvent, skip_keyword: &str) -> (UploadState, Action) {
    match (state, event) {
        (state, UploadEvent::Media(None)) => (state, Action::AskForFile),
        (state, UploadEvent::Media(Some(payload))) => {
            let discarded = match state {
                UploadState::AwaitingNameChoice(previous) => Some(previous.original_name),
                UploadState::Idle => None,
            };
            let upload = PendingUpload::capture(payload);
            let action = Action::AskForName {
                original_name: upload.original_name.clone(),
                discarded,
            };
            (UploadState::AwaitingNameChoice(upload), action)
        }
        (UploadState::Idle, UploadEvent::Text(_)) => (UploadState::Idle, Action::NothingPending),
        (UploadState::AwaitingNameChoice(upload), UploadEvent::Text(reply)) => {
            let filename = choose_filename(&reply, &upload.original_name, skip_keyword);
            (UploadState::Idle, Action::Dispatch { upload, filename })
        }
    }
}

/// Final filename for a naming reply.
///
/// The skip keyword (case-insensitive) or a blank reply keeps the original
/// name; anything else is used verbatim after trimming.
pub fn choose_filename(reply: &str, original_name: &str, skip_keyword: &str) -> String {
    let reply = reply.trim();
    if reply.is_empty() || reply.eq_ignore_ascii_case(skip_keyword.trim()) {
        original_name.to_string()
    } else {
        reply.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(name: &str) -> UploadEvent {
        UploadEvent::Media(Some(MediaPayload::Document {
            bytes: name.as_bytes().to_vec(),
            file_name: Some(name.to_string()),
            mime_type: Some("application/pdf".to_string()),
        }))
    }

    #[test]
    fn test_capture_document() {
        let upload = PendingUpload::capture(MediaPayload::Document {
            bytes: vec![1, 2, 3],
            file_name: Some("report.pdf".to_string()),
            mime_type: Some("application/pdf".to_string()),
        });
        assert_eq!(upload.original_name, "report.pdf");
        assert_eq!(upload.mime_type, "application/pdf");
        assert_eq!(upload.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_capture_document_without_metadata() {
        let upload = PendingUpload::capture(MediaPayload::Document {
            bytes: vec![],
            file_name: None,
            mime_type: Some(String::new()),
        });
        assert_eq!(upload.original_name, FALLBACK_DOCUMENT_NAME);
        assert_eq!(upload.mime_type, FALLBACK_MIME_TYPE);
    }

    #[test]
    fn test_capture_photo() {
        let upload = PendingUpload::capture(MediaPayload::Photo { bytes: vec![9] });
        assert_eq!(upload.original_name, "photo.jpg");
        assert_eq!(upload.mime_type, "image/jpeg");
    }

    #[test]
    fn test_idle_media_moves_to_awaiting() {
        let (state, action) = transition(UploadState::Idle, document("a.pdf"), "skip");

        assert!(state.is_awaiting());
        match action {
            Action::AskForName {
                original_name,
                discarded,
            } => {
                assert_eq!(original_name, "a.pdf");
                assert!(discarded.is_none());
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_media_without_file_stays_idle() {
        let (state, action) = transition(UploadState::Idle, UploadEvent::Media(None), "skip");
        assert!(!state.is_awaiting());
        assert!(matches!(action, Action::AskForFile));
    }

    #[test]
    fn test_media_without_file_keeps_pending() {
        let (state, _) = transition(UploadState::Idle, document("a.pdf"), "skip");
        let (state, action) = transition(state, UploadEvent::Media(None), "skip");
        assert!(state.is_awaiting());
        assert!(matches!(action, Action::AskForFile));
    }

    #[test]
    fn test_second_media_discards_first() {
        let (state, _) = transition(UploadState::Idle, document("first.pdf"), "skip");
        let (state, action) = transition(state, document("second.pdf"), "skip");

        match action {
            Action::AskForName { discarded, .. } => {
                assert_eq!(discarded.as_deref(), Some("first.pdf"))
            }
            other => panic!("unexpected action: {other:?}"),
        }

        let (_, action) = transition(state, UploadEvent::Text("skip".to_string()), "skip");
        match action {
            Action::Dispatch { upload, filename } => {
                assert_eq!(filename, "second.pdf");
                assert_eq!(upload.bytes, b"second.pdf".to_vec());
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_text_while_idle() {
        let (state, action) =
            transition(UploadState::Idle, UploadEvent::Text("hello".to_string()), "skip");
        assert!(!state.is_awaiting());
        assert!(matches!(action, Action::NothingPending));
    }

    #[test]
    fn test_custom_name_dispatches_and_returns_to_idle() {
        let (state, _) = transition(UploadState::Idle, document("a.pdf"), "skip");
        let (state, action) =
            transition(state, UploadEvent::Text("  Contract 2024.pdf ".to_string()), "skip");

        assert!(!state.is_awaiting());
        match action {
            Action::Dispatch { upload, filename } => {
                assert_eq!(filename, "Contract 2024.pdf");
                assert_eq!(upload.mime_type, "application/pdf");
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_choose_filename() {
        assert_eq!(choose_filename("skip", "a.pdf", "skip"), "a.pdf");
        assert_eq!(choose_filename(" SKIP ", "a.pdf", "skip"), "a.pdf");
        assert_eq!(choose_filename("   ", "a.pdf", "skip"), "a.pdf");
        assert_eq!(choose_filename("b", "a.pdf", "skip"), "b");
        assert_eq!(choose_filename("../x", "a.pdf", "skip"), "../x");
    }

    #[test]
    fn test_expiry() {
        let upload = PendingUpload::new(vec![], "a", "text/plain");
        assert!(upload.is_expired(Duration::ZERO));
        assert!(!upload.is_expired(Duration::from_secs(3600)));
    }
}
