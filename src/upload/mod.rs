//! Two-step upload flow: receive a file, ask for its name, send it to Drive.

mod flow;
mod state;

pub use flow::{FlowOutcome, UploadFlow, UploadReport};
pub use state::{
    choose_filename, transition, Action, MediaPayload, PendingUpload, UploadEvent, UploadState,
    FALLBACK_DOCUMENT_NAME, FALLBACK_MIME_TYPE, PHOTO_FILE_NAME, PHOTO_MIME_TYPE,
};
