//! Error types for drivebot.

use thiserror::Error;

/// Common error type for drivebot.
#[derive(Error, Debug)]
pub enum DrivebotError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for user or config input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Locale resources could not be loaded.
    #[error("locale error: {0}")]
    Locale(#[from] crate::i18n::I18nError),

    /// An upload was triggered without a document or photo.
    #[error("no document or photo in message")]
    InputMissing,

    /// Network or timeout failure talking to the backend or chat platform.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered but did not report success.
    #[error("backend rejected request (status {status:?}): {body}")]
    BackendRejected {
        /// HTTP status, if one was received.
        status: Option<u16>,
        /// Raw response body.
        body: String,
    },

    /// The backend returned something that is not the expected JSON shape.
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    /// Telegram Bot API reported an error.
    #[error("telegram error: {0}")]
    Telegram(String),
}

impl From<reqwest::Error> for DrivebotError {
    fn from(e: reqwest::Error) -> Self {
        DrivebotError::Transport(e.to_string())
    }
}

/// Result type alias for drivebot operations.
pub type Result<T> = std::result::Result<T, DrivebotError>;
