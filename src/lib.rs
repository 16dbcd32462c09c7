//! drivebot - Telegram to Google Drive upload bot
//!
//! Receives documents and photos over a Telegram webhook, asks for a
//! filename and forwards the file to an Apps Script web app that stores it
//! in a Drive folder tree.

pub mod backend;
pub mod bot;
pub mod config;
pub mod error;
pub mod folder;
pub mod i18n;
pub mod logging;
pub mod session;
pub mod upload;
pub mod web;

pub use backend::{
    parse_folder_list, AppsScriptClient, BackendResponse, BackendResult, Dispatcher, DriveBackend,
    UploadForm,
};
pub use bot::{
    parse_input, BotCommand, BotHandler, BotInput, ChatGateway, TelegramClient, Update,
    UpdateQueue,
};
pub use config::Config;
pub use error::{DrivebotError, Result};
pub use folder::{build, render, FolderEntry, PathIdIndex, PathNode};
pub use i18n::I18n;
pub use session::{ChatId, PendingSweeper, SessionStore};
pub use upload::{
    transition, Action, FlowOutcome, MediaPayload, PendingUpload, UploadEvent, UploadFlow,
    UploadReport, UploadState,
};
pub use web::{create_router, WebhookServer};
