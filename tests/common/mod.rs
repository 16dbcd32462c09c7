//! Test helpers for integration tests.
//!
//! Provides in-memory fakes for the chat gateway and the storage backend,
//! plus builders for Telegram updates.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use drivebot::backend::{BackendResponse, Dispatcher, DriveBackend, UploadForm};
use drivebot::bot::{BotHandler, ChatGateway, Update};
use drivebot::config::UploadConfig;
use drivebot::folder::FolderEntry;
use drivebot::i18n::I18n;
use drivebot::session::{ChatId, SessionStore};
use drivebot::{DrivebotError, Result};

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Chat used by most tests.
pub const CHAT: ChatId = 42;

/// A message the bot sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub chat_id: ChatId,
    pub text: String,
    pub html: bool,
}

/// Chat gateway that records replies and serves files from memory.
#[derive(Default)]
pub struct FakeGateway {
    sent: Mutex<Vec<Sent>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    delays: Mutex<HashMap<String, Duration>>,
}

impl FakeGateway {
    /// Make a file available for download.
    pub fn add_file(&self, file_id: &str, bytes: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(file_id.to_string(), bytes.to_vec());
    }

    /// Make a file available whose download takes `delay`.
    pub fn add_slow_file(&self, file_id: &str, bytes: &[u8], delay: Duration) {
        self.add_file(file_id, bytes);
        self.delays
            .lock()
            .unwrap()
            .insert(file_id.to_string(), delay);
    }

    /// All messages sent so far.
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Text of the last message sent.
    pub fn last_text(&self) -> String {
        self.sent()
            .last()
            .map(|s| s.text.clone())
            .unwrap_or_default()
    }

    fn record(&self, chat_id: ChatId, text: &str, html: bool) {
        self.sent.lock().unwrap().push(Sent {
            chat_id,
            text: text.to_string(),
            html,
        });
    }
}

#[async_trait]
impl ChatGateway for FakeGateway {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.record(chat_id, text, false);
        Ok(())
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<()> {
        self.record(chat_id, html, true);
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        let delay = self.delays.lock().unwrap().get(file_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.files
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| DrivebotError::Telegram(format!("file {file_id} not found")))
    }
}

/// Scripted answer of the fake backend.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Answer with a status and body.
    Respond(Option<u16>, String),
    /// Fail as if the network were down.
    Unreachable,
}

/// Folder listing answer of the fake backend.
#[derive(Debug, Clone)]
pub enum Listing {
    Folders(Vec<FolderEntry>),
    /// Raw body fed through the JSON parser.
    Body(String),
}

/// Storage backend that records uploads.
pub struct FakeBackend {
    uploads: Mutex<Vec<UploadForm>>,
    reply: Mutex<Reply>,
    listing: Mutex<Listing>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            reply: Mutex::new(Reply::Respond(Some(200), "✅ Arquivo salvo".to_string())),
            listing: Mutex::new(Listing::Folders(Vec::new())),
        }
    }
}

impl FakeBackend {
    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn set_listing(&self, listing: Listing) {
        *self.listing.lock().unwrap() = listing;
    }

    /// All upload forms received so far.
    pub fn uploads(&self) -> Vec<UploadForm> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl DriveBackend for FakeBackend {
    async fn list_folders(&self) -> Result<Vec<FolderEntry>> {
        let listing = self.listing.lock().unwrap().clone();
        match listing {
            Listing::Folders(folders) => Ok(folders),
            Listing::Body(body) => drivebot::backend::parse_folder_list(&body),
        }
    }

    async fn upload(&self, form: &UploadForm) -> Result<BackendResponse> {
        self.uploads.lock().unwrap().push(form.clone());
        let reply = self.reply.lock().unwrap().clone();
        match reply {
            Reply::Respond(status, body) => Ok(BackendResponse { status, body }),
            Reply::Unreachable => Err(DrivebotError::Transport("connection refused".to_string())),
        }
    }
}

/// Handler wired to fakes.
pub struct TestBot {
    pub handler: Arc<BotHandler>,
    pub gateway: Arc<FakeGateway>,
    pub backend: Arc<FakeBackend>,
    pub store: Arc<SessionStore>,
}

impl TestBot {
    /// Bot with default upload settings and English replies.
    pub fn new() -> Self {
        Self::with_store(SessionStore::new(), UploadConfig::default())
    }

    pub fn with_store(store: SessionStore, upload: UploadConfig) -> Self {
        let gateway = Arc::new(FakeGateway::default());
        let backend = Arc::new(FakeBackend::default());
        let store = Arc::new(store);
        let dispatcher = Arc::new(Dispatcher::new(backend.clone()));
        let i18n = Arc::new(I18n::builtin("en").unwrap());

        let handler = Arc::new(BotHandler::new(
            gateway.clone(),
            Arc::clone(&store),
            dispatcher,
            i18n,
            &upload,
        ));

        Self {
            handler,
            gateway,
            backend,
            store,
        }
    }

    /// Feed an update, given as JSON, to the handler.
    pub async fn send(&self, update: Value) {
        let update: Update = serde_json::from_value(update).unwrap();
        self.handler.handle_update(update).await;
    }
}

/// Update carrying a text message.
pub fn text_update(chat_id: ChatId, text: &str) -> Value {
    json!({
        "update_id": 1,
        "message": {
            "message_id": 1,
            "chat": {"id": chat_id, "type": "private"},
            "text": text
        }
    })
}

/// Update carrying a document.
pub fn document_update(chat_id: ChatId, file_id: &str, file_name: &str, mime_type: &str) -> Value {
    json!({
        "update_id": 2,
        "message": {
            "message_id": 2,
            "chat": {"id": chat_id, "type": "private"},
            "document": {
                "file_id": file_id,
                "file_unique_id": format!("u-{file_id}"),
                "file_name": file_name,
                "mime_type": mime_type,
                "file_size": 1024
            }
        }
    })
}

/// Update carrying a document with a declared size.
pub fn sized_document_update(chat_id: ChatId, file_id: &str, file_size: u64) -> Value {
    json!({
        "update_id": 3,
        "message": {
            "message_id": 3,
            "chat": {"id": chat_id, "type": "private"},
            "document": {
                "file_id": file_id,
                "file_name": "big.bin",
                "file_size": file_size
            }
        }
    })
}

/// Update carrying a photo in two sizes; `file_id` is the larger one.
pub fn photo_update(chat_id: ChatId, file_id: &str) -> Value {
    json!({
        "update_id": 4,
        "message": {
            "message_id": 4,
            "chat": {"id": chat_id, "type": "private"},
            "photo": [
                {"file_id": "thumb", "file_unique_id": "t", "width": 90, "height": 67},
                {"file_id": file_id, "file_unique_id": "p", "width": 1280, "height": 960}
            ]
        }
    })
}

/// Update carrying a sticker, which the bot treats as missing media.
pub fn sticker_update(chat_id: ChatId) -> Value {
    json!({
        "update_id": 5,
        "message": {
            "message_id": 5,
            "chat": {"id": chat_id, "type": "private"},
            "sticker": {"file_id": "s"}
        }
    })
}

/// Decode the base64 payload of an upload form.
pub fn decoded(form: &UploadForm) -> Vec<u8> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(&form.file)
        .unwrap()
}
