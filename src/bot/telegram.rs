//! Telegram Bot API types and client.
//!
//! Only the parts of the API the bot uses are modelled: incoming updates
//! with text, documents and photos, and the `sendMessage`, `getFile` and
//! `setWebhook` methods.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::ChatGateway;
use crate::config::TelegramConfig;
use crate::error::{DrivebotError, Result};
use crate::session::ChatId;

/// Maximum length of a single Telegram message.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Total timeout in seconds (file downloads included).
const TOTAL_TIMEOUT_SECS: u64 = 120;

/// An incoming update.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Update identifier.
    pub update_id: i64,
    /// New incoming message, if this update is one.
    #[serde(default)]
    pub message: Option<Message>,
}

impl Update {
    /// Chat the update belongs to, if it carries a message.
    pub fn chat_id(&self) -> Option<ChatId> {
        self.message.as_ref().map(|m| m.chat.id)
    }
}

/// A chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub document: Option<Document>,
    /// Available sizes of a photo.
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
}

/// The chat a message belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

/// A general file attached to a message.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// One size of a photo.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// Pick the largest photo size. Ties go to the last one listed.
pub fn largest_photo(sizes: &[PhotoSize]) -> Option<&PhotoSize> {
    sizes
        .iter()
        .max_by_key(|p| u64::from(p.width) * u64::from(p.height))
}

/// File metadata returned by `getFile`.
#[derive(Debug, Clone, Deserialize)]
struct File {
    #[serde(default)]
    file_path: Option<String>,
}

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default = "Option::default")]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: ChatId,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    disable_web_page_preview: bool,
}

#[derive(Debug, Serialize)]
struct GetFile<'a> {
    file_id: &'a str,
}

#[derive(Debug, Serialize)]
struct SetWebhook<'a> {
    url: &'a str,
    allowed_updates: &'a str,
}

/// Telegram Bot API client.
pub struct TelegramClient {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    /// Create a client from the Telegram configuration.
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(TOTAL_TIMEOUT_SECS))
            .build()
            .map_err(|e| DrivebotError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_base, self.token, file_path)
    }

    /// Call a Bot API method with form-encoded parameters.
    async fn call<P: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .form(params)
            .send()
            .await
            // reqwest errors can embed the URL, which contains the token
            .map_err(|e| DrivebotError::Transport(format!("{method}: {}", e.without_url())))?;

        let body = response
            .text()
            .await
            .map_err(|e| DrivebotError::Transport(format!("{method}: {}", e.without_url())))?;

        parse_api_response(method, &body)
    }

    /// Send a message, split into several if it is too long.
    async fn send(&self, chat_id: ChatId, text: &str, parse_mode: Option<&str>) -> Result<()> {
        for chunk in split_message(text, MAX_MESSAGE_LENGTH) {
            let params = SendMessage {
                chat_id,
                text: &chunk,
                parse_mode,
                disable_web_page_preview: true,
            };
            let _: serde_json::Value = self.call("sendMessage", &params).await?;
        }
        Ok(())
    }

    /// Register the webhook URL Telegram delivers updates to.
    pub async fn set_webhook(&self, url: &str) -> Result<()> {
        let params = SetWebhook {
            url,
            allowed_updates: r#"["message"]"#,
        };
        let _: bool = self.call("setWebhook", &params).await?;
        info!("Webhook registered at {}", url);
        Ok(())
    }
}

#[async_trait]
impl ChatGateway for TelegramClient {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.send(chat_id, text, None).await
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<()> {
        self.send(chat_id, html, Some("HTML")).await
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        let file: File = self.call("getFile", &GetFile { file_id }).await?;
        let path = file
            .file_path
            .ok_or_else(|| DrivebotError::Telegram(format!("file {file_id} has no download path")))?;

        debug!(file_id, "Downloading file");
        let response = self
            .client
            .get(self.file_url(&path))
            .send()
            .await
            .map_err(|e| DrivebotError::Transport(format!("download: {}", e.without_url())))?;

        if !response.status().is_success() {
            return Err(DrivebotError::Telegram(format!(
                "download failed with HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DrivebotError::Transport(format!("download: {}", e.without_url())))?;
        Ok(bytes.to_vec())
    }
}

fn parse_api_response<T: DeserializeOwned>(method: &str, body: &str) -> Result<T> {
    let response: ApiResponse<T> = serde_json::from_str(body)
        .map_err(|e| DrivebotError::Telegram(format!("{method}: invalid response: {e}")))?;

    if !response.ok {
        return Err(DrivebotError::Telegram(format!(
            "{method}: {}",
            response
                .description
                .unwrap_or_else(|| "unknown error".to_string())
        )));
    }

    response
        .result
        .ok_or_else(|| DrivebotError::Telegram(format!("{method}: missing result")))
}

/// Split text into chunks of at most `max_chars` characters, preferring line breaks.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let needed = if current.is_empty() { line_len } else { line_len + 1 };

        if current_len + needed > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > max_chars {
            // A single line longer than the limit is cut at character boundaries
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}
