//! Chat-facing side of drivebot.
//!
//! This module provides:
//! - Command parsing
//! - Telegram Bot API types and client
//! - The update handler tying commands and uploads together
//! - Per-chat update queueing

mod command;
mod handler;
mod queue;
pub mod telegram;

use async_trait::async_trait;

use crate::session::ChatId;
use crate::Result;

pub use command::{parse_input, BotCommand, BotInput};
pub use handler::BotHandler;
pub use queue::{UpdateQueue, DEFAULT_IDLE_TIMEOUT_SECS};
pub use telegram::{TelegramClient, Update};

/// What the handler needs from the chat platform.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Send a plain text message.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()>;

    /// Send a message formatted as Telegram HTML.
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<()>;

    /// Download the content of a file attached to a message.
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>>;
}
