//! Update handling: routes each incoming message to a command or the upload flow.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::command::{parse_input, BotCommand, BotInput};
use super::telegram::{largest_photo, Document, Message, PhotoSize, Update};
use super::ChatGateway;
use crate::backend::{DriveBackend, Dispatcher};
use crate::config::UploadConfig;
use crate::folder::{build, format_listing, render};
use crate::i18n::I18n;
use crate::session::{ChatId, SessionStore};
use crate::upload::{FlowOutcome, MediaPayload, UploadEvent, UploadFlow, UploadReport};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Handles Telegram updates for all conversations.
pub struct BotHandler {
    gateway: Arc<dyn ChatGateway>,
    store: Arc<SessionStore>,
    backend: Arc<dyn DriveBackend>,
    flow: UploadFlow,
    i18n: Arc<I18n>,
    max_file_size_mb: u64,
}

impl BotHandler {
    /// Create a new handler.
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        store: Arc<SessionStore>,
        dispatcher: Arc<Dispatcher>,
        i18n: Arc<I18n>,
        upload: &UploadConfig,
    ) -> Self {
        let backend = Arc::clone(dispatcher.backend());
        let flow = UploadFlow::new(Arc::clone(&store), dispatcher, upload.skip_keyword.clone());
        Self {
            gateway,
            store,
            backend,
            flow,
            i18n,
            max_file_size_mb: upload.max_file_size_mb,
        }
    }

    /// Handle one update. Failures are reported to the user, never returned.
    pub async fn handle_update(&self, update: Update) {
        match update.message {
            Some(message) => self.handle_message(message).await,
            None => debug!(update_id = update.update_id, "Ignoring update without message"),
        }
    }

    /// Handle one message.
    pub async fn handle_message(&self, message: Message) {
        let chat_id = message.chat.id;

        if let Some(document) = message.document {
            self.receive_document(chat_id, document).await;
            return;
        }

        if let Some(photo) = message.photo.as_deref().and_then(largest_photo) {
            self.receive_photo(chat_id, photo).await;
            return;
        }

        // Stickers, voice notes and the like carry no document or photo
        let Some(text) = message.text else {
            self.upload_event(chat_id, UploadEvent::Media(None)).await;
            return;
        };

        let input = parse_input(&text);
        if let BotInput::Command(BotCommand::Unknown(_)) = &input {
            // A pending file takes slash-prefixed replies such as "/2024/scan.pdf" as its name
            if self.store.pending_name(chat_id).await.is_some() {
                self.upload_event(chat_id, UploadEvent::Text(text)).await;
                return;
            }
        }

        match input {
            BotInput::Command(command) => self.handle_command(chat_id, command).await,
            BotInput::Text(text) => self.upload_event(chat_id, UploadEvent::Text(text)).await,
        }
    }

    async fn handle_command(&self, chat_id: ChatId, command: BotCommand) {
        debug!(chat_id, command = %command, "Command received");

        match command {
            BotCommand::Start => self.reply(chat_id, self.i18n.t("start.message")).await,
            BotCommand::Help => self.reply(chat_id, self.i18n.t("help.message")).await,
            BotCommand::SetFolder(path) => {
                let text = match self.store.set_folder(chat_id, &path).await {
                    Some(folder) => self.i18n.t_with("folder.set", &[("folder", folder.as_str())]),
                    None => self.i18n.t("folder.cleared").to_string(),
                };
                self.reply(chat_id, &text).await;
            }
            BotCommand::ShowFolder => {
                let folder = self.folder_label(self.store.get_folder(chat_id).await.as_deref());
                let text = self.i18n.t_with("folder.current", &[("folder", folder.as_str())]);
                self.reply(chat_id, &text).await;
            }
            BotCommand::ListFolders => self.list_folders(chat_id).await,
            BotCommand::Skip => {
                let skip = self.flow.skip_keyword().to_string();
                self.upload_event(chat_id, UploadEvent::Text(skip)).await;
            }
            BotCommand::Unknown(name) => {
                let text = self.i18n.t_with("command.unknown", &[("command", name.as_str())]);
                self.reply(chat_id, &text).await;
            }
        }
    }

    async fn list_folders(&self, chat_id: ChatId) {
        match self.backend.list_folders().await {
            Ok(entries) => {
                let (tree, index) = build(&entries);
                let lines = render(&tree, &index);
                info!(chat_id, folders = entries.len(), "Folder listing sent");
                let html = format_listing(&lines, &self.i18n);
                if let Err(e) = self.gateway.send_html(chat_id, &html).await {
                    warn!(chat_id, "Failed to send listing: {}", e);
                }
            }
            Err(e) => {
                warn!(chat_id, "Folder listing failed: {}", e);
                let text = self
                    .i18n
                    .t_with("listing.failed", &[("details", e.to_string().as_str())]);
                self.reply(chat_id, &text).await;
            }
        }
    }

    async fn receive_document(&self, chat_id: ChatId, document: Document) {
        if self.refuse_oversize(chat_id, document.file_size).await {
            return;
        }
        let Some(bytes) = self.download(chat_id, &document.file_id).await else {
            return;
        };

        let payload = MediaPayload::Document {
            bytes,
            file_name: document.file_name,
            mime_type: document.mime_type,
        };
        self.upload_event(chat_id, UploadEvent::Media(Some(payload)))
            .await;
    }

    async fn receive_photo(&self, chat_id: ChatId, photo: &PhotoSize) {
        if self.refuse_oversize(chat_id, photo.file_size).await {
            return;
        }
        let Some(bytes) = self.download(chat_id, &photo.file_id).await else {
            return;
        };

        self.upload_event(chat_id, UploadEvent::Media(Some(MediaPayload::Photo { bytes })))
            .await;
    }

    /// Reply with a refusal if the declared size exceeds the limit.
    async fn refuse_oversize(&self, chat_id: ChatId, file_size: Option<u64>) -> bool {
        let Some(size) = file_size else {
            return false;
        };
        if !exceeds_limit(size, self.max_file_size_mb) {
            return false;
        }

        let size_mb = format!("{:.1}", size as f64 / BYTES_PER_MB as f64);
        let limit = self.max_file_size_mb.to_string();
        let text = self
            .i18n
            .t_with("upload.too_large", &[("size", size_mb.as_str()), ("limit", limit.as_str())]);
        self.reply(chat_id, &text).await;
        true
    }

    async fn download(&self, chat_id: ChatId, file_id: &str) -> Option<Vec<u8>> {
        match self.gateway.download_file(file_id).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(chat_id, file_id, "File download failed: {}", e);
                let text = self
                    .i18n
                    .t_with("upload.download_failed", &[("details", e.to_string().as_str())]);
                self.reply(chat_id, &text).await;
                None
            }
        }
    }

    async fn upload_event(&self, chat_id: ChatId, event: UploadEvent) {
        let outcome = self.flow.handle(chat_id, event).await;
        let text = self.describe(&outcome);
        self.reply(chat_id, &text).await;
    }

    /// User-facing text for a flow outcome.
    fn describe(&self, outcome: &FlowOutcome) -> String {
        let i18n = &self.i18n;
        match outcome {
            FlowOutcome::AwaitingName {
                original_name,
                discarded,
            } => {
                let ask = i18n.t_with(
                    "upload.ask_name",
                    &[("name", original_name.as_str()), ("skip", self.flow.skip_keyword())],
                );
                match discarded {
                    Some(previous) => format!(
                        "{}\n{}",
                        i18n.t_with("upload.replaced", &[("name", previous.as_str())]),
                        ask
                    ),
                    None => ask,
                }
            }
            FlowOutcome::InputMissing => i18n.t("upload.missing").to_string(),
            FlowOutcome::NothingPending => i18n.t("upload.nothing_pending").to_string(),
            FlowOutcome::Uploaded { result, .. } => {
                i18n.t_with("upload.success", &[("response", result.raw_response_text.as_str())])
            }
            FlowOutcome::Rejected { report, result } => {
                let status = result
                    .http_status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let folder = self.report_folder(report);
                i18n.t_with(
                    "upload.rejected",
                    &[
                        ("status", status.as_str()),
                        ("name", report.filename.as_str()),
                        ("folder", folder.as_str()),
                        ("mime", report.mime_type.as_str()),
                        ("response", result.raw_response_text.as_str()),
                    ],
                )
            }
            FlowOutcome::TransportFailed { report, error } => {
                let folder = self.report_folder(report);
                i18n.t_with(
                    "upload.transport",
                    &[
                        ("name", report.filename.as_str()),
                        ("folder", folder.as_str()),
                        ("details", error.as_str()),
                    ],
                )
            }
        }
    }

    fn report_folder(&self, report: &UploadReport) -> String {
        self.folder_label(report.folder.as_deref())
    }

    fn folder_label(&self, folder: Option<&str>) -> String {
        folder.unwrap_or_else(|| self.i18n.t("folder.root")).to_string()
    }

    async fn reply(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.gateway.send_text(chat_id, text).await {
            warn!(chat_id, "Failed to send reply: {}", e);
        }
    }
}

/// Check a byte size against a limit given in megabytes.
fn exceeds_limit(size: u64, max_file_size_mb: u64) -> bool {
    size > max_file_size_mb.saturating_mul(BYTES_PER_MB)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exceeds_limit() {
        assert!(!exceeds_limit(20 * BYTES_PER_MB, 20));
        assert!(exceeds_limit(20 * BYTES_PER_MB + 1, 20));
        assert!(exceeds_limit(1, 0));
    }

    #[test]
    fn test_exceeds_limit_huge_setting() {
        assert!(!exceeds_limit(u64::MAX, u64::MAX));
        assert!(!exceeds_limit(5 * BYTES_PER_MB, u64::MAX / 2));
    }
}
