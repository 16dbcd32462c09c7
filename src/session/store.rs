//! In-memory per-conversation session state.
//!
//! Holds the folder each conversation uploads into and its upload state.
//! Nothing here survives a restart.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use crate::upload::{PendingUpload, UploadState};

/// Conversation identifier (Telegram chat id).
pub type ChatId = i64;

/// Default lifetime of a pending upload (15 minutes).
pub const DEFAULT_PENDING_TTL_SECS: u64 = 15 * 60;

/// Session store shared by all update handlers.
///
/// Every operation touches a single conversation's entry, so handlers for
/// different conversations never interfere.
#[derive(Debug)]
pub struct SessionStore {
    /// Selected folder per conversation; absent means root.
    folders: RwLock<HashMap<ChatId, String>>,
    /// Pending upload per conversation; absent means idle.
    pending: RwLock<HashMap<ChatId, PendingUpload>>,
    /// How long a pending upload may wait for its name.
    pending_ttl: Duration,
}

impl SessionStore {
    /// Create a store with the default pending-upload lifetime.
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_PENDING_TTL_SECS))
    }

    /// Create a store with a custom pending-upload lifetime.
    pub fn with_ttl(pending_ttl: Duration) -> Self {
        Self {
            folders: RwLock::new(HashMap::new()),
            pending: RwLock::new(HashMap::new()),
            pending_ttl,
        }
    }

    /// Lifetime of pending uploads.
    pub fn pending_ttl(&self) -> Duration {
        self.pending_ttl
    }

    /// Select the upload folder for a conversation.
    ///
    /// A blank path clears the selection. The path is not checked against the
    /// backend, which creates missing folders on upload. Returns the stored
    /// path, or `None` if the selection was cleared.
    pub async fn set_folder(&self, chat_id: ChatId, path: &str) -> Option<String> {
        let path = path.trim();
        if path.is_empty() {
            self.clear_folder(chat_id).await;
            return None;
        }

        self.folders.write().await.insert(chat_id, path.to_string());
        debug!(chat_id, folder = %path, "Folder selected");
        Some(path.to_string())
    }

    /// Get the selected folder, or `None` for root.
    pub async fn get_folder(&self, chat_id: ChatId) -> Option<String> {
        self.folders.read().await.get(&chat_id).cloned()
    }

    /// Reset a conversation to the root folder.
    pub async fn clear_folder(&self, chat_id: ChatId) {
        if self.folders.write().await.remove(&chat_id).is_some() {
            debug!(chat_id, "Folder cleared");
        }
    }

    /// Store a pending upload, returning the one it replaced.
    pub async fn put_pending(&self, chat_id: ChatId, upload: PendingUpload) -> Option<PendingUpload> {
        self.pending.write().await.insert(chat_id, upload)
    }

    /// Remove and return the pending upload, unless it has expired.
    pub async fn take_pending(&self, chat_id: ChatId) -> Option<PendingUpload> {
        let upload = self.pending.write().await.remove(&chat_id)?;
        if upload.is_expired(self.pending_ttl) {
            debug!(chat_id, file = %upload.original_name, "Dropping expired pending upload");
            return None;
        }
        Some(upload)
    }

    /// Name of the pending file, if one is waiting and not expired.
    pub async fn pending_name(&self, chat_id: ChatId) -> Option<String> {
        self.pending
            .read()
            .await
            .get(&chat_id)
            .filter(|u| !u.is_expired(self.pending_ttl))
            .map(|u| u.original_name.clone())
    }

    /// Run one upload state transition for a conversation.
    ///
    /// `f` receives the current state (an expired pending upload counts as
    /// idle) and returns the next state along with a value for the caller.
    /// The conversation's entry is locked for the duration of `f`.
    pub async fn update_upload<A>(
        &self,
        chat_id: ChatId,
        f: impl FnOnce(UploadState) -> (UploadState, A),
    ) -> A {
        let mut pending = self.pending.write().await;

        let current = match pending.remove(&chat_id) {
            Some(upload) if upload.is_expired(self.pending_ttl) => {
                debug!(chat_id, file = %upload.original_name, "Dropping expired pending upload");
                UploadState::Idle
            }
            Some(upload) => UploadState::AwaitingNameChoice(upload),
            None => UploadState::Idle,
        };

        let (next, output) = f(current);
        if let UploadState::AwaitingNameChoice(upload) = next {
            pending.insert(chat_id, upload);
        }
        output
    }

    /// Drop every expired pending upload. Returns how many were removed.
    pub async fn evict_expired(&self) -> usize {
        let mut pending = self.pending.write().await;
        let before = pending.len();
        pending.retain(|_, upload| !upload.is_expired(self.pending_ttl));
        before - pending.len()
    }

    /// Number of stored pending uploads (including not yet evicted expired ones).
    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
