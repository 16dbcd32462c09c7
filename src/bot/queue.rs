//! Per-chat ordering of incoming updates.
//!
//! Each chat gets a worker task fed by a channel, so a chat's updates are
//! handled one at a time in arrival order while different chats run
//! concurrently. A worker exits after a quiet period and is recreated on the
//! next update for its chat.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::handler::BotHandler;
use super::telegram::Update;
use crate::session::ChatId;

/// Default time a chat worker waits for another update before exiting.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

type Workers = Mutex<HashMap<ChatId, UnboundedSender<Update>>>;

struct Inner {
    handler: Arc<BotHandler>,
    workers: Workers,
    idle_timeout: Duration,
}

/// Queues updates per chat in front of a [`BotHandler`].
#[derive(Clone)]
pub struct UpdateQueue {
    inner: Arc<Inner>,
}

impl UpdateQueue {
    /// Create a queue with the default idle timeout.
    pub fn new(handler: Arc<BotHandler>) -> Self {
        Self::with_idle_timeout(handler, Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS))
    }

    /// Create a queue whose workers exit after `idle_timeout` without updates.
    pub fn with_idle_timeout(handler: Arc<BotHandler>, idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                handler,
                workers: Mutex::new(HashMap::new()),
                idle_timeout,
            }),
        }
    }

    /// Hand an update to its chat's worker.
    ///
    /// Must be called from within a tokio runtime. Updates without a chat are
    /// handled on their own task.
    pub fn enqueue(&self, update: Update) {
        let Some(chat_id) = update.chat_id() else {
            let handler = Arc::clone(&self.inner.handler);
            tokio::spawn(async move {
                handler.handle_update(update).await;
            });
            return;
        };

        let mut workers = lock(&self.inner.workers);

        let update = match workers.get(&chat_id) {
            Some(sender) => match sender.send(update) {
                Ok(()) => return,
                // Worker already gone; start a fresh one below
                Err(mpsc::error::SendError(update)) => update,
            },
            None => update,
        };

        let (sender, receiver) = mpsc::unbounded_channel();
        // The receiver is alive, so this cannot fail
        let _ = sender.send(update);
        workers.insert(chat_id, sender);
        debug!(chat_id, "Chat worker started");

        tokio::spawn(run_worker(Arc::clone(&self.inner), chat_id, receiver));
    }

    /// Number of chats with a running worker.
    pub fn active_chats(&self) -> usize {
        lock(&self.inner.workers).len()
    }
}

async fn run_worker(inner: Arc<Inner>, chat_id: ChatId, mut receiver: UnboundedReceiver<Update>) {
    loop {
        let next = match timeout(inner.idle_timeout, receiver.recv()).await {
            Ok(next) => next,
            Err(_) => {
                // Deregister under the map lock so no update slips in between
                let mut workers = lock(&inner.workers);
                match receiver.try_recv() {
                    Ok(update) => Some(update),
                    Err(_) => {
                        workers.remove(&chat_id);
                        None
                    }
                }
            }
        };

        match next {
            Some(update) => inner.handler.handle_update(update).await,
            None => break,
        }
    }
    debug!(chat_id, "Chat worker stopped");
}

fn lock(workers: &Workers) -> MutexGuard<'_, HashMap<ChatId, UnboundedSender<Update>>> {
    workers.lock().unwrap_or_else(PoisonError::into_inner)
}
