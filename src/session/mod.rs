//! Conversation session state for drivebot.

mod store;
mod sweeper;

pub use store::{ChatId, SessionStore, DEFAULT_PENDING_TTL_SECS};
pub use sweeper::{PendingSweeper, DEFAULT_SWEEP_INTERVAL_SECS};
