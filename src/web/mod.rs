//! Webhook HTTP interface for drivebot.

pub mod router;
pub mod server;

pub use router::{create_queued_router, create_router};
pub use server::WebhookServer;
