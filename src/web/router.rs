//! Router configuration for the webhook endpoint.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

use crate::bot::{BotHandler, Update, UpdateQueue};

/// Route path for a configured webhook path segment ("" serves at "/").
pub fn webhook_route(webhook_path: &str) -> String {
    format!("/{}", webhook_path.trim_matches('/'))
}

/// Create the webhook router.
pub fn create_router(handler: Arc<BotHandler>, webhook_path: &str) -> Router {
    create_queued_router(UpdateQueue::new(handler), webhook_path)
}

/// Create the webhook router in front of an existing update queue.
pub fn create_queued_router(queue: UpdateQueue, webhook_path: &str) -> Router {
    Router::new()
        .route(&webhook_route(webhook_path), post(receive_update))
        .merge(create_health_router())
        .layer(TraceLayer::new_for_http())
        .with_state(queue)
}

/// Create a health check router.
pub fn create_health_router() -> Router<UpdateQueue> {
    Router::new().route("/health", get(health_check))
}

/// Queue an update for its chat and acknowledge it.
///
/// Telegram only needs a quick 200; replies go out through the Bot API.
async fn receive_update(
    State(queue): State<UpdateQueue>,
    Json(update): Json<Update>,
) -> StatusCode {
    tracing::debug!(update_id = update.update_id, "Update received");
    queue.enqueue(update);
    StatusCode::OK
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
