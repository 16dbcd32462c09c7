//! Webhook server for drivebot.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::bot::BotHandler;
use crate::config::ServerConfig;
use crate::{DrivebotError, Result};

use super::router::{create_router, webhook_route};

/// HTTP server receiving Telegram updates.
pub struct WebhookServer {
    /// Server address.
    addr: SocketAddr,
    /// Update handler.
    handler: Arc<BotHandler>,
    /// Webhook path segment.
    webhook_path: String,
}

impl WebhookServer {
    /// Create a new webhook server.
    pub fn new(config: &ServerConfig, handler: Arc<BotHandler>) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| DrivebotError::Config(format!("invalid server address: {e}")))?;

        Ok(Self {
            addr,
            handler,
            webhook_path: config.webhook_path.clone(),
        })
    }

    /// Public webhook URL for a base URL such as `https://bot.example.com`.
    pub fn public_webhook_url(public_url: &str, webhook_path: &str) -> String {
        format!(
            "{}{}",
            public_url.trim_end_matches('/'),
            webhook_route(webhook_path)
        )
    }

    /// Run the server until it fails.
    pub async fn run(self) -> Result<()> {
        let router = create_router(self.handler, &self.webhook_path);

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!(
            "Webhook server listening on http://{}{}",
            local_addr,
            webhook_route(&self.webhook_path)
        );

        axum::serve(listener, router).await?;
        Ok(())
    }
}
