use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use drivebot::backend::{AppsScriptClient, Dispatcher, DriveBackend};
use drivebot::bot::{BotHandler, ChatGateway, TelegramClient};
use drivebot::i18n::I18n;
use drivebot::session::{PendingSweeper, SessionStore};
use drivebot::web::WebhookServer;
use drivebot::Config;

/// Environment variable naming the config file.
const CONFIG_ENV: &str = "DRIVEBOT_CONFIG";

#[tokio::main]
async fn main() {
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "config.toml".to_string());

    // Load configuration
    let config = match Config::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = drivebot::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        drivebot::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    info!("drivebot - Telegram to Google Drive upload bot");

    if let Err(e) = run(config).await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> drivebot::Result<()> {
    let i18n = I18n::resolve(&config.locale.language, config.locale.path.as_deref())?;
    info!("Locale loaded: {} ({} messages)", i18n.locale(), i18n.len());

    let backend: Arc<dyn DriveBackend> = Arc::new(AppsScriptClient::new(&config.backend)?);
    let dispatcher = Arc::new(Dispatcher::with_marker(
        backend,
        config.backend.success_marker.clone(),
    ));

    let store = Arc::new(SessionStore::with_ttl(Duration::from_secs(
        config.upload.pending_ttl_secs,
    )));

    let telegram = Arc::new(TelegramClient::new(&config.telegram)?);
    let gateway: Arc<dyn ChatGateway> = telegram.clone();

    let handler = Arc::new(BotHandler::new(
        gateway,
        Arc::clone(&store),
        dispatcher,
        Arc::new(i18n),
        &config.upload,
    ));

    let sweeper = PendingSweeper::with_interval(Arc::clone(&store), config.upload.sweep_interval_secs);
    tokio::spawn(async move {
        sweeper.run().await;
    });

    match &config.server.public_url {
        Some(public_url) => {
            let url = WebhookServer::public_webhook_url(public_url, &config.server.webhook_path);
            if let Err(e) = telegram.set_webhook(&url).await {
                warn!("Failed to register webhook at {}: {}", url, e);
            }
        }
        None => info!("No public URL configured, skipping webhook registration"),
    }

    let server = WebhookServer::new(&config.server, handler)?;
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );
    server.run().await
}
