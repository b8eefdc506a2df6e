//! Stargazer - relays GitHub star webhooks to a Telegram chat.
//!
//! This binary:
//! - Parses flags and environment into an immutable `Config`
//! - Checks the Telegram bot identity once (never fatal)
//! - Serves `/health`, `/version` and `/webhook` until SIGINT/SIGTERM

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stargazer::{router, AppState, Cli, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    if cli.print_version {
        println!("{VERSION}");
        return Ok(());
    }

    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    info!(version = VERSION, "stargazer_starting");

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "config_invalid");
            return Err(e).context("Invalid configuration");
        }
    };

    for setting in config.missing_telegram_settings() {
        error!(setting = setting, "telegram_setting_missing");
    }

    info!(
        listen = %config.listen,
        port = config.port,
        telegram_token_configured = !config.telegram_token.is_empty(),
        telegram_chat_id = config.telegram_chat_id,
        telegram_api_url = %config.telegram_api_url,
        telegram_timeout_ms = config.telegram_timeout.as_millis() as u64,
        "config_loaded"
    );

    let addr = config.socket_addr();
    let state = AppState::new(config).context("Failed to create Telegram client")?;

    if state.telegram.is_configured() {
        match state.telegram.get_me().await {
            Ok(bot) => info!(
                bot_id = bot.id,
                bot_username = bot.username.as_deref().unwrap_or_default(),
                "telegram_bot_ready"
            ),
            Err(e) => error!(error = %e, "telegram_bot_unreachable"),
        }
    }

    let app = router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(address = %addr, "server_listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("server_shutting_down");
}
