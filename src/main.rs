//! Portfolio contact API.
//!
//! Receives contact-form submissions from the portfolio site, validates
//! them, rate-limits per client and relays them by email to the owner.
//!
//! # Architecture Overview
//!
//! ```text
//!   Browser form ──POST /api/send-email──▶ ┌──────────────────────────────┐
//!                                          │ http (CORS, timeout, req id) │
//!                                          └──────────────┬───────────────┘
//!                                                         ▼
//!                                  security::RateLimiter ─▶ contact::validate
//!                                                         │
//!                                                         ▼
//!                                          mail::MailDispatcher ──SMTP──▶ Owner inbox
//!
//!   Cross-cutting: config (file + env), observability (tracing, metrics),
//!                  lifecycle (signals, graceful shutdown)
//! ```
//!
//! # Configuration
//!
//! An optional TOML file named by `CONFIG_PATH`, overlaid with environment
//! variables (`EMAIL_USER`, `EMAIL_PASS`, `EMAIL_TO`, `PORT`, ...).

use std::path::PathBuf;

use tokio::net::TcpListener;

use portfolio_contact::config::loader;
use portfolio_contact::lifecycle::{signals, startup};
use portfolio_contact::mail::MailDispatcher;
use portfolio_contact::observability::{logging, metrics};
use portfolio_contact::{HttpServer, Shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var_os("CONFIG_PATH").map(PathBuf::from);
    let config = loader::load(config_path.as_deref())?;

    logging::init_tracing(&config.observability);
    tracing::info!("portfolio-contact v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let dispatcher = MailDispatcher::from_config(&config.mail);
    startup::report(&config, &dispatcher);

    let listener = TcpListener::bind(config.listener.socket_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        signals::trigger_on_signal(&shutdown).await;
    });

    HttpServer::with_dispatcher(config, dispatcher)
        .run(listener, rx)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
