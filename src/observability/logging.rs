//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Keep submitter data out of log lines
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - JSON format for production log shipping, human format otherwise

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber. Call once, from `main`.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.log_level;
        format!("portfolio_contact={level},tower_http={level}").into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Keep the first five characters of an address for correlation.
pub fn mask_email(email: &str) -> String {
    let visible: String = email.chars().take(5).collect();
    format!("{visible}***")
}
