//! Startup reporting.

use crate::config::AppConfig;
use crate::mail::provider::missing_variables;
use crate::mail::MailDispatcher;

/// Log the effective configuration and warn about missing mail settings.
///
/// Secrets are never logged; only whether they are set.
pub fn report(config: &AppConfig, dispatcher: &MailDispatcher) {
    tracing::info!(
        environment = config.environment.as_str(),
        address = %config.listener.socket_address(),
        rate_limit_enabled = config.rate_limit.enabled,
        max_attempts = config.rate_limit.max_attempts,
        window_secs = config.rate_limit.window_secs,
        any_origin = config.cors.allows_any_origin(),
        "Configuration loaded"
    );

    match dispatcher.settings() {
        Ok(settings) => tracing::info!(
            provider = %settings.provider,
            recipient_set = true,
            "Mail delivery configured"
        ),
        Err(e) => {
            let missing = missing_variables(&config.mail);
            tracing::warn!(
                missing = ?missing,
                reason = %e,
                "Mail delivery not configured; submissions will fail"
            );
        }
    }
}
