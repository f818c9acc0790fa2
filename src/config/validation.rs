//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check addresses and origins parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Missing mail credentials are not an error here; they surface as a
//!   configuration error on the first send attempt

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not an IP address")]
    BindAddress(String),

    #[error("rate_limit.{0} must be greater than zero")]
    RateLimitZero(&'static str),

    #[error("mail.timeout_secs must be greater than zero")]
    MailTimeoutZero,

    #[error("mail.port must be greater than zero")]
    MailPortZero,

    #[error("mail.timezone_offset_minutes {0} is outside +/-24h")]
    TimezoneOffset(i32),

    #[error("timeouts.request_secs ({request}) must exceed the mail verify + send budget ({mail})")]
    RequestTimeout { request: u64, mail: u64 },

    #[error("security.max_body_size must be greater than zero")]
    BodyLimitZero,

    #[error("cors.allowed_origins entry {0:?} is not a valid header value")]
    Origin(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let rl = &config.rate_limit;
    if rl.enabled {
        if rl.max_attempts == 0 {
            errors.push(ValidationError::RateLimitZero("max_attempts"));
        }
        if rl.window_secs == 0 {
            errors.push(ValidationError::RateLimitZero("window_secs"));
        }
        if rl.sweep_interval_secs == 0 {
            errors.push(ValidationError::RateLimitZero("sweep_interval_secs"));
        }
    }

    let mail = &config.mail;
    if mail.timeout_secs == 0 {
        errors.push(ValidationError::MailTimeoutZero);
    }
    if mail.port == Some(0) {
        errors.push(ValidationError::MailPortZero);
    }
    if mail.timezone_offset_minutes.abs() >= 24 * 60 {
        errors.push(ValidationError::TimezoneOffset(mail.timezone_offset_minutes));
    }

    // Verify and send each get the mail timeout.
    let mail_budget = mail.timeout_secs.saturating_mul(2);
    if config.timeouts.request_secs <= mail_budget {
        errors.push(ValidationError::RequestTimeout {
            request: config.timeouts.request_secs,
            mail: mail_budget,
        });
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::BodyLimitZero);
    }

    if !config.cors.allows_any_origin() {
        for origin in &config.cors.allowed_origins {
            if HeaderValue::from_str(origin).is_err() {
                errors.push(ValidationError::Origin(origin.clone()));
            }
        }
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(obs.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
