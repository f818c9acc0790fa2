//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the contact
//! service. All types derive Serde traits for deserialization from config
//! files; environment variables are layered on top by the loader.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration for the contact service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, port).
    pub listener: ListenerConfig,

    /// Cross-origin policy for the browser form.
    pub cors: CorsConfig,

    /// Per-client submission limits.
    pub rate_limit: RateLimitConfig,

    /// Outbound mail provider settings.
    pub mail: MailConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Security hardening.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Deployment mode. Gates diagnostic detail in error responses.
    pub environment: Environment,
}

/// Deployment mode, read from `NODE_ENV` or `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Test,
    /// Unset or unrecognised modes count as production.
    #[default]
    Production,
}

impl Environment {
    /// Parse a mode name. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "test" => Some(Self::Test),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Raw provider errors are only shown outside production.
    pub fn exposes_diagnostics(self) -> bool {
        !matches!(self, Self::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub bind_address: String,

    /// TCP port. Overridden by `PORT`.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Cross-origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. Empty, or a single `*`, allows any origin.
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting on the submission endpoint.
    pub enabled: bool,

    /// Attempts allowed per identifier inside one window.
    pub max_attempts: usize,

    /// Sliding window length in seconds.
    pub window_secs: u64,

    /// How often idle identifiers are evicted, in seconds.
    pub sweep_interval_secs: u64,

    /// Key clients by the first `X-Forwarded-For` entry when present.
    /// Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 5,
            window_secs: 15 * 60,
            sweep_interval_secs: 5 * 60,
            trust_forwarded_for: true,
        }
    }
}

/// Outbound mail configuration.
///
/// `user`, `password` and `to` are optional here so the service can start
/// without them; a send attempt without them fails with a configuration
/// error instead.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MailConfig {
    /// Service account used to authenticate and as the `From` address.
    pub user: Option<String>,

    /// Secret for the service account.
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Destination mailbox for contact messages.
    pub to: Option<String>,

    /// SMTP host for accounts outside the known providers.
    pub host: Option<String>,

    /// SMTP port for custom hosts (default 587).
    pub port: Option<u16>,

    /// Implicit TLS for custom hosts; otherwise STARTTLS is negotiated.
    pub secure: bool,

    /// Deadline for each of the verify and send steps, in seconds.
    pub timeout_secs: u64,

    /// Offset from UTC used for the timestamp in the message body.
    pub timezone_offset_minutes: i32,

    /// Site name shown in the message footer.
    pub site_name: String,
}

impl MailConfig {
    pub const DEFAULT_PORT: u16 = 587;
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            user: None,
            password: None,
            to: None,
            host: None,
            port: None,
            secure: false,
            timeout_secs: 15,
            // America/Guayaquil
            timezone_offset_minutes: -5 * 60,
            site_name: "portfolio".to_string(),
        }
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("to", &self.to)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("timeout_secs", &self.timeout_secs)
            .field("timezone_offset_minutes", &self.timezone_offset_minutes)
            .field("site_name", &self.site_name)
            .finish()
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 45 }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add hardening response headers.
    pub enable_headers: bool,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 64 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    pub log_level: String,

    /// Emit JSON log lines instead of the human format.
    pub json_logs: bool,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,

    /// Name reported by the health endpoint.
    pub service_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
            service_name: "Portfolio Contact API".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_contact_policy() {
        let config = AppConfig::default();
        assert_eq!(config.rate_limit.max_attempts, 5);
        assert_eq!(config.rate_limit.window_secs, 900);
        assert_eq!(config.listener.port, 3000);
        assert_eq!(config.environment, Environment::Production);
        assert!(config.cors.allows_any_origin());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("Development"), Some(Environment::Development));
        assert_eq!(Environment::parse(" prod "), Some(Environment::Production));
        assert_eq!(Environment::parse("staging"), None);
        assert!(Environment::Development.exposes_diagnostics());
        assert!(!Environment::Production.exposes_diagnostics());
    }

    #[test]
    fn test_mail_debug_redacts_password() {
        let mail = MailConfig {
            password: Some("hunter2".into()),
            ..MailConfig::default()
        };
        let rendered = format!("{:?}", mail);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            environment = "development"

            [rate_limit]
            max_attempts = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.rate_limit.max_attempts, 3);
        assert_eq!(config.rate_limit.window_secs, 900);
        assert_eq!(config.mail.timeout_secs, 15);
    }
}
