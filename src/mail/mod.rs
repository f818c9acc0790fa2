//! Outbound mail subsystem.
//!
//! # Data Flow
//! ```text
//! MailConfig (EMAIL_USER, EMAIL_PASS, EMAIL_TO, EMAIL_HOST, EMAIL_PORT)
//!     → provider.rs (credentials + tagged provider, resolved once at startup)
//!     → transport.rs (SMTP transport built from the provider)
//!
//! ContactRequest
//!     → dispatcher.rs (config check → verify → render → send, each bounded)
//!     → message.rs (subject, HTML body, reply-to, message id)
//!     → transport.rs (delivery, provider errors mapped to DispatchError)
//! ```
//!
//! # Security Constraints
//! - Credentials come only from configuration or the environment
//! - Never log or return the service account secret
//! - Raw provider errors are only surfaced outside production

pub mod dispatcher;
pub mod message;
pub mod provider;
pub mod transport;

use thiserror::Error;

pub use dispatcher::{MailDiagnostics, MailDispatcher};
pub use message::MailMessage;
pub use provider::{MailSettings, Provider};
pub use transport::{MailTransport, SmtpMailer};

/// Errors that can occur while dispatching a contact message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Provider rejected the service account credentials.
    #[error("authentication with the mail provider failed: {0}")]
    Auth(String),

    /// Provider could not be reached (resolution, connect, TLS, timeout).
    #[error("could not reach the mail provider: {0}")]
    Connection(String),

    /// Required settings are missing or unusable.
    #[error("incomplete configuration: {0}")]
    Config(String),

    /// Anything the provider reported that fits no other category.
    #[error("mail delivery failed: {0}")]
    Unknown(String),
}

impl DispatchError {
    /// Stable category name for logs and metrics.
    pub fn category(&self) -> &'static str {
        match self {
            DispatchError::Auth(_) => "auth",
            DispatchError::Connection(_) => "connection",
            DispatchError::Config(_) => "config",
            DispatchError::Unknown(_) => "unknown",
        }
    }

    /// Message safe to show to any client.
    pub fn public_message(&self) -> &'static str {
        match self {
            DispatchError::Auth(_) => "email authentication error, check credentials",
            DispatchError::Connection(_) => "could not connect to the mail server",
            DispatchError::Config(_) => "incomplete configuration",
            DispatchError::Unknown(_) => "internal server error",
        }
    }

    /// Underlying diagnostic text. Never contains credentials.
    pub fn detail(&self) -> &str {
        match self {
            DispatchError::Auth(d)
            | DispatchError::Connection(d)
            | DispatchError::Config(d)
            | DispatchError::Unknown(d) => d,
        }
    }
}
