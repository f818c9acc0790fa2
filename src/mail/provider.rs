//! Mail provider selection.
//!
//! The provider is chosen once from the service account's domain:
//! Gmail accounts use Google's managed relay, Outlook/Hotmail accounts use
//! Microsoft's STARTTLS submission host, and everything else needs an
//! explicit host.

use std::fmt;

use crate::config::MailConfig;
use crate::mail::DispatchError;

pub const GMAIL_HOST: &str = "smtp.gmail.com";
pub const OUTLOOK_HOST: &str = "smtp-mail.outlook.com";
pub const OUTLOOK_PORT: u16 = 587;

/// Where and how to reach the SMTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// Google relay over implicit TLS.
    Gmail,
    /// Outlook submission host, port 587, STARTTLS.
    Outlook,
    /// Operator-supplied server.
    Custom { host: String, port: u16, secure: bool },
}

impl Provider {
    /// Pick a provider for `account`. Custom servers require `host`.
    pub fn detect(
        account: &str,
        host: Option<&str>,
        port: Option<u16>,
        secure: bool,
    ) -> Result<Self, DispatchError> {
        let account = account.to_ascii_lowercase();
        if account.contains("gmail.com") {
            return Ok(Provider::Gmail);
        }
        if account.contains("outlook.com") || account.contains("hotmail.com") {
            return Ok(Provider::Outlook);
        }

        let host = host
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| DispatchError::Config("EMAIL_HOST is required for this account".into()))?;

        Ok(Provider::Custom {
            host: host.to_string(),
            port: port.unwrap_or(MailConfig::DEFAULT_PORT),
            secure,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Provider::Gmail => "gmail",
            Provider::Outlook => "outlook",
            Provider::Custom { .. } => "custom",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Gmail => write!(f, "{GMAIL_HOST} (implicit TLS)"),
            Provider::Outlook => write!(f, "{OUTLOOK_HOST}:{OUTLOOK_PORT} (STARTTLS)"),
            Provider::Custom { host, port, secure } => {
                let mode = if *secure { "implicit TLS" } else { "STARTTLS" };
                write!(f, "{host}:{port} ({mode})")
            }
        }
    }
}

/// Complete, resolved mail settings.
#[derive(Clone, PartialEq, Eq)]
pub struct MailSettings {
    /// Service account; also the `From` address.
    pub account: String,
    pub password: String,
    /// Destination mailbox.
    pub recipient: String,
    pub provider: Provider,
}

impl MailSettings {
    /// Resolve settings from configuration.
    ///
    /// Fails with [`DispatchError::Config`] naming every missing variable,
    /// never their values.
    pub fn from_config(config: &MailConfig) -> Result<Self, DispatchError> {
        let missing = missing_variables(config);
        if !missing.is_empty() {
            return Err(DispatchError::Config(format!("missing {}", missing.join(", "))));
        }

        let (Some(account), Some(password), Some(recipient)) =
            (&config.user, &config.password, &config.to)
        else {
            return Err(DispatchError::Config("missing mail settings".into()));
        };

        let provider = Provider::detect(
            account,
            config.host.as_deref(),
            config.port,
            config.secure,
        )?;

        Ok(Self {
            account: account.clone(),
            password: password.clone(),
            recipient: recipient.clone(),
            provider,
        })
    }
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("account", &self.account)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .field("provider", &self.provider)
            .finish()
    }
}

/// Environment variable names for the required settings that are unset.
pub fn missing_variables(config: &MailConfig) -> Vec<&'static str> {
    let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
    [
        ("EMAIL_USER", &config.user),
        ("EMAIL_PASS", &config.password),
        ("EMAIL_TO", &config.to),
    ]
    .into_iter()
    .filter(|(_, value)| blank(*value))
    .map(|(name, _)| name)
    .collect()
}
