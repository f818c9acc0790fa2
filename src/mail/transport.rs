//! Mail transports.
//!
//! [`MailTransport`] is the seam between the dispatcher and the provider;
//! [`SmtpMailer`] is the production implementation on top of `lettre`.

use std::time::Duration;

use futures_util::future::BoxFuture;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::mail::provider::{GMAIL_HOST, OUTLOOK_HOST, OUTLOOK_PORT};
use crate::mail::{DispatchError, MailMessage, MailSettings, Provider};
use crate::observability::logging::mask_email;

/// Something that can verify a mail route and deliver messages over it.
pub trait MailTransport: Send + Sync {
    /// Check connectivity and credentials without sending anything.
    fn verify(&self) -> BoxFuture<'_, Result<(), DispatchError>>;

    /// Deliver `message`.
    fn send<'a>(&'a self, message: &'a MailMessage) -> BoxFuture<'a, Result<(), DispatchError>>;
}

/// SMTP transport for the resolved provider.
pub struct SmtpMailer {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build the transport. No connection is made until first use.
    pub fn new(settings: &MailSettings, timeout: Duration) -> Result<Self, DispatchError> {
        let builder = match &settings.provider {
            Provider::Gmail => {
                AsyncSmtpTransport::<Tokio1Executor>::relay(GMAIL_HOST).map_err(config_error)?
            }
            Provider::Outlook => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(OUTLOOK_HOST)
                .map_err(config_error)?
                .port(OUTLOOK_PORT),
            Provider::Custom { host, port, secure } => {
                let parameters = TlsParameters::new(host.clone()).map_err(config_error)?;
                let tls = if *secure {
                    Tls::Wrapper(parameters)
                } else {
                    Tls::Opportunistic(parameters)
                };
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host.as_str())
                    .port(*port)
                    .tls(tls)
            }
        };

        let inner = builder
            .credentials(Credentials::new(
                settings.account.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(timeout))
            .build();

        Ok(Self { inner })
    }
}

impl MailTransport for SmtpMailer {
    fn verify(&self) -> BoxFuture<'_, Result<(), DispatchError>> {
        Box::pin(async move {
            match self.inner.test_connection().await {
                Ok(true) => Ok(()),
                Ok(false) => Err(DispatchError::Connection(
                    "mail server did not accept the connection".into(),
                )),
                Err(e) => Err(classify(&e)),
            }
        })
    }

    fn send<'a>(&'a self, message: &'a MailMessage) -> BoxFuture<'a, Result<(), DispatchError>> {
        Box::pin(async move {
            let email = build_message(message)?;
            self.inner.send(email).await.map_err(|e| classify(&e))?;
            Ok(())
        })
    }
}

/// Check the addresses of `message` before any network activity.
///
/// Sender and destination come from configuration, so a bad one is a
/// [`DispatchError::Config`]. The submitter's address passed the form's
/// shape check but may still be rejected by the mail library; it is then
/// dropped from `Reply-To` and the message goes out without it.
pub fn prepare(message: &mut MailMessage) -> Result<(), DispatchError> {
    parse_sender(&message.from)?;
    parse_destination(&message.to)?;

    if let Some(reply_to) = &message.reply_to {
        if let Err(e) = reply_to.parse::<Mailbox>() {
            tracing::warn!(
                sender = %mask_email(reply_to),
                error = %e,
                "Submitter address is not a usable mailbox, sending without Reply-To"
            );
            message.reply_to = None;
        }
    }
    Ok(())
}

fn parse_sender(address: &str) -> Result<Mailbox, DispatchError> {
    address
        .parse()
        .map_err(|e| DispatchError::Config(format!("invalid sender address: {e}")))
}

fn parse_destination(address: &str) -> Result<Mailbox, DispatchError> {
    address
        .parse()
        .map_err(|e| DispatchError::Config(format!("invalid destination address: {e}")))
}

fn build_message(message: &MailMessage) -> Result<Message, DispatchError> {
    let mut builder = Message::builder()
        .from(parse_sender(&message.from)?)
        .to(parse_destination(&message.to)?);
    if let Some(reply_to) = message.reply_to.as_deref().and_then(|a| a.parse().ok()) {
        builder = builder.reply_to(reply_to);
    }

    builder
        .subject(message.subject.clone())
        .message_id(Some(message.message_id.clone()))
        .header(ContentType::TEXT_HTML)
        .body(message.html.clone())
        .map_err(|e| DispatchError::Unknown(format!("failed to build message: {e}")))
}

fn config_error(e: lettre::transport::smtp::Error) -> DispatchError {
    DispatchError::Config(format!("invalid SMTP settings: {e}"))
}

/// SMTP reply codes that mean the credentials were refused.
const AUTH_CODES: [&str; 4] = ["530", "534", "535", "538"];

/// Map a `lettre` SMTP error onto a dispatch category.
fn classify(e: &lettre::transport::smtp::Error) -> DispatchError {
    let text = e.to_string();
    let code = e.status().map(|code| code.to_string());

    if code.as_deref().is_some_and(|c| AUTH_CODES.contains(&c)) {
        return DispatchError::Auth(text);
    }
    if is_auth_text(&text) {
        return DispatchError::Auth(text);
    }
    if e.is_timeout() {
        return DispatchError::Connection(text);
    }
    if !e.is_transient() && !e.is_permanent() && is_connection_text(&text) {
        return DispatchError::Connection(text);
    }
    DispatchError::Unknown(text)
}

fn is_auth_text(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.contains("authentication") || lower.contains("credentials")
}

fn is_connection_text(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    ["connection", "network", "resolve", "dns", "refused", "tls", "timed out"]
        .iter()
        .any(|needle| lower.contains(needle))
}
