//! Contact message dispatch.
//!
//! # Steps
//! 1. Refuse immediately when required settings are missing
//! 2. Render the message and check its addresses
//! 3. Verify the transport (bounded by the mail timeout)
//! 4. Send it (bounded by the mail timeout) and return its message id
//!
//! A timeout in either network step is reported as a connection error.
//! Nothing is retried; the caller may resubmit.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::MailConfig;
use crate::contact::ContactRequest;
use crate::mail::message::{local_now, MailMessage};
use crate::mail::transport::prepare;
use crate::mail::{DispatchError, MailSettings, MailTransport, SmtpMailer};
use crate::observability::metrics;

/// Configuration presence report. Carries no secret values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailDiagnostics {
    #[serde(rename = "EMAIL_USER")]
    pub user_set: bool,
    #[serde(rename = "EMAIL_PASS")]
    pub password_set: bool,
    #[serde(rename = "EMAIL_TO")]
    pub recipient_set: bool,
    #[serde(rename = "EMAIL_PASS_LENGTH")]
    pub password_length: usize,
    /// Provider kind, when one could be resolved.
    pub provider: Option<&'static str>,
}

impl MailDiagnostics {
    fn from_config(config: &MailConfig) -> Self {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        Self {
            user_set: set(&config.user),
            password_set: set(&config.password),
            recipient_set: set(&config.to),
            password_length: config.password.as_deref().map_or(0, |p| p.chars().count()),
            provider: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.user_set && self.password_set && self.recipient_set
    }
}

enum Route {
    Ready {
        settings: MailSettings,
        transport: Arc<dyn MailTransport>,
    },
    Unavailable(DispatchError),
}

/// Sends validated contact requests to the configured mailbox.
pub struct MailDispatcher {
    route: Route,
    diagnostics: MailDiagnostics,
    timeout: Duration,
    timezone_offset_minutes: i32,
    site_name: String,
}

impl MailDispatcher {
    /// Resolve the provider and build the SMTP transport.
    ///
    /// Incomplete configuration is not fatal here; it is reported by every
    /// later [`send`](Self::send).
    pub fn from_config(config: &MailConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let route = match MailSettings::from_config(config) {
            Ok(settings) => match SmtpMailer::new(&settings, timeout) {
                Ok(mailer) => Route::Ready {
                    settings,
                    transport: Arc::new(mailer),
                },
                Err(e) => Route::Unavailable(e),
            },
            Err(e) => Route::Unavailable(e),
        };
        Self::assemble(config, route)
    }

    /// Dispatcher over a caller-supplied transport. `settings` must already
    /// be resolved.
    pub fn with_transport(
        config: &MailConfig,
        settings: MailSettings,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self::assemble(config, Route::Ready { settings, transport })
    }

    fn assemble(config: &MailConfig, route: Route) -> Self {
        let mut diagnostics = MailDiagnostics::from_config(config);
        if let Route::Ready { settings, .. } = &route {
            diagnostics.provider = Some(settings.provider.kind());
        }
        Self {
            route,
            diagnostics,
            timeout: Duration::from_secs(config.timeout_secs),
            timezone_offset_minutes: config.timezone_offset_minutes,
            site_name: config.site_name.clone(),
        }
    }

    pub fn diagnostics(&self) -> &MailDiagnostics {
        &self.diagnostics
    }

    /// Resolved settings, or the reason there are none.
    pub fn settings(&self) -> Result<&MailSettings, &DispatchError> {
        match &self.route {
            Route::Ready { settings, .. } => Ok(settings),
            Route::Unavailable(e) => Err(e),
        }
    }

    /// Check connectivity and credentials without sending.
    pub async fn verify(&self) -> Result<(), DispatchError> {
        let (_, transport) = self.ready()?;
        self.bounded("verify", transport.verify()).await
    }

    /// Deliver `request`; returns the message id on success.
    pub async fn send(&self, request: &ContactRequest) -> Result<String, DispatchError> {
        let started = Instant::now();
        let result = self.deliver(request).await;
        let outcome = match &result {
            Ok(_) => "sent",
            Err(e) => e.category(),
        };
        metrics::record_dispatch(outcome, started);
        result
    }

    async fn deliver(&self, request: &ContactRequest) -> Result<String, DispatchError> {
        let (settings, transport) = self.ready()?;

        let mut message = MailMessage::compose(
            request,
            &settings.account,
            &settings.recipient,
            &self.site_name,
            local_now(self.timezone_offset_minutes),
        );
        prepare(&mut message)?;

        self.bounded("verify", transport.verify()).await?;
        tracing::debug!(provider = %settings.provider, "Mail transport verified");

        self.bounded("send", transport.send(&message)).await?;
        tracing::info!(message_id = %message.message_id, "Contact message sent");

        Ok(message.message_id)
    }

    fn ready(&self) -> Result<(&MailSettings, &Arc<dyn MailTransport>), DispatchError> {
        match &self.route {
            Route::Ready { settings, transport } => Ok((settings, transport)),
            Route::Unavailable(e) => Err(e.clone()),
        }
    }

    async fn bounded<F>(&self, step: &str, fut: F) -> Result<(), DispatchError>
    where
        F: Future<Output = Result<(), DispatchError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Connection(format!(
                "{step} timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::Provider;
    use futures_util::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTransport {
        verify_error: Option<DispatchError>,
        hang: bool,
        sent: Mutex<Vec<MailMessage>>,
        verifications: AtomicUsize,
    }

    impl MailTransport for FakeTransport {
        fn verify(&self) -> BoxFuture<'_, Result<(), DispatchError>> {
            Box::pin(async move {
                self.verifications.fetch_add(1, Ordering::SeqCst);
                if self.hang {
                    std::future::pending::<()>().await;
                }
                match &self.verify_error {
                    Some(e) => Err(e.clone()),
                    None => Ok(()),
                }
            })
        }

        fn send<'a>(&'a self, message: &'a MailMessage) -> BoxFuture<'a, Result<(), DispatchError>> {
            Box::pin(async move {
                self.sent.lock().unwrap().push(message.clone());
                Ok(())
            })
        }
    }

    fn config() -> MailConfig {
        MailConfig {
            user: Some("svc@gmail.com".into()),
            password: Some("app-password".into()),
            to: Some("me@example.com".into()),
            timeout_secs: 1,
            ..MailConfig::default()
        }
    }

    fn settings() -> MailSettings {
        MailSettings {
            account: "svc@gmail.com".into(),
            password: "app-password".into(),
            recipient: "me@example.com".into(),
            provider: Provider::Gmail,
        }
    }

    fn request() -> ContactRequest {
        ContactRequest {
            name: "Jordan".into(),
            email: "jordan@example.org".into(),
            message: "Would love to chat about a project.".into(),
        }
    }

    #[tokio::test]
    async fn test_send_returns_message_id() {
        let transport = Arc::new(FakeTransport::default());
        let dispatcher = MailDispatcher::with_transport(&config(), settings(), transport.clone());

        let id = dispatcher.send(&request()).await.unwrap();
        assert!(!id.is_empty());

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message_id, id);
        assert_eq!(sent[0].to, "me@example.com");
        assert_eq!(sent[0].reply_to.as_deref(), Some("jordan@example.org"));
    }

    #[tokio::test]
    async fn test_unusable_reply_to_still_delivered() {
        let transport = Arc::new(FakeTransport::default());
        let dispatcher = MailDispatcher::with_transport(&config(), settings(), transport.clone());
        let odd = ContactRequest {
            email: "a@b..c".into(),
            ..request()
        };

        dispatcher.send(&odd).await.unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].reply_to, None);
        assert!(sent[0].html.contains("a@b..c"));
    }

    #[tokio::test]
    async fn test_bad_recipient_fails_before_verify() {
        let transport = Arc::new(FakeTransport::default());
        let broken = MailSettings {
            recipient: "not an address".into(),
            ..settings()
        };
        let dispatcher = MailDispatcher::with_transport(&config(), broken, transport.clone());

        let err = dispatcher.send(&request()).await.unwrap_err();
        assert_eq!(err.category(), "config");
        assert_eq!(transport.verifications.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_verify_failure_prevents_send() {
        let transport = Arc::new(FakeTransport {
            verify_error: Some(DispatchError::Auth("535 bad credentials".into())),
            ..FakeTransport::default()
        });
        let dispatcher = MailDispatcher::with_transport(&config(), settings(), transport.clone());

        let err = dispatcher.send(&request()).await.unwrap_err();
        assert_eq!(err.category(), "auth");
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hanging_verify_times_out_as_connection_error() {
        let transport = Arc::new(FakeTransport {
            hang: true,
            ..FakeTransport::default()
        });
        let dispatcher = MailDispatcher::with_transport(&config(), settings(), transport.clone());

        let err = dispatcher.send(&request()).await.unwrap_err();
        assert_eq!(err, DispatchError::Connection("verify timed out after 1s".into()));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_settings_fail_before_network() {
        let mut incomplete = config();
        incomplete.password = None;
        let dispatcher = MailDispatcher::from_config(&incomplete);

        let err = dispatcher.send(&request()).await.unwrap_err();
        assert_eq!(err, DispatchError::Config("missing EMAIL_PASS".into()));
        assert!(!dispatcher.diagnostics().is_complete());
        assert_eq!(dispatcher.diagnostics().provider, None);
    }

    #[tokio::test]
    async fn test_diagnostics_never_hold_secret() {
        let dispatcher =
            MailDispatcher::with_transport(&config(), settings(), Arc::new(FakeTransport::default()));
        let json = serde_json::to_string(dispatcher.diagnostics()).unwrap();
        assert!(!json.contains("app-password"));
        assert!(json.contains("\"EMAIL_PASS_LENGTH\":12"));
        assert!(json.contains("\"provider\":\"gmail\""));
    }
}
