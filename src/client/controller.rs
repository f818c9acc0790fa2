//! Form controller state machine.
//!
//! ```text
//! Idle ──submit──▶ (fields empty) ──▶ Idle + error banner
//!   │
//!   └──submit──▶ Busy ──finish──▶ Idle + banner (success | error | unreachable)
//! ```
//!
//! The busy flag is cleared by every `finish`, whatever the outcome.

use std::time::{Duration, Instant};

use crate::client::{ClientError, ContactClient};
use crate::contact::ContactForm;

/// How long the success banner stays up.
pub const SUCCESS_BANNER_TTL: Duration = Duration::from_secs(5);

const INCOMPLETE: &str = "please fill in all fields";
const SENT: &str = "message sent, thank you! I will get back to you soon";
const UNREACHABLE: &str = "cannot connect to the server, please try again later";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
    /// No response at all, as opposed to a server-reported error.
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
    expires_at: Option<Instant>,
}

impl Banner {
    fn new(kind: BannerKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Result of one submission round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent { message_id: String },
    Rejected { error: String, details: Vec<String> },
    Unreachable,
}

impl From<Result<String, ClientError>> for SubmitOutcome {
    fn from(result: Result<String, ClientError>) -> Self {
        match result {
            Ok(message_id) => SubmitOutcome::Sent { message_id },
            Err(ClientError::Rejected { error, details, .. }) => {
                SubmitOutcome::Rejected { error, details }
            }
            Err(ClientError::Unreachable(_)) => SubmitOutcome::Unreachable,
            Err(e @ (ClientError::Build(_) | ClientError::Decode(_))) => SubmitOutcome::Rejected {
                error: e.to_string(),
                details: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct FormController {
    pub name: String,
    pub email: String,
    pub message: String,
    busy: bool,
    banner: Option<Banner>,
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    /// Start a submission. Returns the payload to send, or `None` when a
    /// field is empty or a submission is already in flight.
    pub fn begin_submit(&mut self) -> Option<ContactForm> {
        if self.busy {
            return None;
        }
        let fields = [&self.name, &self.email, &self.message];
        if fields.iter().any(|f| f.trim().is_empty()) {
            self.banner = Some(Banner::new(BannerKind::Error, INCOMPLETE));
            return None;
        }

        self.busy = true;
        self.banner = None;
        Some(ContactForm::new(
            self.name.trim(),
            self.email.trim(),
            self.message.trim(),
        ))
    }

    /// Apply the outcome of the submission started by `begin_submit`.
    pub fn finish(&mut self, outcome: SubmitOutcome, now: Instant) {
        self.busy = false;
        self.banner = Some(match outcome {
            SubmitOutcome::Sent { .. } => {
                self.name.clear();
                self.email.clear();
                self.message.clear();
                Banner {
                    expires_at: Some(now + SUCCESS_BANNER_TTL),
                    ..Banner::new(BannerKind::Success, SENT)
                }
            }
            SubmitOutcome::Rejected { error, details } => {
                let text = if details.is_empty() {
                    error
                } else {
                    format!("{error}: {}", details.join(", "))
                };
                Banner::new(BannerKind::Error, text)
            }
            SubmitOutcome::Unreachable => Banner::new(BannerKind::Offline, UNREACHABLE),
        });
    }

    /// Drop a banner whose display time has passed.
    pub fn tick(&mut self, now: Instant) {
        if self.banner.as_ref().is_some_and(|b| b.is_expired(now)) {
            self.banner = None;
        }
    }

    /// Run a full submission against `client`.
    pub async fn submit(&mut self, client: &ContactClient) -> Option<SubmitOutcome> {
        let form = self.begin_submit()?;
        let outcome = SubmitOutcome::from(client.submit(&form).await);
        self.finish(outcome.clone(), Instant::now());
        Some(outcome)
    }
}
