//! Contact form client.
//!
//! # Data Flow
//! ```text
//! User input
//!     → controller.rs (local completeness check, busy state, banners)
//!     → api.rs (JSON POST to the submission endpoint)
//!     → controller.rs (success / server error / unreachable banner)
//! ```
//!
//! The browser build of the same controller lives in
//! `static/contact-form.js`.

pub mod api;
pub mod controller;

use thiserror::Error;

pub use api::{ApiReply, ContactClient};
pub use controller::{Banner, BannerKind, FormController, SubmitOutcome, SUCCESS_BANNER_TTL};

/// Errors returned by [`ContactClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// No response arrived (connect failure, timeout).
    #[error("cannot connect to the server: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// The server answered with an error body.
    #[error("server rejected the request ({status}): {error}")]
    Rejected {
        status: u16,
        error: String,
        details: Vec<String>,
    },

    /// The server answered with something that is not the expected JSON.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() || e.is_request() {
            ClientError::Unreachable(e)
        } else {
            ClientError::Decode(e.to_string())
        }
    }
}
