//! Contact form data model.
//!
//! # Data Flow
//! ```text
//! JSON body {nombre, email, mensaje}
//!     → ContactForm (untrusted, every field optional)
//!     → validator.rs (collects every violation)
//!     → ContactRequest (validated, handed to the mail dispatcher)
//! ```
//!
//! Nothing here is persisted; both types live for a single request.

pub mod validator;

use serde::{Deserialize, Serialize};

pub use validator::{validate, Violation};

/// Raw form submission as sent by the browser.
///
/// Wire names are the ones the existing front-end posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ContactForm {
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "mensaje")]
    pub message: Option<String>,
}

impl ContactForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            message: Some(message.into()),
        }
    }
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}
