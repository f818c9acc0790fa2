//! Contact form validation.
//!
//! Pure and deterministic. Every rule runs independently so the caller
//! gets the full list of problems in a single round trip.

use std::fmt;

use crate::contact::{ContactForm, ContactRequest};

/// Minimum trimmed name length, in characters.
pub const MIN_NAME_CHARS: usize = 2;

/// Minimum trimmed message length, in characters.
pub const MIN_MESSAGE_CHARS: usize = 10;

/// A rule the submission broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    NameTooShort,
    InvalidEmail,
    MessageTooShort,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Violation::NameTooShort => "name too short",
            Violation::InvalidEmail => "invalid email",
            Violation::MessageTooShort => "message too short",
        })
    }
}

/// Validate a raw form. Violations come back in field order.
pub fn validate(form: &ContactForm) -> Result<ContactRequest, Vec<Violation>> {
    let mut violations = Vec::new();

    let name = form.name.as_deref().map(str::trim).unwrap_or_default();
    if name.chars().count() < MIN_NAME_CHARS {
        violations.push(Violation::NameTooShort);
    }

    let email = form.email.as_deref().unwrap_or_default();
    if !is_valid_email(email) {
        violations.push(Violation::InvalidEmail);
    }

    let message = form.message.as_deref().map(str::trim).unwrap_or_default();
    if message.chars().count() < MIN_MESSAGE_CHARS {
        violations.push(Violation::MessageTooShort);
    }

    if !violations.is_empty() {
        return Err(violations);
    }

    Ok(ContactRequest {
        name: name.to_string(),
        email: email.to_string(),
        message: message.to_string(),
    })
}

/// `local@domain.tld` shape check: no whitespace, exactly one `@`, and a
/// dot in the domain with at least one character on either side.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}
