//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming submission:
//!     → headers.rs (resolve client identifier)
//!     → rate_limit.rs (check per-identifier sliding window)
//!     → Pass to validation and dispatch
//!
//! Every response:
//!     → headers.rs (hardening headers)
//! ```
//!
//! # Design Decisions
//! - Rate limiting runs before validation, so malformed floods count too
//! - Fail closed: a denied check never reaches the mail provider
//! - Client-supplied forwarding headers are trusted only when configured

pub mod headers;
pub mod rate_limit;

pub use headers::{client_identifier, with_security_headers};
pub use rate_limit::{AttemptStore, InMemoryAttemptStore, RateDecision, RateLimiter, RatePolicy};
