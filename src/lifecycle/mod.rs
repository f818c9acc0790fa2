//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Report mail readiness → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Server drains, sweeper stops → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: an invalid configuration is fatal at startup
//! - Missing mail credentials only warn; submissions fail until fixed

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
