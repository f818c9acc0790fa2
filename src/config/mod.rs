//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (CONFIG_PATH)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides: PORT, EMAIL_*, ALLOWED_ORIGINS, NODE_ENV)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so the service runs with environment only
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{
    AppConfig, CorsConfig, Environment, ListenerConfig, MailConfig, ObservabilityConfig,
    RateLimitConfig, SecurityConfig, TimeoutConfig,
};
