//! Portfolio contact form backend.

pub mod client;
pub mod config;
pub mod contact;
pub mod http;
pub mod lifecycle;
pub mod mail;
pub mod observability;
pub mod security;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
