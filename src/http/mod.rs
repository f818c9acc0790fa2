//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, CORS, timeout, body limit)
//!     → request.rs (request ID, client identifier)
//!     → handlers.rs (health, diagnostics, submission pipeline)
//!     → response.rs (JSON bodies, status mapping)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ClientId, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{AppState, HttpServer};
