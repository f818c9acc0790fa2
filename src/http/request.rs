//! Request-side helpers.
//!
//! # Responsibilities
//! - Tag every request with an `x-request-id` (generated if absent)
//! - Resolve the client identifier used for rate limiting

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::http::server::AppState;
use crate::security::client_identifier;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Assigns a UUID request id to requests that arrive without one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Copies the request id onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Rate-limit identifier of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl FromRequestParts<AppState> for ClientId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(ClientId(client_identifier(
            &parts.headers,
            peer,
            state.config.rate_limit.trust_forwarded_for,
        )))
    }
}

/// Request id of the current request, for log correlation.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
