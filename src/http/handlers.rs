//! Route handlers.
//!
//! # Submission pipeline
//! ```text
//! POST body
//!     → rate limiter (429, nothing else runs)
//!     → body read (413 past the size limit)
//!     → lenient JSON parse (malformed → empty form)
//!     → validator (400 with every violation)
//!     → mail dispatcher (500 by category, 200 with message id)
//! ```

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{OriginalUri, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::contact::{self, ContactForm};
use crate::http::request::{request_id, ClientId};
use crate::http::response::{ApiError, HealthStatus, SendSuccess};
use crate::http::server::AppState;
use crate::observability::logging::mask_email;
use crate::observability::metrics;
use crate::security::RateDecision;

/// Browser form controller, served alongside the API.
pub const CONTACT_FORM_SCRIPT: &str = include_str!("../../static/contact-form.js");

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "OK",
        timestamp: timestamp(),
        service: state.config.observability.service_name.clone(),
    })
}

pub async fn hello(method: Method, OriginalUri(uri): OriginalUri) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "contact API is running",
        "method": method.as_str(),
        "url": uri.to_string(),
        "timestamp": timestamp(),
    }))
}

/// Handle a contact form submission.
pub async fn send_email(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SendSuccess>, ApiError> {
    let request_id = request_id(&headers);

    if let RateDecision::Denied { retry_after } = state.limiter.check(&client, Instant::now()) {
        tracing::warn!(
            request_id = %request_id,
            client = %client,
            retry_after_secs = retry_after.as_secs(),
            "Submission rate limited"
        );
        metrics::record_rate_limited();
        metrics::record_submission("rate_limited");
        return Err(ApiError::RateLimited { retry_after });
    }

    let body = body.map_err(|rejection| {
        tracing::warn!(request_id = %request_id, error = %rejection, "Request body rejected");
        metrics::record_submission("invalid");
        ApiError::from(rejection)
    })?;

    let form = match serde_json::from_slice::<ContactForm>(&body) {
        Ok(form) => form,
        Err(e) => {
            tracing::debug!(request_id = %request_id, error = %e, "Unparseable body, treating as empty form");
            ContactForm::default()
        }
    };

    let request = contact::validate(&form).map_err(|violations| {
        tracing::info!(
            request_id = %request_id,
            violations = ?violations,
            "Submission rejected by validation"
        );
        metrics::record_submission("invalid");
        ApiError::Invalid(violations)
    })?;

    tracing::info!(
        request_id = %request_id,
        sender = %mask_email(&request.email),
        name_chars = request.name.chars().count(),
        message_chars = request.message.chars().count(),
        "Dispatching contact message"
    );

    match state.dispatcher.send(&request).await {
        Ok(message_id) => {
            metrics::record_submission("sent");
            Ok(Json(SendSuccess::new(message_id)))
        }
        Err(error) => {
            tracing::error!(
                request_id = %request_id,
                category = error.category(),
                error = %error,
                "Contact message dispatch failed"
            );
            metrics::record_submission(error.category());
            Err(ApiError::Dispatch {
                error,
                expose_detail: state.config.environment.exposes_diagnostics(),
            })
        }
    }
}

/// Report mail configuration presence and verify the transport.
pub async fn test_email(State(state): State<AppState>) -> impl IntoResponse {
    let diagnostics = state.dispatcher.diagnostics().clone();

    if !diagnostics.is_complete() {
        tracing::warn!(diagnostics = ?diagnostics, "Mail configuration incomplete");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": "incomplete configuration",
                "envCheck": diagnostics,
            })),
        );
    }

    match state.dispatcher.verify().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "mail configuration verified",
                "envCheck": diagnostics,
                "transporterVerified": true,
            })),
        ),
        Err(error) => {
            tracing::error!(category = error.category(), error = %error, "Mail verification failed");
            let mut body = json!({
                "success": false,
                "error": error.public_message(),
                "category": error.category(),
                "envCheck": diagnostics,
            });
            if state.config.environment.exposes_diagnostics() {
                body["details"] = error.detail().into();
            }
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
        }
    }
}

pub async fn contact_form_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        CONTACT_FORM_SCRIPT,
    )
}

/// Bare `OPTIONS` (no preflight headers) still answers 200 with no body.
pub async fn options() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn not_found(method: Method) -> axum::response::Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    ApiError::NotFound.into_response()
}
