//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (CORS, tracing, request ID, timeout, body limit)
//! - Bind the server to a listener and drain on shutdown
//! - Run the rate-limit sweeper alongside the server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method, Request};
use axum::routing::{get, post, MethodRouter};
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, CorsConfig};
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer, X_REQUEST_ID};
use crate::http::response::json_timeout;
use crate::lifecycle::shutdown;
use crate::mail::MailDispatcher;
use crate::security::{with_security_headers, RateLimiter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub limiter: RateLimiter,
    pub dispatcher: Arc<MailDispatcher>,
}

/// HTTP server for the contact API.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a server that delivers through the configured SMTP provider.
    pub fn new(config: AppConfig) -> Self {
        let dispatcher = MailDispatcher::from_config(&config.mail);
        Self::with_dispatcher(config, dispatcher)
    }

    /// Create a server around an already-built dispatcher.
    pub fn with_dispatcher(config: AppConfig, dispatcher: MailDispatcher) -> Self {
        let state = AppState {
            limiter: RateLimiter::new(&config.rate_limit),
            dispatcher: Arc::new(dispatcher),
            config: Arc::new(config),
        };
        let router = build_router(state.clone());
        Self { router, state }
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let rate_limit = &self.state.config.rate_limit;
        if rate_limit.enabled {
            let sweeper = self.state.limiter.clone();
            let interval = Duration::from_secs(rate_limit.sweep_interval_secs);
            tokio::spawn(sweeper.run_sweeper(interval, shutdown.resubscribe()));
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn submit_route() -> MethodRouter<AppState> {
    post(handlers::send_email)
        .options(handlers::options)
        .fallback(handlers::method_not_allowed)
}

fn read_route(handler: MethodRouter<AppState>) -> MethodRouter<AppState> {
    handler.options(handlers::options).fallback(handlers::not_found)
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        .route("/health", read_route(get(handlers::health)))
        .route("/api/health", read_route(get(handlers::health)))
        .route("/api/hello", read_route(get(handlers::hello)))
        .route("/api/test-email", read_route(get(handlers::test_email)))
        .route("/js/contact-form.js", read_route(get(handlers::contact_form_script)))
        .route("/send-email", submit_route())
        .route("/api/send-email", submit_route())
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.security.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(middleware::map_response(json_timeout))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request_id(request.headers()),
            )
        }))
        .layer(propagate_request_id_layer())
        .layer(set_request_id_layer())
        .layer(cors_layer(&config.cors));

    if config.security.enable_headers {
        with_security_headers(router)
    } else {
        router
    }
}

/// CORS policy for the browser form.
///
/// Any origin when none are listed (or `*` is); credentials only with an
/// explicit list.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, X_REQUEST_ID])
        .max_age(Duration::from_secs(86_400));

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(origins)).allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use futures_util::future::BoxFuture;
    use tower::ServiceExt;

    use crate::mail::{DispatchError, MailMessage, MailSettings, MailTransport};

    fn server(config: AppConfig) -> HttpServer {
        HttpServer::new(config)
    }

    async fn call(router: Router, request: Request<Body>) -> axum::response::Response {
        router.oneshot(request).await.unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_explicit_origin_list() {
        let mut config = AppConfig::default();
        config.cors.allowed_origins = vec!["https://portfolio.example".into()];
        let router = server(config).router();

        let preflight = |origin: &str| {
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/send-email")
                .header(header::ORIGIN, origin)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap()
        };

        let allowed = call(router.clone(), preflight("https://portfolio.example")).await;
        assert_eq!(allowed.status(), StatusCode::OK);
        assert_eq!(
            allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://portfolio.example"
        );
        assert_eq!(allowed.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

        let other = call(router, preflight("https://evil.example")).await;
        assert!(!other.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_security_headers_toggle() {
        let request = || Request::builder().uri("/health").body(Body::empty()).unwrap();

        let on = call(server(AppConfig::default()).router(), request()).await;
        assert_eq!(on.headers()[header::X_FRAME_OPTIONS], "SAMEORIGIN");

        let mut config = AppConfig::default();
        config.security.enable_headers = false;
        let off = call(server(config).router(), request()).await;
        assert_eq!(off.status(), StatusCode::OK);
        assert!(!off.headers().contains_key(header::X_FRAME_OPTIONS));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mut config = AppConfig::default();
        config.security.max_body_size = 16;
        let router = server(config).router();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/send-email")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(vec![b' '; 1024]))
            .unwrap();
        let response = call(router, request).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"success": false, "error": "request body too large"})
        );
    }

    struct StalledTransport;

    impl MailTransport for StalledTransport {
        fn verify(&self) -> BoxFuture<'_, Result<(), DispatchError>> {
            Box::pin(std::future::pending())
        }

        fn send<'a>(&'a self, _: &'a MailMessage) -> BoxFuture<'a, Result<(), DispatchError>> {
            Box::pin(std::future::pending())
        }
    }

    #[tokio::test]
    async fn test_request_timeout_is_json() {
        let mut config = AppConfig::default();
        config.timeouts.request_secs = 1;
        config.mail.timeout_secs = 30;
        config.mail.user = Some("bot@gmail.com".into());
        config.mail.password = Some("app-password".into());
        config.mail.to = Some("owner@example.com".into());

        let settings = MailSettings::from_config(&config.mail).unwrap();
        let dispatcher = MailDispatcher::with_transport(&config.mail, settings, Arc::new(StalledTransport));
        let router = HttpServer::with_dispatcher(config, dispatcher).router();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/send-email")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "198.51.100.20")
            .body(Body::from(
                r#"{"nombre":"Jordan","email":"jordan@example.org","mensaje":"Waiting on a stalled relay."}"#,
            ))
            .unwrap();
        let response = call(router, request).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"success": false, "error": "request timed out"})
        );
    }

    #[tokio::test]
    async fn test_request_id_preserved() {
        let request = Request::builder()
            .uri("/api/health")
            .header(X_REQUEST_ID, "abc-123")
            .body(Body::empty())
            .unwrap();
        let response = call(server(AppConfig::default()).router(), request).await;
        assert_eq!(response.headers()[X_REQUEST_ID], "abc-123");
    }
}
