//! Client identification and security response headers.
//!
//! # Responsibilities
//! - Derive the rate-limit identifier from `X-Forwarded-For` or the peer
//! - Add hardening response headers
//!
//! # Trust
//! `X-Forwarded-For` is client-controlled unless a proxy in front of the
//! service overwrites it. Deployments that are reachable directly should
//! set `rate_limit.trust_forwarded_for = false`, which keys clients by the
//! transport peer address instead.

use std::net::SocketAddr;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Used when neither a trusted header nor a peer address is available.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolve the identifier used to key rate-limit state.
pub fn client_identifier(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get(&X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(client) = forwarded {
            return client.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

const SECURITY_HEADERS: [(HeaderName, &str); 5] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
    (header::REFERRER_POLICY, "no-referrer"),
    (header::X_XSS_PROTECTION, "0"),
    (header::STRICT_TRANSPORT_SECURITY, "max-age=15552000; includeSubDomains"),
];

/// Wrap `router` with hardening headers. Handlers can still override them.
pub fn with_security_headers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SECURITY_HEADERS
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(
                name,
                HeaderValue::from_static(value),
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(forwarded: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(X_FORWARDED_FOR, HeaderValue::from_str(forwarded).unwrap());
        map
    }

    fn peer() -> Option<SocketAddr> {
        Some("192.0.2.7:51234".parse().unwrap())
    }

    #[test]
    fn test_forwarded_for_first_hop() {
        let id = client_identifier(&headers("203.0.113.9, 10.0.0.1"), peer(), true);
        assert_eq!(id, "203.0.113.9");
    }

    #[test]
    fn test_untrusted_header_ignored() {
        let id = client_identifier(&headers("203.0.113.9"), peer(), false);
        assert_eq!(id, "192.0.2.7");
    }

    #[test]
    fn test_falls_back_to_peer() {
        assert_eq!(client_identifier(&HeaderMap::new(), peer(), true), "192.0.2.7");
        assert_eq!(client_identifier(&headers(" , x"), peer(), true), "192.0.2.7");
    }

    #[test]
    fn test_unknown_without_peer() {
        assert_eq!(client_identifier(&HeaderMap::new(), None, true), UNKNOWN_CLIENT);
    }
}
