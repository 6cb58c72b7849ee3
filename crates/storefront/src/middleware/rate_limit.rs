//! Rate limiting of the authentication and contact endpoints.
//!
//! Uses governor through `tower_governor`, keyed by client IP.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Client IP used as the rate limit key.
///
/// Proxy headers are only honoured when `trust_proxy` is set; otherwise any
/// caller could pick a fresh key per request. Untrusted requests are keyed
/// by the peer address.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClientIpKeyExtractor {
    pub trust_proxy: bool,
}

fn peer_ip<T>(req: &Request<T>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

fn header_ip<T>(req: &Request<T>, name: &str) -> Option<IpAddr> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let forwarded = if self.trust_proxy {
            header_ip(req, "x-forwarded-for").or_else(|| header_ip(req, "x-real-ip"))
        } else {
            None
        };
        forwarded
            .or_else(|| peer_ip(req))
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter for sign-in, sign-up, password reset and contact:
/// one token every 6 seconds, burst of 5.
///
/// Set `trust_proxy` only behind a reverse proxy that overwrites
/// `X-Forwarded-For`.
///
/// # Panics
///
/// Never panics: `per_second(6)` and `burst_size(5)` are always accepted by
/// `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter(trust_proxy: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor { trust_proxy })
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request() -> axum::http::request::Builder {
        Request::builder().uri("/auth/login")
    }

    const TRUSTED: ClientIpKeyExtractor = ClientIpKeyExtractor { trust_proxy: true };
    const DIRECT: ClientIpKeyExtractor = ClientIpKeyExtractor { trust_proxy: false };

    fn from_peer(builder: axum::http::request::Builder) -> Request<()> {
        let mut req = builder.body(()).unwrap_or_default();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        req
    }

    #[test]
    fn test_trusted_proxy_forwarded_for_takes_first_hop() {
        let req = from_peer(request().header("x-forwarded-for", "203.0.113.7, 10.0.0.1"));
        assert_eq!(TRUSTED.extract(&req).ok(), "203.0.113.7".parse().ok());
    }

    #[test]
    fn test_trusted_proxy_reads_real_ip() {
        let req = from_peer(request().header("x-real-ip", "198.51.100.4"));
        assert_eq!(TRUSTED.extract(&req).ok(), "198.51.100.4".parse().ok());
    }

    #[test]
    fn test_forwarded_for_ignored_without_trusted_proxy() {
        let req = from_peer(
            request()
                .header("x-forwarded-for", "203.0.113.7")
                .header("x-real-ip", "198.51.100.4"),
        );
        assert_eq!(DIRECT.extract(&req).ok(), "192.0.2.1".parse().ok());
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let req = from_peer(request());
        assert_eq!(TRUSTED.extract(&req).ok(), "192.0.2.1".parse().ok());
        assert_eq!(DIRECT.extract(&req).ok(), "192.0.2.1".parse().ok());
    }

    #[test]
    fn test_no_ip_is_an_error() {
        let req = request()
            .header("x-forwarded-for", "203.0.113.7")
            .body(())
            .unwrap_or_default();
        assert!(DIRECT.extract(&req).is_err());
    }
}
