//! Key generation utilities for rate limiting.

use axum::http::HeaderMap;
use clap::ValueEnum;
use std::net::SocketAddr;

/// Strategy for deriving the client a request is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum KeyStrategy {
    /// First `X-Forwarded-For` entry, then `X-Real-IP`, then the peer address
    #[default]
    ForwardedFor,
    /// Only the peer socket address; proxy headers are ignored
    PeerAddress,
}

/// Generates rate limit keys from request metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyGenerator {
    strategy: KeyStrategy,
}

impl KeyGenerator {
    pub fn new(strategy: KeyStrategy) -> Self {
        Self { strategy }
    }

    /// Generate the rate limit key for a request
    pub fn generate_key(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        format!("ratelimit:{}", self.client_id(headers, peer))
    }

    /// Identify the client behind a request
    pub fn client_id(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        let from_headers = match self.strategy {
            KeyStrategy::ForwardedFor => Self::extract_forwarded_ip(headers),
            KeyStrategy::PeerAddress => None,
        };

        from_headers
            .or_else(|| peer.map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Extract client IP from proxy headers
    pub fn extract_forwarded_ip(headers: &HeaderMap) -> Option<String> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        header("x-forwarded-for")
            .and_then(|xff| xff.split(',').next().map(str::trim))
            .filter(|ip| !ip.is_empty())
            .or_else(|| header("x-real-ip"))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("203.0.113.9:51234".parse().unwrap())
    }

    fn create_test_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("192.168.1.1, 10.0.0.1"));
        headers
    }

    #[test]
    fn test_forwarded_for_strategy() {
        let generator = KeyGenerator::new(KeyStrategy::ForwardedFor);
        let key = generator.generate_key(&create_test_headers(), peer());
        assert_eq!(key, "ratelimit:192.168.1.1");
    }

    #[test]
    fn test_real_ip_header() {
        let generator = KeyGenerator::default();
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.7"));
        assert_eq!(generator.client_id(&headers, peer()), "198.51.100.7");
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let generator = KeyGenerator::default();
        assert_eq!(generator.client_id(&HeaderMap::new(), peer()), "203.0.113.9");
    }

    #[test]
    fn test_peer_address_strategy_ignores_headers() {
        let generator = KeyGenerator::new(KeyStrategy::PeerAddress);
        let key = generator.generate_key(&create_test_headers(), peer());
        assert_eq!(key, "ratelimit:203.0.113.9");
    }

    #[test]
    fn test_unknown_client() {
        let generator = KeyGenerator::default();
        assert_eq!(generator.client_id(&HeaderMap::new(), None), "unknown");
    }
}
