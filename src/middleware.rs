use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::net::SocketAddr;
use tracing::{error, info, warn};

use crate::error::RandomError;
use crate::key_generator::KeyGenerator;
use crate::rate_limiter::RateLimiter;

/// State shared by the rate limiting middleware
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: RateLimiter,
    pub keys: KeyGenerator,
}

fn peer_addr(request: &Request) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// Client a request is attributed to under the configured key strategy
fn client_ip(keys: &KeyGenerator, request: &Request) -> String {
    keys.client_id(request.headers(), peer_addr(request))
}

/// Reject clients that exceed their window and annotate every other
/// response with the client's remaining quota
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let key = state.keys.generate_key(request.headers(), peer_addr(&request));

    let status = match state.limiter.check(&key) {
        Ok(status) => status,
        Err(err) => return err.into_response(),
    };

    let mut response = if status.allowed {
        next.run(request).await
    } else {
        warn!(
            target: "randomizer::middleware",
            key = %key,
            limit = status.limit,
            reset = status.reset,
            "Rate limit exceeded"
        );
        RandomError::RateLimitExceeded.into_response()
    };

    status.write_headers(response.headers_mut());
    response
}

/// Logging middleware for request/response tracking
pub async fn logging_middleware(
    State(keys): State<KeyGenerator>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = client_ip(&keys, &request);

    info!(
        target: "randomizer::middleware",
        method = %method,
        uri = %uri,
        client_ip = %client_ip,
        "Incoming request"
    );

    let response = next.run(request).await;

    let status = response.status();
    info!(
        target: "randomizer::middleware",
        method = %method,
        uri = %uri,
        status = %status,
        "Request completed"
    );

    response
}

/// Turn a handler panic into a plain 500 response
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = err.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = err.downcast_ref::<&str>() {
        *message
    } else {
        "unknown panic payload"
    };

    error!(target: "randomizer::middleware", panic = %detail, "Handler panicked");

    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_handle_panic_with_str_payload() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Internal Server Error");
    }

    #[test]
    fn test_handle_panic_with_string_payload() {
        let response = handle_panic(Box::new(String::from("boom")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_peer_addr_from_connect_info() {
        let mut request = Request::new(axum::body::Body::empty());
        let addr: SocketAddr = "192.0.2.1:4000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(peer_addr(&request), Some(addr));
    }

    #[test]
    fn test_client_ip_follows_key_strategy() {
        use crate::key_generator::KeyStrategy;

        let mut request = Request::new(axum::body::Body::empty());
        request
            .headers_mut()
            .insert("x-forwarded-for", "10.9.8.7".parse().unwrap());
        let addr: SocketAddr = "192.0.2.1:4000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));

        let forwarded = KeyGenerator::new(KeyStrategy::ForwardedFor);
        assert_eq!(client_ip(&forwarded, &request), "10.9.8.7");

        let peer_only = KeyGenerator::new(KeyStrategy::PeerAddress);
        assert_eq!(client_ip(&peer_only, &request), "192.0.2.1");
    }

    #[test]
    fn test_peer_addr_missing() {
        let request = Request::new(axum::body::Body::empty());
        assert_eq!(peer_addr(&request), None);
    }
}
