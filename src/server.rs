use axum::http::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, ORIGIN, RETRY_AFTER};
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::dictionaries::Dictionaries;
use crate::handlers::{
    random_dice, random_float, random_int, random_nanoid, random_ulid, random_uuid, random_word,
    AppState,
};
use crate::key_generator::KeyGenerator;
use crate::middleware::{handle_panic, logging_middleware, rate_limit_middleware, RateLimitState};
use crate::rate_limiter::RateLimiter;
use crate::response::{X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET};

pub struct Server {
    app: Router,
    config: Config,
    limiter: RateLimiter,
}

impl Server {
    pub fn new(config: Config) -> Self {
        let limiter = RateLimiter::new(config.rate_limit_max, config.rate_limit_window());
        let app = build_app(&config, AppState::new(Dictionaries::bundled()), limiter.clone());

        Self { app, config, limiter }
    }

    pub async fn run(self) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        tracing::info!("Randomizer server listening on {}", self.config.bind_addr);
        tracing::info!(
            "Rate limit: {} requests per {} seconds",
            self.config.rate_limit_max,
            self.config.rate_limit_window_secs
        );
        tracing::info!("Serving static assets from {}", self.config.static_root().display());

        let cleanup = spawn_cleanup(self.limiter.clone(), self.config.cleanup_interval());

        // Run server with graceful shutdown
        let result = axum::serve(
            listener,
            self.app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await;

        cleanup.abort();
        result
    }
}

/// Build the full application with the bundled dictionaries
pub fn create_app(config: &Config) -> Router {
    let limiter = RateLimiter::new(config.rate_limit_max, config.rate_limit_window());
    build_app(config, AppState::new(Dictionaries::bundled()), limiter)
}

/// Build the application around explicit state and limiter
pub fn build_app(config: &Config, state: AppState, limiter: RateLimiter) -> Router {
    let cache_control = HeaderValue::from_str(&format!(
        "public, max-age={}",
        config.static_max_age_secs
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("public, max-age=60"));

    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(CACHE_CONTROL, cache_control))
        .service(ServeDir::new(config.static_root()));

    let app = Router::new()
        .nest("/v1", api_routes())
        .fallback_service(static_files)
        .with_state(state);

    apply_middleware(app, limiter, KeyGenerator::new(config.key_strategy))
}

/// Random value endpoints, mounted under `/v1`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/int", get(random_int))
        .route("/float", get(random_float))
        .route("/word", get(random_word))
        .route("/dice", get(random_dice))
        .route("/ulid", get(random_ulid))
        .route("/nanoid", get(random_nanoid))
        .route("/uuid", get(random_uuid))
}

/// Wrap a router with tracing, panic recovery, CORS, request logging and
/// rate limiting, outermost first
pub fn apply_middleware(router: Router, limiter: RateLimiter, keys: KeyGenerator) -> Router {
    let rate_limit = RateLimitState { limiter, keys };

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(cors_layer())
            .layer(middleware::from_fn_with_state(keys, logging_middleware))
            .layer(middleware::from_fn_with_state(rate_limit, rate_limit_middleware)),
    )
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::HEAD,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([ORIGIN, CONTENT_TYPE, ACCEPT])
        .expose_headers([
            X_RATELIMIT_LIMIT,
            X_RATELIMIT_REMAINING,
            X_RATELIMIT_RESET,
            RETRY_AFTER,
        ])
}

/// Periodically evict idle rate limit windows
fn spawn_cleanup(limiter: RateLimiter, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match limiter.cleanup_expired() {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Evicted idle rate limit windows"),
                Err(err) => tracing::warn!(error = %err, "Rate limit cleanup failed"),
            }
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cleanup_task_evicts_idle_windows() {
        let limiter = RateLimiter::new(10, Duration::from_millis(10));
        limiter.check("idle").unwrap();

        let handle = spawn_cleanup(limiter.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(limiter.is_empty().unwrap());
    }
}
