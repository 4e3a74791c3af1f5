//! HTTP surface: hadith search, AI explanation and hadith chat.

pub mod config;
pub mod error;
pub mod limiter;
pub mod metrics;
pub mod routes;
pub mod state;

use axum::http::{HeaderName, HeaderValue, Method, Request, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Router, body::Body};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{Instrument, info, warn};

pub use config::AppConfig;
pub use state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.server.public_api_base.as_deref());

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/search", get(routes::search))
        .route("/api/explain", post(routes::explain))
        .route("/api/chat", post(routes::chat))
        .route("/api/metrics", get(routes::metrics))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

async fn request_id(req: Request<Body>, next: Next) -> Response {
    let id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("request", request_id = %id, method = %req.method(), path = %req.uri().path());
    async move {
        let mut response = next.run(req).await;
        if let Ok(value) = HeaderValue::from_str(&id) {
            response
                .headers_mut()
                .insert(HeaderName::from_static("x-request-id"), value);
        }
        response
    }
    .instrument(span)
    .await
}

/// Any origin unless a public base URL pins it to one.
fn cors_layer(public_api_base: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    match public_api_base.and_then(origin_of) {
        Some(origin) => match HeaderValue::from_str(&origin) {
            Ok(value) => {
                info!(%origin, "CORS restricted");
                base.allow_origin(value)
            }
            Err(_) => {
                warn!(%origin, "Unusable CORS origin, allowing any");
                base.allow_origin(Any)
            }
        },
        None => base.allow_origin(Any),
    }
}

/// `https://host:port/some/path` -> `https://host:port`
fn origin_of(url: &str) -> Option<String> {
    let url = url.trim();
    let (scheme, rest) = url.split_once("://")?;
    let host = rest.split('/').next().unwrap_or_default();
    if scheme.is_empty() || host.is_empty() {
        return None;
    }
    Some(format!("{}://{}", scheme, host))
}

/// Spawn the periodic sweep of expired limiter entries and cached editions.
pub fn spawn_pruner(state: Arc<AppState>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // First tick fires immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let report = state.prune_expired();
            info!(
                rate_limit_entries = report.rate_limit_entries,
                off_topic_entries = report.off_topic_entries,
                cached_editions = report.cached_editions,
                "Pruned expired entries"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_of() {
        assert_eq!(
            origin_of("https://bayyinah.example.com/api/"),
            Some("https://bayyinah.example.com".to_string())
        );
        assert_eq!(
            origin_of("http://localhost:3000"),
            Some("http://localhost:3000".to_string())
        );
        assert_eq!(origin_of("not a url"), None);
        assert_eq!(origin_of("https://"), None);
    }
}
