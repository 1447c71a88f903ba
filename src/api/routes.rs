//! API Routes
//!
//! Configures the Axum router with all proxy endpoints.

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use super::handlers::{
    clear_cache_handler, detail_handler, handshake_handler, health_handler, image_handler,
    latest_handler, recommendations_handler, refresh_handler, search_handler, stats_handler,
    stream_cleanup_handler, stream_issue_handler, stream_resolve_handler, trending_handler,
    validate_handler, AppState,
};

// == Router ==
/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: any origin unless `CORS_ORIGINS` lists specific ones
/// - Tracing: logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/content/image", get(image_handler))
        .route("/api/content/latest", get(latest_handler))
        .route("/api/content/trending", get(trending_handler))
        .route("/api/content/search", get(search_handler))
        .route("/api/content/detail/:id", get(detail_handler))
        .route("/api/content/recommendations", get(recommendations_handler))
        .route("/api/content/clear-cache", get(clear_cache_handler))
        .route("/api/stream/episode/:episode_id", get(stream_issue_handler))
        .route("/api/stream/stream/:stream_id", get(stream_resolve_handler))
        .route("/api/stream/cleanup", get(stream_cleanup_handler))
        .route("/api/client/handshake", post(handshake_handler))
        .route("/api/client/validate", post(validate_handler))
        .route("/api/client/refresh", post(refresh_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// == CORS ==
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}
