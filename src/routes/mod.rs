pub mod chat;
pub mod dashboard;
pub mod emissions;
pub mod health;
pub mod optimize;
pub mod recommendations;

use crate::middleware;
use crate::state::AppState;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("apikey"),
            HeaderName::from_static("x-client-info"),
        ])
        .allow_credentials(false)
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    // Everything under /api/v1 needs a bearer token
    let api_routes = Router::new()
        .route("/api/v1/emissions", post(emissions::calculate))
        .route("/api/v1/calculations", get(emissions::list_calculations))
        .route("/api/v1/dashboard", get(dashboard::stats))
        .route("/api/v1/coefficients", get(dashboard::coefficients))
        .route("/api/v1/optimize", post(optimize::optimize_prompt))
        .route("/api/v1/recommendations", post(recommendations::recommend))
        .route("/api/v1/chat", post(chat::chat))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_user,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(api_routes)
        // Middleware layers (applied bottom-up)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(axum::middleware::from_fn(
            middleware::security_headers::security_headers,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
