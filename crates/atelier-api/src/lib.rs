pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::logging;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        // Sessions
        .route(
            "/api/sessions",
            get(routes::sessions::list_sessions).post(handlers::stream::start_session),
        )
        .route(
            "/api/sessions/:session_id",
            get(routes::sessions::get_session)
                .delete(routes::sessions::delete_session)
                .patch(routes::sessions::rename_session),
        )
        .route(
            "/api/sessions/:session_id/messages",
            post(handlers::stream::continue_session),
        )
        // Generated artifact
        .route(
            "/api/sessions/:session_id/code",
            get(handlers::artifact::get_code),
        )
        .route(
            "/api/sessions/:session_id/code/raw",
            get(handlers::artifact::get_code_raw),
        )
        .route(
            "/api/sessions/:session_id/download",
            get(handlers::artifact::download_code),
        )
        .route(
            "/api/sessions/:session_id/preview",
            get(handlers::artifact::preview),
        );

    Router::new()
        .merge(api_routes)
        .layer(axum_middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(Duration::from_secs(300)))
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::DELETE,
                axum::http::Method::PATCH,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors.allow_origin(Any)
        } else {
            let parsed_origins: Vec<axum::http::HeaderValue> = config
                .cors
                .origins
                .iter()
                .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
                .collect();

            cors.allow_origin(parsed_origins)
        }
    } else {
        CorsLayer::permissive()
    }
}
