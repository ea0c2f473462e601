use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::routes;
use crate::state::AppState;
use crate::ws;

/// Build the Axum application router.
pub fn create_app(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/api/ingest", post(routes::ingest::ingest))
        .route("/api/retrieve", post(routes::retrieve::retrieve))
        .route("/api/jobs", get(routes::jobs::list_jobs))
        .route("/api/jobs/{id}", get(routes::jobs::get_job))
        .route("/api/jobs/{id}", delete(routes::jobs::delete_job))
        .route("/api/sources/{id}", delete(routes::sources::delete_source));

    let ws_route = Router::new().route("/ws/{job_id}", get(ws::ws_handler));

    let static_service = ServeDir::new(&state.static_dir);

    let frontend_dir = std::env::current_dir()
        .unwrap_or_default()
        .join("frontend")
        .join("out");
    let spa_service = ServeDir::new(&frontend_dir)
        .not_found_service(ServeFile::new(frontend_dir.join("index.html")));

    Router::new()
        .merge(api_routes)
        .merge(ws_route)
        .nest_service("/static", static_service)
        .fallback_service(spa_service)
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        .with_state(state)
}
