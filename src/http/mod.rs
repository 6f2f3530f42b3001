pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::http::state::AppState;

pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route_service("/player", ServeFile::new(static_dir.join("player.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .route("/files", get(routes::list_files))
        .route("/stream/{id}/playlist.m3u8", get(routes::playlist))
        .route("/stream/{id}/{segment}", get(routes::segment))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
