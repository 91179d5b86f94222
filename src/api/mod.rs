//! API layer -- axum routes, handlers, and middleware.

pub mod error;
mod pages;
mod routes;
pub mod state;

use std::path::Path;

use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use self::state::AppState;

/// Build the application router: history API, board page, health check,
/// and static assets from `static_dir` for everything else.
pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .merge(pages::page_routes())
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
