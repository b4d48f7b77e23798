//! HTTP surface: the player WebSocket route plus a health probe.

pub mod system;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the complete router, mounting the WebSocket upgrade at the
/// hub's configured route path.
pub fn build_router(state: AppState) -> Router {
    let route_path = state.hub.config().route_path.clone();
    Router::new()
        .route(&route_path, get(ws_handler))
        .merge(system::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
