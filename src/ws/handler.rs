//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::response::{IntoResponse, Response};

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET {ROUTE_PATH}` — Upgrade HTTP connection to a player WebSocket.
///
/// A request that cannot be upgraded is logged and rejected; no player
/// is created for it.
pub async fn ws_handler(
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<AppState>,
) -> Response {
    let ws = match upgrade {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "websocket upgrade rejected");
            return rejection.into_response();
        }
    };

    let hub = state.hub;
    ws.on_failed_upgrade(|error| tracing::warn!(%error, "websocket upgrade failed"))
        .on_upgrade(move |socket| run_connection(socket, hub))
}
