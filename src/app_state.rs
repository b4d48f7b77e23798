//! Shared application state injected into all Axum handlers.

use crate::service::Hub;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Handle to the hub and its conductor.
    pub hub: Hub,
}
