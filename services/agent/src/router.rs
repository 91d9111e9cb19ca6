//! Axum Router Configuration

use crate::{state::AppState, ws::ws_handler};
use axum::{Router, routing::get};
use std::sync::Arc;

/// Creates the router for the session control endpoint.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/session", get(ws_handler))
        .with_state(app_state)
}
