//! Shared Application State

use crate::config::Config;
use cadence_core::VoiceCatalog;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The catalog is fetched before the first session and never refreshed.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<VoiceCatalog>,
    pub config: Arc<Config>,
}
