//! Shared application state injected into the upgrade handler.

use std::sync::Arc;

use crate::domain::{ConnectionRegistry, LivenessReaper};
use crate::ws::ActionRouter;

/// State shared by every connection task via Axum's `State` extractor.
///
/// All three parts point at the same [`ConnectionRegistry`]; independent
/// hubs (e.g. in tests) simply build independent states.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Directory of live connections.
    pub registry: Arc<ConnectionRegistry>,
    /// Dispatcher for inbound actions.
    pub router: ActionRouter,
    /// Evicts dead peers.
    pub reaper: LivenessReaper,
}

impl AppState {
    /// Wires a router and a reaper around `registry`.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            router: ActionRouter::new(Arc::clone(&registry)),
            reaper: LivenessReaper::new(Arc::clone(&registry)),
            registry,
        }
    }
}
