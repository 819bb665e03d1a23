//! WebSocket layer: upgrade endpoint, receive loop and action routing.
//!
//! The single endpoint (default `/ws/v1`) accepts a persistent duplex
//! connection per client; every frame is a JSON `{action, data}` envelope.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod router;
pub mod socket;

use axum::Router;
use axum::routing::get;

use crate::app_state::AppState;

pub use router::ActionRouter;

/// Builds the router exposing the upgrade endpoint at `path`.
pub fn routes(path: &str) -> Router<AppState> {
    Router::new().route(path, get(handler::ws_handler))
}
