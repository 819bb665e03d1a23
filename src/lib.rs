//! # event-hub
//!
//! Real-time WebSocket fan-out hub. Clients open a persistent connection,
//! subscribe to named topics ("events") inside an optional namespace, and
//! receive whatever other clients publish to those topics.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket)
//!     │
//!     ├── Upgrade handler + receive loop (ws/)
//!     ├── ActionRouter (ws/)
//!     │
//!     ├── ConnectionRegistry ── broadcast (domain/)
//!     ├── Connection + SubscriptionSet (domain/)
//!     │
//!     └── LivenessReaper (domain/)
//! ```

pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod ws;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Builds the complete application with the upgrade endpoint at `ws_path`.
pub fn build_app(state: AppState, ws_path: &str) -> Router {
    ws::routes(ws_path)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
