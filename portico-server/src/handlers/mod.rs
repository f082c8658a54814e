//! REST request handlers
//!
//! Auxiliary REST endpoints served alongside the GraphQL endpoint. The
//! bootstrap merges this router after installing the policy and execution
//! middleware, so these routes sit behind the same origin gate.

pub mod health;

use axum::{routing::get, Router};

use crate::state::AppState;
pub use health::{health, ready, HealthResponse, ReadyResponse};

/// Assemble the auxiliary REST routes.
pub fn rest_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
}
