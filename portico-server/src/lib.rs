//! Portico Server Library - GraphQL + REST gateway components
//!
//! One process, one HTTP listener: a GraphQL endpoint at `/graphql` plus
//! auxiliary REST routes, backed by a key-value store handle and a
//! document store handle shared across all requests. This library exposes
//! the gateway components for use in integration tests; the binary uses
//! these same components.

pub mod config;
pub mod context;
pub mod cors;
pub mod error;
pub mod graphql;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use config::Config;
pub use context::{ContextFactory, Identity, RequestContext};
pub use cors::{CorsDecision, CorsPolicy};
pub use error::{ApiError, GatewayError};
pub use graphql::{GatewaySchema, Query};
pub use handlers::rest_routes;
pub use routes::{build_router, build_router_with};
pub use server::{Gateway, Phase, RunningGateway, ShutdownHandle};
pub use state::{AppState, SharedConnections};
