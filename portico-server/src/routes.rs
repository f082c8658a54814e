//! Router configuration module
//!
//! Assembles all routes and middleware layers into the application router.
//! Ordering obligation: the CORS gate and response-header layer wrap the
//! fully merged router, so neither the GraphQL endpoint nor any auxiliary
//! REST route can bypass the origin policy.

use axum::{
    middleware,
    routing::get,
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::cors;
use crate::graphql;
use crate::handlers;
use crate::state::AppState;

/// Create the application router with the default REST routes and config
/// (primarily for tests; the bootstrap passes its own pieces).
pub fn build_router(state: AppState) -> Router {
    build_router_with(state, handlers::rest_routes(), &Config::default())
}

/// Create the application router from the given state, collaborator REST
/// routes, and configuration.
pub fn build_router_with(state: AppState, rest: Router<AppState>, config: &Config) -> Router {
    let cors_headers = state.cors.layer();
    let body_limit = RequestBodyLimitLayer::new(config.body_limit_mb * 1024 * 1024);

    // Layers apply bottom-up in axum: request ids are assigned first, the
    // trace span opens next, then the CORS header layer answers preflight,
    // and the policy gate rejects disallowed origins before any handler.
    Router::new()
        .route(
            "/graphql",
            get(graphql::graphiql).post(graphql::graphql_handler),
        )
        .merge(rest)
        .layer(middleware::from_fn_with_state(state.clone(), cors::enforce))
        .layer(cors_headers)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
