//! Per-request context module
//!
//! Every GraphQL operation receives a fresh `RequestContext` carrying the
//! shared backing-store handles plus request identity. The context is the
//! contract resolver collaborators compile against; renaming its fields is
//! a breaking change for every resolver.

use std::sync::Arc;

use axum::http::request::Parts;

use crate::state::SharedConnections;

/// Caller identity attached by upstream middleware.
///
/// This gateway never performs authentication itself; whatever layer sits
/// in front of it (a trusted proxy, a session middleware) inserts an
/// `Identity` into the request extensions, and the context factory only
/// forwards the result.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Stable subject identifier of the authenticated caller
    pub subject: String,
}

/// The per-request bundle handed to the query-execution layer.
///
/// Created at dispatch time, dropped after the response is produced; never
/// reused across requests. It borrows nothing: the store handles are `Arc`
/// clones onto the single process-wide [`SharedConnections`], so contexts
/// neither own nor extend the lifetime management of the connections.
pub struct RequestContext {
    /// Key-value store handle (shared, never opened here)
    pub store_client: Arc<redis::Client>,
    /// Document store handle (shared, never opened here)
    pub data_source: Arc<mongodb::Client>,
    /// Metadata of the inbound transport request
    pub request: Parts,
    /// Identity forwarded from upstream, if any
    pub user: Option<Identity>,
}

/// Factory producing one [`RequestContext`] per inbound GraphQL operation.
#[derive(Clone)]
pub struct ContextFactory {
    connections: Arc<SharedConnections>,
}

impl ContextFactory {
    pub fn new(connections: Arc<SharedConnections>) -> Self {
        Self { connections }
    }

    /// Build a context for one request.
    ///
    /// Synchronous and side-effect free: no connection is opened, closed,
    /// or awaited here — bootstrap already established the handles.
    pub fn create(&self, request: &Parts) -> RequestContext {
        RequestContext {
            store_client: self.connections.store(),
            data_source: self.connections.documents(),
            user: request.extensions.get::<Identity>().cloned(),
            request: request.clone(),
        }
    }
}
