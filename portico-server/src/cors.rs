//! Cross-origin policy module
//!
//! The allow-list policy runs before any application route. A denied
//! origin receives an explicit 403 policy-violation response rather than
//! a silently dropped request, so browser callers can distinguish policy
//! rejections from server faults.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use tower_http::cors::CorsLayer;

use crate::error::ApiError;
use crate::state::AppState;

/// Outcome of evaluating one request's `Origin` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorsDecision {
    Allow,
    Deny,
}

/// Immutable origin allow-list, built once at bootstrap.
#[derive(Debug)]
pub struct CorsPolicy {
    allowed: Vec<String>,
}

impl CorsPolicy {
    pub fn new(allowed: Vec<String>) -> Self {
        Self { allowed }
    }

    /// Decide whether a request with the given `Origin` header may proceed.
    ///
    /// Requests without an `Origin` header (curl, mobile apps, server-side
    /// callers) are always allowed; that is a deliberate trust decision for
    /// non-browser clients, not an oversight. Present origins must match an
    /// allow-list entry exactly (case-sensitive, full string). An empty
    /// allow-list therefore denies every browser origin.
    pub fn evaluate(&self, origin: Option<&str>) -> CorsDecision {
        match origin {
            None => CorsDecision::Allow,
            Some(origin) if self.allowed.iter().any(|o| o == origin) => CorsDecision::Allow,
            Some(_) => CorsDecision::Deny,
        }
    }

    /// Build the response-header layer for the same allow-list.
    ///
    /// This only emits `Access-Control-*` headers for allowed origins;
    /// enforcement (the 403) lives in [`enforce`].
    pub fn layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .allowed
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
    }
}

/// Request gate enforcing the origin policy ahead of every route.
///
/// Installed around the fully assembled router so no endpoint can bypass it.
pub async fn enforce(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok());

    match state.cors.evaluate(origin) {
        CorsDecision::Allow => Ok(next.run(request).await),
        CorsDecision::Deny => Err(ApiError::cors_denied(origin.unwrap_or_default())),
    }
}
