//! GraphQL execution layer
//!
//! Schema construction and the axum handlers for the `/graphql` endpoint.
//! The resolvers here are a deliberately thin surface over the request
//! context; data access belongs to resolver collaborators, which receive
//! the shared store handles through [`RequestContext`].

use async_graphql::{
    http::GraphiQLSource, Context, EmptyMutation, EmptySubscription, Object, Schema, SimpleObject,
};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    http::request::Parts,
    response::{Html, IntoResponse},
};

use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::state::AppState;

pub type GatewaySchema = Schema<Query, EmptyMutation, EmptySubscription>;

/// Initialize the query-execution layer.
///
/// Kept asynchronous so the transport can sequence itself behind it: the
/// listener must never bind before this future resolves.
pub async fn init() -> Result<GatewaySchema, GatewayError> {
    Ok(Schema::build(Query, EmptyMutation, EmptySubscription).finish())
}

/// Root query type
pub struct Query;

#[Object]
impl Query {
    /// Name and version of the running gateway
    async fn service(&self) -> ServiceInfo {
        ServiceInfo {
            name: "portico-server",
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Subject of the authenticated caller, if upstream attached one
    async fn viewer(&self, ctx: &Context<'_>) -> Option<String> {
        let request = ctx.data_opt::<RequestContext>()?;
        request.user.as_ref().map(|identity| identity.subject.clone())
    }
}

#[derive(SimpleObject)]
pub struct ServiceInfo {
    name: &'static str,
    version: &'static str,
}

/// POST /graphql - execute a GraphQL operation
///
/// Runs after the CORS gate. Builds a fresh [`RequestContext`] for this
/// operation and injects it as schema data, where resolvers pick it up.
pub async fn graphql_handler(
    State(state): State<AppState>,
    parts: Parts,
    request: GraphQLRequest,
) -> GraphQLResponse {
    let ctx = state.context_factory.create(&parts);
    state
        .schema
        .execute(request.into_inner().data(ctx))
        .await
        .into()
}

/// GET /graphql - GraphiQL explorer for development
pub async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
