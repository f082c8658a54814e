//! Application state module
//!
//! Defines the process-wide backing-store handles and the shared state
//! accessible across all request handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::context::ContextFactory;
use crate::cors::CorsPolicy;
use crate::error::GatewayError;
use crate::graphql::GatewaySchema;

/// The pair of backing-store handles shared by every request.
///
/// Opened exactly once at bootstrap and owned for the process lifetime.
/// Both clients parse their connection string without contacting the
/// server; actual connections are established lazily on first use, so
/// constructing this never blocks startup on store reachability.
///
/// Fields are private on purpose: requests receive `Arc` clones through
/// the accessors and can never replace the underlying handles.
pub struct SharedConnections {
    store: Arc<redis::Client>,
    documents: Arc<mongodb::Client>,
}

impl SharedConnections {
    /// Open both store handles from the configured connection strings.
    ///
    /// Fails only on malformed connection strings, which is startup-fatal.
    pub async fn connect(config: &Config) -> Result<Self, GatewayError> {
        let store = redis::Client::open(config.redis_url.as_str())?;
        let documents = mongodb::Client::with_uri_str(&config.mongodb_url).await?;

        Ok(Self {
            store: Arc::new(store),
            documents: Arc::new(documents),
        })
    }

    /// Handle to the key-value store client
    pub fn store(&self) -> Arc<redis::Client> {
        Arc::clone(&self.store)
    }

    /// Handle to the document store client
    pub fn documents(&self) -> Arc<mongodb::Client> {
        Arc::clone(&self.documents)
    }
}

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// The single process-wide pair of backing-store handles
    pub connections: Arc<SharedConnections>,
    /// Immutable cross-origin policy built from the configured allow-list
    pub cors: Arc<CorsPolicy>,
    /// The initialized query-execution layer
    pub schema: GatewaySchema,
    /// Factory producing one `RequestContext` per GraphQL operation
    pub context_factory: ContextFactory,
}

impl AppState {
    pub fn new(
        connections: Arc<SharedConnections>,
        cors: Arc<CorsPolicy>,
        schema: GatewaySchema,
    ) -> Self {
        let context_factory = ContextFactory::new(Arc::clone(&connections));
        Self {
            connections,
            cors,
            schema,
            context_factory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_is_lazy_for_unreachable_stores() {
        // Nothing listens on these ports; handle construction must still
        // succeed because neither client dials at parse time.
        let config = Config {
            redis_url: "redis://127.0.0.1:1".to_string(),
            mongodb_url: "mongodb://127.0.0.1:1".to_string(),
            ..Config::default()
        };

        let connections = SharedConnections::connect(&config)
            .await
            .expect("lazy handles must open without reachable stores");

        // Accessors hand out the same underlying instances.
        assert!(Arc::ptr_eq(&connections.store(), &connections.store()));
        assert!(Arc::ptr_eq(&connections.documents(), &connections.documents()));
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_connection_string() {
        let config = Config {
            redis_url: "not-a-redis-url".to_string(),
            ..Config::default()
        };

        let result = SharedConnections::connect(&config).await;
        assert!(matches!(result, Err(GatewayError::KeyValueStore(_))));
    }
}
