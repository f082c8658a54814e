//! Transport bootstrap and lifecycle module
//!
//! Owns the single listener and coordinates startup/shutdown ordering
//! between the query-execution layer and the raw socket. The lifecycle is
//! published as a [`Phase`] watch channel so operators and tests can
//! observe transitions.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::cors::CorsPolicy;
use crate::error::GatewayError;
use crate::graphql::{self, GatewaySchema};
use crate::routes;
use crate::state::{AppState, SharedConnections};

/// Process-wide transport lifecycle.
///
/// `Starting -> Listening` never happens before the execution layer has
/// completed its asynchronous initialization. `Listening -> Draining` is
/// triggered externally; during `Draining` the listener refuses new
/// connections while in-flight responses flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unstarted,
    Starting,
    Listening,
    Draining,
    Stopped,
}

/// Gateway bootstrap: wires the shared connections, origin policy,
/// execution layer, and collaborator routes onto one HTTP listener.
pub struct Gateway {
    config: Config,
    connections: Arc<SharedConnections>,
    rest: Router<AppState>,
    phase_tx: Arc<watch::Sender<Phase>>,
    phase_rx: watch::Receiver<Phase>,
}

impl Gateway {
    pub fn new(config: Config, connections: Arc<SharedConnections>) -> Self {
        let (phase_tx, phase_rx) = watch::channel(Phase::Unstarted);
        Self {
            config,
            connections,
            rest: Router::new(),
            phase_tx: Arc::new(phase_tx),
            phase_rx,
        }
    }

    /// Merge additional collaborator REST routes.
    ///
    /// Routes merged here are mounted behind the same policy and execution
    /// middleware as everything else.
    pub fn with_routes(mut self, routes: Router<AppState>) -> Self {
        self.rest = self.rest.merge(routes);
        self
    }

    /// Observe lifecycle transitions.
    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase_rx.clone()
    }

    /// Start the gateway with the default execution layer.
    pub async fn start(self) -> Result<RunningGateway, GatewayError> {
        let init = graphql::init();
        self.start_with_schema(init).await
    }

    /// Start the gateway, initializing the execution layer from `init`.
    ///
    /// Separated from [`Gateway::start`] so tests can inject a slow or
    /// failing initialization and observe the ordering guarantee.
    pub async fn start_with_schema<F>(self, init: F) -> Result<RunningGateway, GatewayError>
    where
        F: Future<Output = Result<GatewaySchema, GatewayError>>,
    {
        let Gateway {
            config,
            connections,
            rest,
            phase_tx,
            phase_rx,
        } = self;

        let _ = phase_tx.send(Phase::Starting);

        // The execution layer must finish its asynchronous initialization
        // before the socket binds; accepting requests the schema cannot
        // yet execute is the failure mode this ordering forbids.
        let schema = init.await?;

        let cors = Arc::new(CorsPolicy::new(config.allowed_origins.clone()));
        let state = AppState::new(connections, cors, schema);
        let app = routes::build_router_with(state, rest, &config);

        let addr = config.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind { addr, source })?;
        let local_addr = listener.local_addr().map_err(GatewayError::Serve)?;

        let _ = phase_tx.send(Phase::Listening);
        tracing::info!(
            address = %local_addr,
            "gateway ready at http://{local_addr}/graphql"
        );

        let shutdown = Arc::new(Notify::new());
        let drain_signal = {
            let shutdown = Arc::clone(&shutdown);
            let phase_tx = Arc::clone(&phase_tx);
            async move {
                shutdown.notified().await;
                tracing::info!("shutdown requested, draining in-flight requests");
                let _ = phase_tx.send(Phase::Draining);
            }
        };

        let task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(drain_signal)
                .await
                .map_err(GatewayError::Serve);
            let _ = phase_tx.send(Phase::Stopped);
            tracing::info!("gateway stopped");
            result
        });

        Ok(RunningGateway {
            local_addr,
            shutdown,
            phase: phase_rx,
            task,
        })
    }
}

/// Handle for requesting a drain from outside the serve task.
#[derive(Clone)]
pub struct ShutdownHandle(Arc<Notify>);

impl ShutdownHandle {
    /// Stop accepting new connections and drain in-flight requests.
    pub fn shutdown(&self) {
        self.0.notify_one();
    }
}

/// A gateway that has reached `Listening`.
pub struct RunningGateway {
    local_addr: SocketAddr,
    shutdown: Arc<Notify>,
    phase: watch::Receiver<Phase>,
    task: JoinHandle<Result<(), GatewayError>>,
}

impl RunningGateway {
    /// The bound address; useful when the configured port was 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Observe lifecycle transitions.
    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase.clone()
    }

    /// Handle for triggering a drain from another task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown))
    }

    /// Request a drain: the listener closes, in-flight requests complete.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Wait until the gateway has fully stopped.
    pub async fn finished(self) -> Result<(), GatewayError> {
        self.task.await?
    }
}
