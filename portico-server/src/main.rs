//! Portico Server - GraphQL + REST gateway binary
//!
//! Opens the shared backing-store handles, starts the gateway, and drains
//! in-flight requests on SIGTERM/SIGINT before exiting.

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use portico_server::handlers::rest_routes;
use portico_server::{Config, Gateway, GatewayError, SharedConnections};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Startup faults abort before the listener ever accepts; there
            // is no partial-availability state.
            tracing::error!(error = %err, "gateway failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), GatewayError> {
    let config = Config::from_env();

    let connections = Arc::new(SharedConnections::connect(&config).await?);

    let gateway = Gateway::new(config, connections).with_routes(rest_routes());
    let running = gateway.start().await?;

    let handle = running.shutdown_handle();
    tokio::spawn(async move {
        if let Err(err) = shutdown_signal().await {
            tracing::warn!(error = %err, "shutdown signal handler failed");
        }
        handle.shutdown();
    });

    running.finished().await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }
    Ok(())
}
