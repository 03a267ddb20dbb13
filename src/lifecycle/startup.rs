//! Startup orchestration.
//!
//! # Responsibilities
//! - Start metrics exposition when enabled
//! - Bind the listener (fail fast: a bind error ends the process)
//! - Run the server until shutdown
//!
//! Logging is initialized by the binary before any of this runs, so the
//! startup steps themselves are logged.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::ProxyConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

/// Bring the proxy up with `config` and serve until a stop signal.
pub async fn run(config: ProxyConfig) -> Result<(), std::io::Error> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|e| {
            tracing::error!(
                bind_address = %config.listener.bind_address,
                error = %e,
                "Error starting proxy server"
            );
            e
        })?;

    tracing::info!(
        address = %listener.local_addr()?,
        "Starting proxy server"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await
}
