//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the single proxy handler
//! - Wire up middleware (tracing)
//! - Bind server to listener
//! - Hand every request to the caching pipeline
//! - Run the cache sweeper for the server's lifetime

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::proxy::Pipeline;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

/// HTTP server for the caching proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    pipeline: Arc<Pipeline>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and the
    /// default hyper transport.
    pub fn new(config: ProxyConfig) -> Self {
        let pipeline = Arc::new(Pipeline::with_default_transport(&config));
        Self::with_pipeline(config, pipeline)
    }

    /// Create a server around an existing pipeline.
    pub fn with_pipeline(config: ProxyConfig, pipeline: Arc<Pipeline>) -> Self {
        let state = AppState {
            pipeline: Arc::clone(&pipeline),
        };
        let router = Self::build_router(state);
        Self {
            router,
            config,
            pipeline,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Every path is a proxy target, so there is one catch-all handler.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires. In-flight requests are drained before returning.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            ttl_secs = self.pipeline.cache().ttl().as_secs(),
            sweep_interval_secs = self.pipeline.cache().sweep_interval().as_secs(),
            "HTTP server starting"
        );

        let sweeper = self.pipeline.cache().spawn_sweeper(shutdown.resubscribe());

        let mut shutdown = shutdown;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        if let Err(e) = sweeper.await {
            tracing::warn!(error = %e, "Cache sweeper task failed");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }
}

/// Main proxy handler. Each request runs in its own task; failures are
/// answered on that request only.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.pipeline.serve(request).await
}
