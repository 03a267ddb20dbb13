//! Per-request orchestration of resolve, lookup, dispatch and replay.
//!
//! ```text
//! Resolving → CacheLookup ─hit─────────────────────────────────────────┐
//!                  └─miss→ Dispatching → Snapshotting → CachePopulate ─┴→ Replaying → Done
//!
//! Resolving / Dispatching ─error→ Errored (4xx/5xx, cache untouched)
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{Request, Response},
    response::IntoResponse,
};

use crate::cache::{CacheStore, Captured, ResponseSnapshot};
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::observability::metrics;
use crate::proxy::dispatcher::{Dispatcher, HyperTransport, Transport};
use crate::proxy::replay::{replay, CacheStatus};
use crate::routing::resolve;

/// Named states of a proxied request, used in log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolving,
    CacheLookup,
    Dispatching,
    Snapshotting,
    CachePopulate,
    Replaying,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Resolving => "resolving",
            Stage::CacheLookup => "cache_lookup",
            Stage::Dispatching => "dispatching",
            Stage::Snapshotting => "snapshotting",
            Stage::CachePopulate => "cache_populate",
            Stage::Replaying => "replaying",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// The caching proxy core, shared by every request task.
///
/// Owns the cache and the dispatcher. Built once at startup and handed to
/// the server behind an `Arc`.
#[derive(Clone)]
pub struct Pipeline {
    cache: CacheStore,
    dispatcher: Dispatcher,
    status_header: bool,
}

impl Pipeline {
    pub fn new(cache: CacheStore, dispatcher: Dispatcher) -> Self {
        Self {
            cache,
            dispatcher,
            status_header: false,
        }
    }

    /// Build a pipeline from configuration using the given transport.
    pub fn from_config(config: &ProxyConfig, transport: Arc<dyn Transport>) -> Self {
        let timeout = Duration::from_secs(config.timeouts.dispatch_secs);
        Self::new(
            CacheStore::from_config(&config.cache),
            Dispatcher::new(transport, Some(timeout)),
        )
        .with_status_header(config.cache.status_header)
    }

    /// Build a pipeline from configuration with the default hyper transport.
    pub fn with_default_transport(config: &ProxyConfig) -> Self {
        Self::from_config(config, Arc::new(HyperTransport::new()))
    }

    /// Add `x-cache-status` to every replayed response.
    pub fn with_status_header(mut self, enabled: bool) -> Self {
        self.status_header = enabled;
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Proxy one request, serving it from cache when possible.
    pub async fn handle(&self, request: Request<Body>) -> Result<Response<Body>, ProxyError> {
        let path_and_query = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        tracing::trace!(stage = %Stage::Resolving, path = %path_and_query);
        let target = resolve(path_and_query)?;

        tracing::trace!(stage = %Stage::CacheLookup, url = %target);
        let (snapshot, status) = match self.cache.get(target.as_str()) {
            Some(snapshot) => {
                metrics::record_cache_hit();
                tracing::debug!(url = %target, "Cache hit");
                (snapshot, CacheStatus::Hit)
            }
            None => {
                metrics::record_cache_miss();
                tracing::info!(url = %target, "Cache miss");

                // No cache lock is held from here until the populate step.
                tracing::trace!(stage = %Stage::Dispatching, url = %target);
                let (parts, body) = request.into_parts();
                let started = Instant::now();
                let response = self
                    .dispatcher
                    .dispatch(parts.method, &parts.headers, body, &target)
                    .await
                    .map_err(|e| {
                        metrics::record_dispatch_error();
                        tracing::error!(url = %target, error = %e, "Error sending proxy request");
                        e
                    })?;
                tracing::debug!(url = %target, status = %response.status(), "Origin responded");

                tracing::trace!(stage = %Stage::Snapshotting, url = %target);
                let Captured {
                    snapshot,
                    read_error,
                } = ResponseSnapshot::capture(response).await;
                metrics::record_dispatch_duration(started.elapsed());
                if let Some(e) = read_error {
                    metrics::record_body_read_error();
                    tracing::warn!(
                        url = %target,
                        error = %e,
                        bytes_read = snapshot.body().len(),
                        "Failed to read response body, caching partial body without Content-Length"
                    );
                }

                tracing::trace!(stage = %Stage::CachePopulate, url = %target);
                (self.cache.set(target.as_str(), snapshot), CacheStatus::Miss)
            }
        };

        tracing::trace!(stage = %Stage::Replaying, url = %target, cache = status.as_str());
        let response = replay(&snapshot, target.as_str(), self.status_header.then_some(status))?;

        tracing::trace!(stage = %Stage::Done, url = %target, status = %response.status());
        Ok(response)
    }

    /// Like [`handle`](Self::handle), with failures turned into error responses.
    pub async fn serve(&self, request: Request<Body>) -> Response<Body> {
        match self.handle(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, status = %e.status_code(), "Proxy request failed");
                e.into_response()
            }
        }
    }
}
