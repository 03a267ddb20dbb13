//! Time-expiring snapshot store keyed by target URL.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::cache::snapshot::ResponseSnapshot;
use crate::config::CacheConfig;
use crate::observability::metrics;

/// Default time-to-live of an entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Default interval between expiration sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(120 * 60);

#[derive(Debug)]
struct CacheEntry {
    snapshot: Arc<ResponseSnapshot>,
    /// `None` when the TTL reaches past the clock's range.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// A thread-safe, time-expiring cache of response snapshots.
///
/// Cloning shares the underlying map. Expired entries are invisible to
/// [`get`](Self::get) immediately; the sweeper reclaims their memory later.
#[derive(Debug, Clone)]
pub struct CacheStore {
    inner: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
    sweep_interval: Duration,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_SWEEP_INTERVAL)
    }
}

impl CacheStore {
    pub fn new(ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
            sweep_interval,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(
            Duration::from_secs(config.ttl_secs),
            Duration::from_secs(config.sweep_interval_secs),
        )
    }

    /// Look up a live snapshot. Never fails; expired means absent.
    pub fn get(&self, key: &str) -> Option<Arc<ResponseSnapshot>> {
        let entry = self.inner.get(key)?;
        if entry.is_expired(Instant::now()) {
            return None;
        }
        Some(Arc::clone(&entry.snapshot))
    }

    /// Insert or overwrite `key` with the default TTL.
    ///
    /// Returns the shared snapshot as stored.
    pub fn set(&self, key: impl Into<String>, snapshot: ResponseSnapshot) -> Arc<ResponseSnapshot> {
        self.set_with_ttl(key, snapshot, self.ttl)
    }

    /// Insert or overwrite `key`, expiring `ttl` from now.
    pub fn set_with_ttl(
        &self,
        key: impl Into<String>,
        snapshot: ResponseSnapshot,
        ttl: Duration,
    ) -> Arc<ResponseSnapshot> {
        let snapshot = Arc::new(snapshot);
        let entry = CacheEntry {
            snapshot: Arc::clone(&snapshot),
            expires_at: Instant::now().checked_add(ttl),
        };
        self.inner.insert(key.into(), entry);
        metrics::record_cache_size(self.inner.len());
        snapshot
    }

    /// Physically remove expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.inner.retain(|_, entry| {
            let live = !entry.is_expired(now);
            if !live {
                removed += 1;
            }
            live
        });
        metrics::record_cache_size(self.inner.len());
        removed
    }

    /// Number of stored entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Run [`purge_expired`](Self::purge_expired) every sweep interval
    /// until the shutdown signal fires.
    pub fn spawn_sweeper(&self, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            tracing::info!(
                interval_secs = store.sweep_interval.as_secs(),
                "Cache sweeper starting"
            );

            let Some(start) = Instant::now().checked_add(store.sweep_interval) else {
                tracing::warn!("Cache sweep interval out of range, sweeper disabled");
                let _ = shutdown.recv().await;
                return;
            };
            let mut ticker = time::interval_at(start, store.sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = store.purge_expired();
                        tracing::debug!(removed, remaining = store.len(), "Cache sweep complete");
                    }
                    _ = shutdown.recv() => {
                        tracing::info!("Cache sweeper received shutdown signal, exiting loop");
                        break;
                    }
                }
            }
        })
    }
}
