//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! pipeline / cache / server produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauge, histogram)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```
//!
//! # Design Decisions
//! - Target URL is attached to every pipeline event
//! - Metrics are cheap (no-op without an installed recorder)

pub mod logging;
pub mod metrics;
