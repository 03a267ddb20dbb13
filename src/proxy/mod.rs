//! Caching proxy core.
//!
//! # Data Flow
//! ```text
//! Request<Body>
//!     → pipeline.rs (resolve target, cache lookup)
//!         hit  → replay.rs
//!         miss → dispatcher.rs (Transport) → cache::snapshot → cache::store → replay.rs
//!     → Response<Body>
//! ```
//!
//! # Design Decisions
//! - The pipeline owns its cache and dispatcher; nothing is global
//! - The transport sits behind a trait so tests can count dispatches
//! - Concurrent misses on the same key may each dispatch (no coalescing)

pub mod dispatcher;
pub mod pipeline;
pub mod replay;

pub use dispatcher::{Dispatcher, HyperTransport, Transport};
pub use pipeline::{Pipeline, Stage};
pub use replay::{replay, CacheStatus, CACHE_STATUS_HEADER};
