//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! Origin response (live body stream)
//!     → snapshot.rs (buffer body, copy headers + status)
//!     → store.rs (key = target URL, expires after TTL)
//!     → read back as Arc<ResponseSnapshot> on every hit
//!
//! Background:
//!     store.rs sweeper → purge expired entries every sweep interval
//! ```
//!
//! # Design Decisions
//! - Eviction is purely time-based (no size or LRU limit)
//! - Expired entries are unreadable before they are swept
//! - The store synchronizes internally; callers never hold a lock
//! - Last writer wins on concurrent `set` for the same key

pub mod snapshot;
pub mod store;

pub use snapshot::{Captured, ResponseSnapshot};
pub use store::{CacheStore, DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL};
