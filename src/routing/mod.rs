//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request path + query
//!     → resolver.rs (strip "/", split off optional "go" marker)
//!     → Return: TargetUrl or ResolveError
//! ```
//!
//! # Design Decisions
//! - Every path is a proxy target; there are no other routes
//! - The target is used verbatim: no percent-decoding, no scheme check
//! - A malformed target is only detected when it is dispatched

pub mod resolver;

pub use resolver::{resolve, TargetUrl, GO_MARKER};
