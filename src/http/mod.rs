//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all route)
//!     → proxy::Pipeline (resolve, cache, dispatch, replay)
//!     → Send to client
//! ```

pub mod server;

pub use server::{AppState, HttpServer};
