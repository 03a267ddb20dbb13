//! Caching HTTP proxy library.
//!
//! Requests carry their destination in the path (`/go/<url>` or `/<url>`).
//! The first response for a URL is buffered into a snapshot and cached; later
//! requests for the same URL are replayed from the cache until the entry
//! expires.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use cache::{CacheStore, ResponseSnapshot};
pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::{Dispatcher, HyperTransport, Pipeline, Transport};
pub use routing::{resolve, TargetUrl};
