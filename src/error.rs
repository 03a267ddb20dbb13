//! Error taxonomy for the request pipeline.
//!
//! Every failure is terminal for the request it belongs to. None of these
//! errors touch the cache, and none of them stop the serving loop.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Boxed error returned by a [`Transport`](crate::proxy::Transport).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The target URL could not be extracted from the inbound path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// `/go` marker present but nothing follows it.
    #[error("missing target after /go marker in path {0:?}")]
    MissingTarget(String),
}

/// Sending the outbound request failed.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The target is not a usable request URI.
    #[error("invalid target URL {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },

    /// DNS, connect or protocol failure reported by the transport.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The origin did not answer within the dispatch deadline.
    #[error("origin did not respond within {0:?}")]
    Timeout(Duration),
}

/// A snapshot could not be turned back into a response.
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("invalid status code {0} in snapshot")]
    Status(u16),

    #[error("invalid header {name:?} in snapshot")]
    Header { name: String },
}

/// Umbrella error for one proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Reply(#[from] ReplyError),
}

impl ProxyError {
    /// Status code reported to the client for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Resolve(_) => StatusCode::BAD_REQUEST,
            ProxyError::Dispatch(DispatchError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Reply(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let message = match &self {
            ProxyError::Resolve(_) => "Error resolving proxy target",
            ProxyError::Dispatch(DispatchError::InvalidTarget { .. }) => {
                "Error creating proxy request"
            }
            ProxyError::Dispatch(_) => "Error sending proxy request",
            ProxyError::Reply(_) => "Error replaying proxy response",
        };
        (self.status_code(), message).into_response()
    }
}
