//! Outbound request construction and dispatch.
//!
//! # Responsibilities
//! - Rebuild the inbound request against the target URL
//! - Copy inbound headers (every value, in order)
//! - Send through a [`Transport`] with a bounded deadline
//!
//! # Design Decisions
//! - Single attempt, no retries
//! - `Host` is not copied: it names the proxy, the transport derives the
//!   origin's Host from the target
//! - Other hop-by-hop headers pass through untouched

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, Response, Uri},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::error::{BoxError, DispatchError};
use crate::routing::TargetUrl;

/// Capability to send one request and receive the origin's response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, BoxError>;
}

/// Default transport backed by hyper's pooled HTTP client.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Body>,
}

impl HyperTransport {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new())
            .build(HttpConnector::new());
        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, BoxError> {
        let response = self.client.request(request).await?;
        Ok(response.map(Body::new))
    }
}

/// Builds outbound requests and sends them through a [`Transport`].
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, timeout: Option<Duration>) -> Self {
        Self { transport, timeout }
    }

    /// Build the outbound request for `target`.
    pub fn build_request(
        method: Method,
        headers: &HeaderMap,
        body: Body,
        target: &TargetUrl,
    ) -> Result<Request<Body>, DispatchError> {
        let uri = Uri::try_from(target.as_str()).map_err(|e| DispatchError::InvalidTarget {
            target: target.to_string(),
            reason: e.to_string(),
        })?;

        let mut request = Request::new(body);
        *request.method_mut() = method;
        *request.uri_mut() = uri;

        let outbound = request.headers_mut();
        for (name, value) in headers.iter() {
            if name == header::HOST {
                continue;
            }
            outbound.append(name.clone(), value.clone());
        }

        Ok(request)
    }

    /// Send the request once and return the origin response with its body
    /// still unread.
    pub async fn dispatch(
        &self,
        method: Method,
        headers: &HeaderMap,
        body: Body,
        target: &TargetUrl,
    ) -> Result<Response<Body>, DispatchError> {
        let request = Self::build_request(method, headers, body, target)?;
        let send = self.transport.send(request);

        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, send).await {
                Ok(result) => result.map_err(DispatchError::Transport),
                Err(_) => Err(DispatchError::Timeout(limit)),
            },
            None => send.await.map_err(DispatchError::Transport),
        }
    }
}
