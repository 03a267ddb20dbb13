//! Writes a cached snapshot back out as a client response.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Response, StatusCode},
};
use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};

use crate::cache::ResponseSnapshot;
use crate::error::ReplyError;
use crate::observability::metrics;

/// Header carrying the cache outcome when enabled.
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache-status");

/// Largest frame handed to the connection at once.
const REPLY_CHUNK_SIZE: usize = 16 * 1024;

/// Whether a replayed snapshot came from the cache or a fresh dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// Body of a replayed response.
///
/// Yields the snapshot body in bounded chunks. If the connection drops the
/// body before the last chunk was taken (client hung up, socket write
/// failed), a warning naming the target URL is logged for that request.
#[derive(Debug)]
pub struct ReplyBody {
    remaining: Bytes,
    url: String,
}

impl ReplyBody {
    pub fn new(body: Bytes, url: impl Into<String>) -> Self {
        Self {
            remaining: body,
            url: url.into(),
        }
    }
}

impl HttpBody for ReplyBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.remaining.is_empty() {
            return Poll::Ready(None);
        }
        let len = this.remaining.len().min(REPLY_CHUNK_SIZE);
        Poll::Ready(Some(Ok(Frame::data(this.remaining.split_to(len)))))
    }

    fn is_end_stream(&self) -> bool {
        self.remaining.is_empty()
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.remaining.len() as u64)
    }
}

impl Drop for ReplyBody {
    fn drop(&mut self) {
        if !self.remaining.is_empty() {
            metrics::record_reply_aborted();
            tracing::warn!(
                url = %self.url,
                bytes_unsent = self.remaining.len(),
                "Failed to write proxy response, client connection closed"
            );
        }
    }
}

/// Rebuild a response from `snapshot` fetched for `url`.
///
/// Every header value is appended in stored order, so repeated headers keep
/// their multiplicity. `cache_status`, when given, adds
/// [`CACHE_STATUS_HEADER`].
pub fn replay(
    snapshot: &ResponseSnapshot,
    url: &str,
    cache_status: Option<CacheStatus>,
) -> Result<Response<Body>, ReplyError> {
    let status = StatusCode::from_u16(snapshot.status())
        .map_err(|_| ReplyError::Status(snapshot.status()))?;

    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, values) in snapshot.headers() {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ReplyError::Header { name: name.clone() })?;
        for value in values {
            let header_value = HeaderValue::from_bytes(value)
                .map_err(|_| ReplyError::Header { name: name.clone() })?;
            headers.append(header_name.clone(), header_value);
        }
    }

    if let Some(status) = cache_status {
        headers.insert(CACHE_STATUS_HEADER, HeaderValue::from_static(status.as_str()));
    }

    // Built last: dropping an unsent ReplyBody logs an aborted write.
    *response.body_mut() = Body::new(ReplyBody::new(snapshot.body().clone(), url));
    Ok(response)
}
