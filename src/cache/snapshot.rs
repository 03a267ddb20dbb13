//! Connection-independent projection of an origin response.

use axum::{
    body::Body,
    http::{header, HeaderMap, Response},
};
use bytes::{Bytes, BytesMut};
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};

/// Headers, status and body of an origin response, fully buffered.
///
/// Immutable once built. Header values are kept as raw bytes, so obs-text
/// from the origin replays unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    headers: Vec<(String, Vec<Bytes>)>,
    status: u16,
    body: Bytes,
}

/// Result of capturing a response.
///
/// A body read failure does not fail the capture: the snapshot holds
/// whatever prefix was read, minus the origin's `Content-Length`, and the
/// error is handed back for the caller to log.
#[derive(Debug)]
pub struct Captured {
    pub snapshot: ResponseSnapshot,
    pub read_error: Option<axum::Error>,
}

impl ResponseSnapshot {
    pub fn new(status: u16, headers: Vec<(String, Vec<Bytes>)>, body: impl Into<Bytes>) -> Self {
        Self {
            headers,
            status,
            body: body.into(),
        }
    }

    /// Read an origin response to exhaustion and snapshot it.
    ///
    /// The response body is consumed by value, so it is released on every
    /// exit path including a failed read.
    pub async fn capture(response: Response<Body>) -> Captured {
        let (parts, mut body) = response.into_parts();

        let mut buf = BytesMut::new();
        let mut read_error = None;
        while let Some(frame) = body.frame().await {
            match frame {
                Ok(frame) => {
                    // Trailers are not part of the snapshot.
                    if let Ok(data) = frame.into_data() {
                        buf.extend_from_slice(&data);
                    }
                }
                Err(e) => {
                    read_error = Some(e);
                    break;
                }
            }
        }
        drop(body);

        let mut headers = parts.headers;
        if read_error.is_some() {
            // The declared length no longer matches the truncated body.
            headers.remove(header::CONTENT_LENGTH);
        }

        Captured {
            snapshot: Self {
                headers: headers_to_pairs(&headers),
                status: parts.status.as_u16(),
                body: buf.freeze(),
            },
            read_error,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Header names in first-seen order, each with its values in arrival order.
    pub fn headers(&self) -> &[(String, Vec<Bytes>)] {
        &self.headers
    }

    /// All values recorded for `name` (exact match).
    pub fn header_values(&self, name: &str) -> &[Bytes] {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

fn headers_to_pairs(headers: &HeaderMap) -> Vec<(String, Vec<Bytes>)> {
    headers
        .keys()
        .map(|name| {
            let values = headers
                .get_all(name)
                .iter()
                .map(|v| Bytes::copy_from_slice(v.as_bytes()))
                .collect();
            (name.as_str().to_string(), values)
        })
        .collect()
}
