//! HTTP transport types.
//!
//! # Design
//! Requests and responses are plain data. `BooksClient` builds `HttpRequest`
//! values and parses `HttpResponse` values without touching the network; the
//! `Transport` trait is the single seam where I/O happens. The bundled
//! `UreqTransport` fills it for native callers, tests substitute their own,
//! and a mobile host that performs its own I/O goes through the C ABI instead.
//!
//! All fields use owned types so values cross thread and FFI boundaries
//! without lifetime concerns. Only `GET` is ever issued, so the method is
//! implied.

use std::borrow::Cow;

use crate::error::ApiError;

/// A `GET` request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// An HTTP response described as plain data.
///
/// `body` is raw bytes because the same type carries JSON documents and
/// cover images.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// The body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Executes requests against the network.
///
/// Implementations must return non-2xx statuses as an `Ok(HttpResponse)` and
/// reserve `Err` for failures where no response was received.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}
