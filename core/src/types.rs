//! Caller-facing response record.

use crate::http::Headers;

/// A response with its metadata and fully read body.
///
/// Filled by `Destination::Record` when the caller needs status and headers
/// alongside the content. The body is stored as received (after gzip
/// decoding) and is never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseRecord {
    /// e.g. `"200 OK"`
    pub status: String,
    pub status_code: u16,
    /// e.g. `"HTTP/1.1"`
    pub proto: String,
    pub proto_major: u8,
    pub proto_minor: u8,
    /// Value of the `Content-Length` header; `None` when absent or malformed.
    pub content_length: Option<u64>,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl ResponseRecord {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
