//! HTTP data types shared by the builder, the transport and the decoder.
//!
//! # Design
//! Requests are described as plain data (`HttpRequest`) so URL resolution and
//! body encoding can be tested without a network. Responses arrive as
//! `RawResponse`, whose body is a lazily-read `BodyStream`; only the decoder
//! decides whether that stream is drained or handed to the caller.
//!
//! `Headers` and `Values` are small ordered multimaps. Header names compare
//! case-insensitively; form values are sorted by key when encoded so the
//! same input always produces the same query string.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Read};

use ureq::http::Version;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, case-insensitive mapping of header name to values.
///
/// Names keep the spelling they were first inserted with. Values of one name
/// keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every value of `name` with `value`.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.remove(name);
        self.entries.push((name.to_string(), value.into()));
    }

    /// Append `value` to the values of `name`.
    pub fn add(&mut self, name: &str, value: impl Into<String>) {
        self.entries.push((name.to_string(), value.into()));
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Last value of `name`.
    pub fn get_last(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Overlay `other` on top of `self`: each name present in `other`
    /// replaces all of `self`'s values for that name.
    pub fn overlay(&mut self, other: &Headers) {
        for (name, _) in &other.entries {
            self.remove(name);
        }
        self.entries.extend(other.entries.iter().cloned());
    }
}

impl From<&ureq::http::HeaderMap> for Headers {
    fn from(map: &ureq::http::HeaderMap) -> Self {
        let entries = map
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        Self { entries }
    }
}

/// Form or query values: each key maps to an ordered list of values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    inner: BTreeMap<String, Vec<String>>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` to `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.inner.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Replace all values of `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.inner.insert(key.into(), vec![value.into()]);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.inner.values().all(Vec::is_empty)
    }

    /// Iterate `(key, value)` pairs, keys sorted, values in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// `application/x-www-form-urlencoded` serialization, e.g. `a=1&b=two+words`.
    pub fn encode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in self.pairs() {
            serializer.append_pair(k, v);
        }
        serializer.finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Values::new();
        for (k, v) in iter {
            values.add(k, v);
        }
        values
    }
}

/// An HTTP request described as plain data.
///
/// Built by the functions in `request`, executed by `Transport`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: url::Url,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

/// A response body that has not been read yet.
///
/// Owns the underlying connection. Reading it to the end, or dropping it,
/// releases the connection.
pub struct BodyStream {
    reader: Box<dyn Read>,
}

impl BodyStream {
    pub fn new(reader: impl Read + 'static) -> Self {
        Self {
            reader: Box::new(reader),
        }
    }

    /// Drain the stream into memory.
    pub fn read_all(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Read for BodyStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyStream").finish_non_exhaustive()
    }
}

/// A response as received from the transport, body still unread.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub version: Version,
    pub headers: Headers,
    pub body: BodyStream,
}

impl RawResponse {
    /// Status line without the protocol, e.g. `"200 OK"`.
    pub fn status_line(&self) -> String {
        if self.reason.is_empty() {
            self.status.to_string()
        } else {
            format!("{} {}", self.status, self.reason)
        }
    }
}

/// `("HTTP/1.1", 1, 1)` style protocol description.
pub(crate) fn protocol_parts(version: Version) -> (String, u8, u8) {
    let (major, minor) = match version {
        Version::HTTP_09 => (0, 9),
        Version::HTTP_10 => (1, 0),
        Version::HTTP_2 => (2, 0),
        Version::HTTP_3 => (3, 0),
        _ => (1, 1),
    };
    (format!("{version:?}"), major, minor)
}
