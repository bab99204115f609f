//! Response body decoding into caller-chosen destinations.
//!
//! # Design
//! The caller names the shape it wants by picking a `Destination` variant;
//! there is exactly one rule per variant and nothing is inferred from the
//! value behind the reference. Decoding runs in two steps:
//!
//! 1. A gzip `Content-Encoding` wraps the body in a decompressor, so every
//!    destination, including the lazy stream, sees plain content.
//! 2. The destination is filled. `Record` and `Stream` take the body as-is.
//!    `Json` and `Map` parse JSON directly when the response says it is JSON.
//!    Everything else drains the body and converts by the destination's
//!    shape, reporting `CannotConvert` when the content does not fit.

use std::fmt;

use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::RestError;
use crate::http::{protocol_parts, BodyStream, Headers, RawResponse};
use crate::types::ResponseRecord;

/// Something a JSON body can be parsed into.
///
/// Implemented for every `DeserializeOwned` type, so any struct deriving
/// `Deserialize` can be passed as `Destination::Json(&mut value)`.
pub trait JsonTarget {
    fn fill_from_json(&mut self, body: &[u8]) -> Result<(), serde_json::Error>;

    /// Name used in `CannotConvert` errors.
    fn shape(&self) -> &'static str;
}

impl<T: DeserializeOwned> JsonTarget for T {
    fn fill_from_json(&mut self, body: &[u8]) -> Result<(), serde_json::Error> {
        *self = serde_json::from_slice(body)?;
        Ok(())
    }

    fn shape(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Where a response body should end up.
pub enum Destination<'a> {
    /// Drop the body unread. Used when only headers or cookies matter.
    Discard,
    /// Status, protocol, headers and the full body.
    Record(&'a mut ResponseRecord),
    /// The body itself, unread. The slot must be empty; the caller owns the
    /// stream afterwards and should drain it to release the connection.
    Stream(&'a mut Option<BodyStream>),
    /// A structured value parsed from a JSON response.
    Json(&'a mut dyn JsonTarget),
    /// A JSON object.
    Map(&'a mut Map<String, Value>),
    /// A JSON array of arbitrary values.
    List(&'a mut Vec<Value>),
    /// The body as UTF-8 text.
    Text(&'a mut String),
    /// The body bytes, unmodified.
    Bytes(&'a mut Vec<u8>),
}

impl Destination<'_> {
    pub fn shape(&self) -> &'static str {
        match self {
            Destination::Discard => "nothing",
            Destination::Record(_) => "response record",
            Destination::Stream(_) => "stream",
            Destination::Json(target) => target.shape(),
            Destination::Map(_) => "map",
            Destination::List(_) => "list",
            Destination::Text(_) => "text",
            Destination::Bytes(_) => "bytes",
        }
    }
}

impl fmt::Debug for Destination<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Destination").field(&self.shape()).finish()
    }
}

/// Write `response`'s body into `destination`.
pub fn decode(
    response: RawResponse,
    destination: Destination<'_>,
    verbose: bool,
) -> Result<(), RestError> {
    let status_line = response.status_line();
    let RawResponse {
        status,
        version,
        headers,
        body,
        ..
    } = response;

    let body = if is_gzip(&headers) {
        BodyStream::new(GzDecoder::new(body))
    } else {
        body
    };
    let is_json = headers
        .get("Content-Type")
        .is_some_and(|t| t.starts_with("application/json"));

    match destination {
        Destination::Discard => Ok(()),
        Destination::Record(record) => {
            let buf = drain(body, verbose)?;
            let (proto, proto_major, proto_minor) = protocol_parts(version);
            let content_length = headers
                .get("Content-Length")
                .and_then(|v| v.trim().parse().ok());
            *record = ResponseRecord {
                status: status_line,
                status_code: status,
                proto,
                proto_major,
                proto_minor,
                content_length,
                headers,
                body: buf,
            };
            Ok(())
        }
        Destination::Stream(slot) => {
            if slot.is_some() {
                return Err(RestError::DestinationNotWritable(
                    "stream slot already holds an unread body",
                ));
            }
            *slot = Some(body);
            Ok(())
        }
        Destination::Json(target) => {
            let buf = drain(body, verbose)?;
            if !is_json {
                return Err(cannot_convert(&buf, target.shape(), None));
            }
            target.fill_from_json(&buf)?;
            Ok(())
        }
        Destination::Map(map) => {
            let buf = drain(body, verbose)?;
            *map = if is_json {
                serde_json::from_slice(&buf)?
            } else {
                serde_json::from_slice(&buf).map_err(|e| cannot_convert(&buf, "map", Some(e)))?
            };
            Ok(())
        }
        Destination::List(list) => {
            let buf = drain(body, verbose)?;
            *list = serde_json::from_slice(&buf)
                .map_err(|e| cannot_convert(&buf, "list", Some(e)))?;
            Ok(())
        }
        Destination::Text(text) => {
            let buf = drain(body, verbose)?;
            *text = String::from_utf8(buf).map_err(|e| RestError::CannotConvert {
                len: e.as_bytes().len(),
                shape: "text",
                cause: None,
            })?;
            Ok(())
        }
        Destination::Bytes(bytes) => {
            *bytes = drain(body, verbose)?;
            Ok(())
        }
    }
}

fn is_gzip(headers: &Headers) -> bool {
    headers
        .get("Content-Encoding")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("gzip"))
}

fn drain(body: BodyStream, verbose: bool) -> Result<Vec<u8>, RestError> {
    let buf = body.read_all()?;
    if verbose {
        debug!("Body:\n{}", String::from_utf8_lossy(&buf));
    }
    Ok(buf)
}

fn cannot_convert(
    buf: &[u8],
    shape: &'static str,
    cause: Option<serde_json::Error>,
) -> RestError {
    RestError::CannotConvert {
        len: buf.len(),
        shape,
        cause,
    }
}
