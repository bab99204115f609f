//! Error types for the REST client.
//!
//! # Design
//! Every public operation returns `RestError`. Construction problems
//! (`InvalidPrefix`, `UrlResolutionFailed`, `MultipartConstructionFailed`)
//! surface before any network activity. Decoding problems are split between
//! `DecodeFailed`, which wraps the JSON parser's error, and `CannotConvert`,
//! which reports a body whose shape does not fit the destination. Everything
//! that goes wrong on the wire lands in `TransportFailed`.

use std::io;

/// Errors returned by `RestClient` operations.
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// The base address given to the client is not an absolute URL.
    #[error("invalid prefix {prefix:?}: {reason}")]
    InvalidPrefix { prefix: String, reason: String },

    /// The per-call path (or its query) could not be resolved against the prefix.
    #[error("could not resolve {target:?}: {source}")]
    UrlResolutionFailed {
        target: String,
        #[source]
        source: url::ParseError,
    },

    /// The destination cannot accept the decoded body.
    #[error("destination is not writable: {0}")]
    DestinationNotWritable(&'static str),

    /// The body claimed to be JSON but did not parse.
    #[error("could not decode response body: {0}")]
    DecodeFailed(#[from] serde_json::Error),

    /// The body's content does not fit the destination's shape. When a JSON
    /// inference was attempted, `cause` keeps the parser's complaint.
    #[error("cannot convert {len} bytes of body into {shape}")]
    CannotConvert {
        len: usize,
        shape: &'static str,
        #[source]
        cause: Option<serde_json::Error>,
    },

    /// An attachment could not be read or the builder received nothing to send.
    #[error("could not build multipart body: {0}")]
    MultipartConstructionFailed(String),

    /// Network-level failure, including truncated or undecompressable bodies.
    #[error("transport failed: {0}")]
    TransportFailed(#[from] TransportError),
}

/// Underlying cause of a `RestError::TransportFailed`.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] ureq::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<ureq::Error> for RestError {
    fn from(e: ureq::Error) -> Self {
        RestError::TransportFailed(TransportError::Http(e))
    }
}

impl From<io::Error> for RestError {
    fn from(e: io::Error) -> Self {
        RestError::TransportFailed(TransportError::Io(e))
    }
}

impl RestError {
    /// True when the transport ended cleanly before a response body arrived.
    ///
    /// Only `RestClient::get_headers` treats this as success; every decode
    /// path keeps it as an error so truncated bodies are never masked.
    pub fn is_clean_eof(&self) -> bool {
        let io_error = match self {
            RestError::TransportFailed(TransportError::Io(e)) => e,
            RestError::TransportFailed(TransportError::Http(ureq::Error::Io(e))) => e,
            _ => return false,
        };
        io_error.kind() == io::ErrorKind::UnexpectedEof
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_eof_is_recognized() {
        let err = RestError::from(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert!(err.is_clean_eof());
    }

    #[test]
    fn other_io_errors_are_not_clean_eof() {
        let err = RestError::from(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert!(!err.is_clean_eof());
        let err = RestError::CannotConvert {
            len: 3,
            shape: "list",
            cause: None,
        };
        assert!(!err.is_clean_eof());
    }

    #[test]
    fn cannot_convert_names_length_and_shape() {
        let err = RestError::CannotConvert {
            len: 12,
            shape: "map",
            cause: None,
        };
        assert_eq!(err.to_string(), "cannot convert 12 bytes of body into map");
    }

    #[test]
    fn cannot_convert_exposes_parser_error_as_source() {
        use std::error::Error as _;

        let parse = serde_json::from_str::<serde_json::Value>("hello").unwrap_err();
        let expected = parse.to_string();
        let err = RestError::CannotConvert {
            len: 5,
            shape: "list",
            cause: Some(parse),
        };
        let source = err.source().expect("parser error kept");
        assert_eq!(source.to_string(), expected);
    }
}
