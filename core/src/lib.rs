//! Blocking HTTP convenience client.
//!
//! # Overview
//! `RestClient` issues GET/POST/PUT/DELETE and multipart requests against a
//! base address, keeps basic auth and other headers across calls, replays
//! session cookies, decompresses gzip bodies, and decodes each response into
//! a caller-chosen `Destination`.
//!
//! # Design
//! - `request` builds `HttpRequest` values without I/O; `transport` executes
//!   them; `decode` turns the raw response into the destination.
//! - Destinations are a closed enum, one decode rule per variant.
//! - Tracing is a per-client setting (`ClientConfig::verbose`), emitted via
//!   `tracing` at debug level.
//!
//! ```no_run
//! use rest_core::{Destination, RestClient, Values};
//!
//! # fn main() -> Result<(), rest_core::RestError> {
//! let mut client = RestClient::connect("http://localhost:3000")?;
//! client.set_basic_auth("foo", "bar");
//!
//! let mut found = serde_json::Map::new();
//! let query: Values = [("term", "some string")].into_iter().collect();
//! client.get(Destination::Map(&mut found), "/search", Some(&query))?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod http;
pub mod multipart;
pub mod request;
pub mod transport;
pub mod types;

pub use client::RestClient;
pub use config::ClientConfig;
pub use decode::{Destination, JsonTarget};
pub use error::{RestError, TransportError};
pub use http::{BodyStream, Headers, HttpMethod, HttpRequest, RawResponse, Values};
pub use multipart::{Attachment, MultipartBody};
pub use request::RequestBuilder;
pub use types::ResponseRecord;
