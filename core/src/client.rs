//! Reusable HTTP client bound to a base address.
//!
//! # Design
//! `RestClient` holds the normalized prefix, a set of persistent headers
//! (basic auth and anything else the caller adds), the transport agent with
//! its cookie jar, and the headers of the last response. Every call is a
//! straight line: build the request, execute it, record the response
//! headers, decode the body into the caller's destination.
//!
//! Headers and cookies are per-client mutable state. All methods that send
//! or mutate take `&mut self`, so two requests can never observe a half-made
//! header change; callers that share one client across threads wrap it in a
//! lock of their choosing.

use std::fmt;

use base64::prelude::{Engine as _, BASE64_STANDARD};

use crate::config::ClientConfig;
use crate::decode::{decode, Destination};
use crate::error::RestError;
use crate::http::{Headers, HttpMethod, HttpRequest, Values};
use crate::multipart::MultipartBody;
use crate::request::{normalize_prefix, RequestBuilder};
use crate::transport::Transport;

/// A blocking client for one base address.
///
/// Created with `connect` or `with_config`. Holds persistent request headers,
/// a cookie jar, and the headers of the last response, so it is reused
/// across calls rather than created per request.
pub struct RestClient {
    prefix: String,
    headers: Headers,
    transport: Transport,
    verbose: bool,
    last_response_headers: Headers,
}

impl RestClient {
    /// Bind a client to `base`, configured from the environment
    /// (see `ClientConfig::from_env`).
    pub fn connect(base: &str) -> Result<Self, RestError> {
        Self::with_config(base, ClientConfig::from_env())
    }

    pub fn with_config(base: &str, config: ClientConfig) -> Result<Self, RestError> {
        let prefix = normalize_prefix(base)?;
        Ok(Self {
            prefix,
            headers: Headers::new(),
            transport: Transport::new(&config),
            verbose: config.verbose,
            last_response_headers: Headers::new(),
        })
    }

    /// Normalized base address, always ending in one `/`.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Send `Authorization: Basic base64(user:pass)` on every later request.
    pub fn set_basic_auth(&mut self, user: &str, pass: &str) {
        let token = BASE64_STANDARD.encode(format!("{user}:{pass}"));
        self.headers.set("Authorization", format!("Basic {token}"));
    }

    /// Replace a persistent request header.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.set(name, value);
    }

    /// Add a value to a persistent request header.
    pub fn add_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.add(name, value);
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.remove(name);
    }

    /// Persistent request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Last value of `name` in the most recent response, or `""`.
    ///
    /// Typically read after `get_headers` to pick up a session token.
    pub fn get_header(&self, name: &str) -> String {
        self.last_response_headers
            .get_last(name)
            .unwrap_or_default()
            .to_string()
    }

    pub fn get(
        &mut self,
        destination: Destination<'_>,
        path: &str,
        values: Option<&Values>,
    ) -> Result<(), RestError> {
        let request = self.builder().build_get(path, values)?;
        self.dispatch(request, destination)
    }

    pub fn post(
        &mut self,
        destination: Destination<'_>,
        path: &str,
        values: Option<&Values>,
    ) -> Result<(), RestError> {
        let request = self.builder().build_post(path, values)?;
        self.dispatch(request, destination)
    }

    pub fn put(
        &mut self,
        destination: Destination<'_>,
        path: &str,
        values: Option<&Values>,
    ) -> Result<(), RestError> {
        let request = self.builder().build_put(path, values)?;
        self.dispatch(request, destination)
    }

    pub fn delete(
        &mut self,
        destination: Destination<'_>,
        path: &str,
        values: Option<&Values>,
    ) -> Result<(), RestError> {
        let request = self.builder().build_delete(path, values)?;
        self.dispatch(request, destination)
    }

    /// POST a body built by the caller.
    pub fn post_raw(
        &mut self,
        destination: Destination<'_>,
        path: &str,
        body: Vec<u8>,
    ) -> Result<(), RestError> {
        let request = self.builder().build_raw(HttpMethod::Post, path, body)?;
        self.dispatch(request, destination)
    }

    pub fn post_multipart(
        &mut self,
        destination: Destination<'_>,
        path: &str,
        body: MultipartBody,
    ) -> Result<(), RestError> {
        let request = self.builder().build_multipart(HttpMethod::Post, path, body)?;
        self.dispatch(request, destination)
    }

    pub fn put_multipart(
        &mut self,
        destination: Destination<'_>,
        path: &str,
        body: MultipartBody,
    ) -> Result<(), RestError> {
        let request = self.builder().build_multipart(HttpMethod::Put, path, body)?;
        self.dispatch(request, destination)
    }

    /// GET `path` for its headers and cookies only; the body is discarded.
    ///
    /// A server that closes the connection cleanly without sending a body
    /// still counts as success here. No other method relaxes this.
    pub fn get_headers(&mut self, path: &str) -> Result<(), RestError> {
        match self.get(Destination::Discard, path, None) {
            Err(e) if e.is_clean_eof() => Ok(()),
            other => other,
        }
    }

    fn builder(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(&self.prefix)
    }

    fn dispatch(
        &mut self,
        request: HttpRequest,
        destination: Destination<'_>,
    ) -> Result<(), RestError> {
        self.last_response_headers = Headers::new();
        let response = self.transport.execute(request, &self.headers, self.verbose)?;
        self.last_response_headers = response.headers.clone();
        decode(response, destination, self.verbose)
    }
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("prefix", &self.prefix)
            .field("headers", &self.headers)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RestClient {
        RestClient::with_config("http://localhost:3000", ClientConfig::default()).unwrap()
    }

    #[test]
    fn prefix_is_normalized() {
        assert_eq!(client().prefix(), "http://localhost:3000/");
        let c = RestClient::with_config("http://localhost:3000/v1//", ClientConfig::default()).unwrap();
        assert_eq!(c.prefix(), "http://localhost:3000/v1/");
    }

    #[test]
    fn invalid_prefix_is_rejected() {
        let err = RestClient::with_config("not a url", ClientConfig::default()).unwrap_err();
        assert!(matches!(err, RestError::InvalidPrefix { .. }));
    }

    #[test]
    fn basic_auth_header_is_encoded() {
        let mut c = client();
        c.set_basic_auth("foo", "bar");
        assert_eq!(c.headers().get("authorization"), Some("Basic Zm9vOmJhcg=="));

        c.set_basic_auth("user", "secret");
        assert_eq!(c.headers().get_all("Authorization").count(), 1);
        assert_eq!(c.headers().get("Authorization"), Some("Basic dXNlcjpzZWNyZXQ="));
    }

    #[test]
    fn persistent_headers_can_be_managed() {
        let mut c = client();
        c.add_header("X-Tag", "a");
        c.add_header("X-Tag", "b");
        assert_eq!(c.headers().get_all("x-tag").count(), 2);
        c.set_header("X-Tag", "c");
        assert_eq!(c.headers().get("x-tag"), Some("c"));
        c.remove_header("x-tag");
        assert!(c.headers().is_empty());
    }

    #[test]
    fn missing_response_header_is_empty_string() {
        assert_eq!(client().get_header("X-Session-Token"), "");
    }

    #[test]
    fn failed_call_forgets_previous_response_headers() {
        // Bind then drop to get a port nothing listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let mut c =
            RestClient::with_config(&format!("http://127.0.0.1:{port}"), ClientConfig::default())
                .unwrap();
        c.last_response_headers.set("X-Session-Token", "stale");
        assert_eq!(c.get_header("X-Session-Token"), "stale");

        let err = c.get(Destination::Discard, "/login", None).unwrap_err();
        assert!(matches!(err, RestError::TransportFailed(_)));
        assert_eq!(c.get_header("X-Session-Token"), "");
    }

    #[test]
    fn verbose_follows_config() {
        assert!(!client().is_verbose());
        let c = RestClient::with_config("http://localhost:3000", ClientConfig::default().verbose(true))
            .unwrap();
        assert!(c.is_verbose());
    }
}
