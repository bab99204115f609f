//! Blocking network round trip for one `HttpRequest`.
//!
//! # Design
//! A `Transport` owns one `ureq::Agent` and one cookie jar. Every cookie a
//! response sets is stored against the request URL and replayed on later
//! matching requests from the same client, as bare `name=value` pairs.
//! HTTP error statuses come back as ordinary responses; only failures to
//! talk to the server at all become errors. The agent is built without its
//! own decompression or cookie handling, so the decoder sees the body exactly
//! as sent and the jar is the only source of `Cookie` headers.

use cookie_store::CookieStore;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::RestError;
use crate::http::{BodyStream, Headers, HttpMethod, HttpRequest, RawResponse};

pub struct Transport {
    agent: ureq::Agent,
    cookies: CookieStore,
}

impl Transport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .build()
            .new_agent();
        Self {
            agent,
            cookies: CookieStore::default(),
        }
    }

    /// Send `request` with the client's `shared` headers layered on top and
    /// return the response with its body unread.
    pub fn execute(
        &mut self,
        request: HttpRequest,
        shared: &Headers,
        verbose: bool,
    ) -> Result<RawResponse, RestError> {
        let HttpRequest {
            method,
            url,
            mut headers,
            body,
        } = request;

        headers.overlay(shared);
        if body.is_none() {
            headers.remove("Content-Type");
            headers.remove("Content-Length");
        }
        self.attach_cookies(&url, &mut headers);

        if verbose {
            debug!("Fetching {url}");
            debug!("> {method} {url}");
            for (name, value) in headers.iter() {
                debug!("> {name}: {value}");
            }
        }

        let uri = url.as_str();
        let response = match (method, body) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(uri), &headers).call(),
            (HttpMethod::Delete, None) => with_headers(self.agent.delete(uri), &headers).call(),
            (HttpMethod::Delete, Some(body)) => {
                with_headers(self.agent.delete(uri).force_send_body(), &headers)
                    .send(body.as_slice())
            }
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(uri), &headers).send(body.as_slice())
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(uri), &headers).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_headers(self.agent.put(uri), &headers).send(body.as_slice())
            }
            (HttpMethod::Put, None) => with_headers(self.agent.put(uri), &headers).send_empty(),
        }?;

        let (parts, body) = response.into_parts();
        let raw = RawResponse {
            status: parts.status.as_u16(),
            reason: parts.status.canonical_reason().unwrap_or_default().to_string(),
            version: parts.version,
            headers: Headers::from(&parts.headers),
            body: BodyStream::new(body.into_reader()),
        };
        self.store_cookies(&url, &raw.headers);

        if verbose {
            debug!("< {:?} {}", raw.version, raw.status_line());
            for (name, value) in raw.headers.iter() {
                debug!("< {name}: {value}");
            }
        }

        Ok(raw)
    }

    /// `name=value` pairs the jar holds for `url`, in one header value.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        let pairs: Vec<String> = self
            .cookies
            .get_request_values(url)
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        (!pairs.is_empty()).then(|| pairs.join("; "))
    }

    /// Stored cookies are appended to any `Cookie` header the caller set.
    fn attach_cookies(&self, url: &Url, headers: &mut Headers) {
        let Some(jar) = self.cookie_header(url) else {
            return;
        };
        let value = match headers.get("Cookie") {
            Some(own) if !own.is_empty() => format!("{own}; {jar}"),
            _ => jar,
        };
        headers.set("Cookie", value);
    }

    fn store_cookies(&mut self, url: &Url, headers: &Headers) {
        for set_cookie in headers.get_all("Set-Cookie") {
            if let Err(e) = self.cookies.parse(set_cookie, url) {
                debug!("ignoring cookie from {url}: {e}");
            }
        }
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &Headers) -> ureq::RequestBuilder<B> {
    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }
    builder
}
