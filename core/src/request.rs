//! Request construction: URL resolution and body encoding.
//!
//! # Design
//! `RequestBuilder` borrows the client's prefix and produces `HttpRequest`
//! values without touching the network, so every encoding rule here is
//! checked by plain unit tests. Reads carry their values in the query
//! string; writes carry them as a form-encoded body.

use url::Url;

use crate::error::RestError;
use crate::http::{Headers, HttpMethod, HttpRequest, Values};
use crate::multipart::MultipartBody;

/// Content type given to write bodies unless the client overrides it.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Builds requests relative to a normalized prefix (one trailing `/`).
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    prefix: &'a str,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(prefix: &'a str) -> Self {
        Self { prefix }
    }

    /// `prefix + path`, with leading slashes of `path` dropped so the result
    /// never contains a doubled separator at the join.
    pub fn resolve(&self, path: &str) -> Result<Url, RestError> {
        let target = format!("{}{}", self.prefix, path.trim_start_matches('/'));
        Url::parse(&target).map_err(|source| RestError::UrlResolutionFailed { target, source })
    }

    /// GET with `values` appended to the query. An existing query in `path`
    /// is kept and extended with `&`.
    pub fn build_get(&self, path: &str, values: Option<&Values>) -> Result<HttpRequest, RestError> {
        let mut url = self.resolve(path)?;
        if let Some(values) = values.filter(|v| !v.is_empty()) {
            let encoded = values.encode();
            let query = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
                _ => encoded,
            };
            url.set_query(Some(&query));
        }
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: Headers::new(),
            body: None,
        })
    }

    pub fn build_post(&self, path: &str, values: Option<&Values>) -> Result<HttpRequest, RestError> {
        self.build_form(HttpMethod::Post, path, values)
    }

    pub fn build_put(&self, path: &str, values: Option<&Values>) -> Result<HttpRequest, RestError> {
        self.build_form(HttpMethod::Put, path, values)
    }

    /// DELETE resolves like GET but sends `values` as a form body, like PUT.
    pub fn build_delete(&self, path: &str, values: Option<&Values>) -> Result<HttpRequest, RestError> {
        self.build_form(HttpMethod::Delete, path, values)
    }

    /// A write request carrying a caller-built body.
    pub fn build_raw(
        &self,
        method: HttpMethod,
        path: &str,
        body: Vec<u8>,
    ) -> Result<HttpRequest, RestError> {
        let url = self.resolve(path)?;
        let mut headers = Headers::new();
        headers.set("Content-Type", FORM_CONTENT_TYPE);
        Ok(HttpRequest {
            method,
            url,
            headers,
            body: Some(body),
        })
    }

    pub fn build_multipart(
        &self,
        method: HttpMethod,
        path: &str,
        body: MultipartBody,
    ) -> Result<HttpRequest, RestError> {
        let url = self.resolve(path)?;
        let (content_type, buf) = body.into_parts();
        let mut headers = Headers::new();
        headers.set("Content-Type", content_type);
        Ok(HttpRequest {
            method,
            url,
            headers,
            body: Some(buf),
        })
    }

    fn build_form(
        &self,
        method: HttpMethod,
        path: &str,
        values: Option<&Values>,
    ) -> Result<HttpRequest, RestError> {
        let url = self.resolve(path)?;
        let mut headers = Headers::new();
        let body = values.filter(|v| !v.is_empty()).map(|v| v.encode().into_bytes());
        // Delete only announces a form when it actually carries one.
        if method != HttpMethod::Delete || body.is_some() {
            headers.set("Content-Type", FORM_CONTENT_TYPE);
        }
        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }
}

/// Validate `base` and normalize it to end with exactly one `/`.
pub fn normalize_prefix(base: &str) -> Result<String, RestError> {
    let invalid = |reason: String| RestError::InvalidPrefix {
        prefix: base.to_string(),
        reason,
    };
    let url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("address cannot carry paths".to_string()));
    }
    Ok(format!("{}/", base.trim_end_matches('/')))
}
