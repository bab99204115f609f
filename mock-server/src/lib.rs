use std::collections::BTreeMap;
use std::io::Write;

use axum::{
    body::Bytes,
    extract::Multipart,
    extract::multipart::MultipartError,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, get, post},
    Json, Router,
};
use flate2::{write::GzEncoder, Compression};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// Session cookie handed out by `/login`.
pub const SESSION_COOKIE: &str = "session=abc123";

/// Token returned in the `X-Session-Token` header by `/login`.
pub const SESSION_TOKEN: &str = "tok-5f2b9c";

/// What `/echo` observed about a request.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EchoReport {
    pub method: String,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub form: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body_len: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content: String,
}

/// What `/upload` observed about a multipart request.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct UploadReport {
    pub method: String,
    pub fields: BTreeMap<String, String>,
    pub files: Vec<UploadedFile>,
}

pub const GREETING_JSON: &str = r#"{"message":"hello","count":3}"#;

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/search", any(echo))
        .route("/upload", post(upload).put(upload))
        .route("/json", get(json))
        .route("/json/gzip", get(json_gzip))
        .route("/text", get(text))
        .route("/list", get(list))
        .route("/login", get(login))
        .route("/whoami", get(whoami))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn parse_pairs(raw: &[u8]) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(raw).into_owned().collect()
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<EchoReport> {
    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));

    Json(EchoReport {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: parse_pairs(uri.query().unwrap_or_default().as_bytes()),
        form: if is_form { parse_pairs(&body) } else { BTreeMap::new() },
        headers: headers
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body_len: body.len(),
    })
}

async fn upload(method: Method, mut multipart: Multipart) -> Result<Json<UploadReport>, MultipartError> {
    let mut report = UploadReport {
        method: method.to_string(),
        ..UploadReport::default()
    };
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await?;
        let content = String::from_utf8_lossy(&data).into_owned();
        match file_name {
            Some(file_name) => report.files.push(UploadedFile {
                field: name,
                file_name,
                content,
            }),
            None => {
                report.fields.insert(name, content);
            }
        }
    }
    Ok(Json(report))
}

async fn json() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], GREETING_JSON)
}

async fn json_gzip() -> Result<impl IntoResponse, StatusCode> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(GREETING_JSON.as_bytes())
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let compressed = encoder.finish().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CONTENT_ENCODING, "gzip"),
        ],
        compressed,
    ))
}

async fn text() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], "hello world")
}

async fn list() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], r#"[1,"two",true]"#)
}

/// Requires basic auth; answers with a cookie and a token header, no body.
async fn login(headers: HeaderMap) -> Result<impl IntoResponse, StatusCode> {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));
    if !authorized {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok((
        [
            (
                header::SET_COOKIE,
                format!("{SESSION_COOKIE}; Path=/; HttpOnly; Max-Age=3600"),
            ),
            (
                header::HeaderName::from_static("x-session-token"),
                SESSION_TOKEN.to_string(),
            ),
        ],
        StatusCode::OK,
    ))
}

/// Echoes the `Cookie` header as plain text.
async fn whoami(headers: HeaderMap) -> impl IntoResponse {
    let cookie = headers
        .get(header::COOKIE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default();
    ([(header::CONTENT_TYPE, "text/plain")], cookie)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pairs_decodes_plus_as_space() {
        let pairs = parse_pairs(b"foo=the+quick&bar=brown%20fox");
        assert_eq!(pairs["foo"], "the quick");
        assert_eq!(pairs["bar"], "brown fox");
    }

    #[test]
    fn echo_report_roundtrips_through_json() {
        let report = EchoReport {
            method: "GET".to_string(),
            path: "/echo".to_string(),
            ..EchoReport::default()
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: EchoReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn greeting_is_valid_json() {
        let value: serde_json::Value = serde_json::from_str(GREETING_JSON).unwrap();
        assert_eq!(value["message"], "hello");
    }
}
