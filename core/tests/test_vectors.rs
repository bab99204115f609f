//! Verify request construction against JSON test vectors stored in `test-vectors/`.
//!
//! Each case names a prefix, a method, a path and form values, and the URL,
//! body and content type the builder must produce.

use rest_core::request::normalize_prefix;
use rest_core::{HttpMethod, HttpRequest, RequestBuilder, Values};

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn build(builder: &RequestBuilder<'_>, method: HttpMethod, path: &str, values: &Values) -> HttpRequest {
    let result = match method {
        HttpMethod::Get => builder.build_get(path, Some(values)),
        HttpMethod::Post => builder.build_post(path, Some(values)),
        HttpMethod::Put => builder.build_put(path, Some(values)),
        HttpMethod::Delete => builder.build_delete(path, Some(values)),
    };
    result.unwrap()
}

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let prefix = normalize_prefix(case["prefix"].as_str().unwrap()).unwrap();
        assert!(prefix.ends_with('/') && !prefix.ends_with("//"), "{name}: prefix {prefix}");

        let values: Values = case["values"]
            .as_array()
            .unwrap()
            .iter()
            .map(|pair| {
                let arr = pair.as_array().unwrap();
                (arr[0].as_str().unwrap(), arr[1].as_str().unwrap())
            })
            .collect();

        let method = parse_method(case["method"].as_str().unwrap());
        let req = build(&RequestBuilder::new(&prefix), method, case["path"].as_str().unwrap(), &values);

        assert_eq!(req.method, method, "{name}: method");
        assert_eq!(req.url.as_str(), case["expected_url"].as_str().unwrap(), "{name}: url");

        let body = req.body.as_deref().map(|b| std::str::from_utf8(b).unwrap());
        assert_eq!(body, case["expected_body"].as_str(), "{name}: body");
        assert_eq!(
            req.headers.get("content-type"),
            case["expected_content_type"].as_str(),
            "{name}: content type"
        );
    }
}
