//! Tests for request and response snapshots

use super::*;
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::json;

// ============================================================================
// FormParams Tests
// ============================================================================

#[test]
fn test_form_params_parse_and_get() {
    let params = FormParams::parse("page=2&limit=50&q=a+b");
    assert_eq!(params.get("page"), Some("2"));
    assert_eq!(params.get("limit"), Some("50"));
    assert_eq!(params.get("q"), Some("a b"));
    assert_eq!(params.get("missing"), None);
    assert!(params.has("page"));
    assert_eq!(params.len(), 3);
}

#[test]
fn test_form_params_set_collapses_duplicates() {
    let mut params = FormParams::parse("a=1&b=2&a=3&c=4");
    params.set("a", "9");
    assert_eq!(params.to_urlencoded(), "a=9&b=2&c=4");

    params.set("d", "5");
    assert_eq!(params.to_urlencoded(), "a=9&b=2&c=4&d=5");
}

#[test]
fn test_form_params_urlencoded_round_trip() {
    let mut params = FormParams::new();
    params.append("range", "[0,49]");
    params.append("filter", "{\"type\":\"sale\"}");

    let text = params.to_urlencoded();
    assert_eq!(FormParams::parse(&text), params);
}

// ============================================================================
// RequestBody Tests
// ============================================================================

#[test]
fn test_body_parse_json() {
    let body = RequestBody::Text(r#"{"limit": 50}"#.to_string());
    assert_eq!(body.parse(), Some(ParsedBody::Json(json!({"limit": 50}))));
}

#[test]
fn test_body_parse_invalid_json_is_none() {
    let body = RequestBody::Text("{not json".to_string());
    assert_eq!(body.parse(), None);
}

#[test]
fn test_body_parse_form_text() {
    let body = RequestBody::Text("page=1&per_page=25".to_string());
    match body.parse() {
        Some(ParsedBody::Params(params)) => assert_eq!(params.get("per_page"), Some("25")),
        other => panic!("Expected params, got {other:?}"),
    }
}

#[test]
fn test_body_parse_binary_is_none() {
    let body = RequestBody::Binary(bytes::Bytes::from_static(&[0, 1, 2]));
    assert_eq!(body.parse(), None);
}

#[test]
fn test_body_to_text() {
    let form = RequestBody::Fields(FormParams::from_pairs([("take", "10")]));
    assert_eq!(form.to_text(), Some("take=10".to_string()));
}

// ============================================================================
// RequestDescriptor Tests
// ============================================================================

#[test]
fn test_descriptor_query_access() {
    let mut request =
        RequestDescriptor::get("https://api.example.com/_api/transactions?page=1&limit=50")
            .unwrap();
    assert_eq!(request.query_param("limit"), Some("50".to_string()));

    let mut params = request.query_params();
    params.set("limit", "100");
    request.set_query_params(&params);
    assert_eq!(request.query_param("limit"), Some("100".to_string()));
    assert_eq!(request.query_param("page"), Some("1".to_string()));
}

#[test]
fn test_descriptor_headers_case_insensitive() {
    let request = RequestDescriptor::get("https://api.example.com/x")
        .unwrap()
        .with_header("Range", "items=0-9")
        .unwrap();
    assert_eq!(request.header("range"), Some("items=0-9"));
}

#[test]
fn test_descriptor_rejects_bad_header() {
    let result = RequestDescriptor::get("https://api.example.com/x")
        .unwrap()
        .with_header("bad header", "x");
    assert!(result.is_err());
}

#[test]
fn test_descriptor_allows_body() {
    let get = RequestDescriptor::get("https://api.example.com/x").unwrap();
    assert!(!get.allows_body());
    let post = RequestDescriptor::post(
        "https://api.example.com/x",
        RequestBody::Text("{}".to_string()),
    )
    .unwrap();
    assert!(post.allows_body());
}

// ============================================================================
// ResponseSnapshot Tests
// ============================================================================

#[test]
fn test_response_json_body() {
    let response = ResponseSnapshot::json(&json!({"data": [1, 2]}));
    assert!(response.is_success());
    assert_eq!(response.json_body(), Some(json!({"data": [1, 2]})));
    assert_eq!(response.header("content-type"), Some("application/json"));
}

#[test]
fn test_response_with_json_body_drops_length() {
    let response = ResponseSnapshot::json(&json!([1]))
        .with_header("content-length", "3")
        .with_json_body(&json!([1, 2, 3]));
    assert_eq!(response.header("content-length"), None);
    assert_eq!(response.json_body(), Some(json!([1, 2, 3])));
}

#[test]
fn test_response_non_json_body() {
    let response = ResponseSnapshot::new(
        StatusCode::BAD_GATEWAY,
        reqwest::header::HeaderMap::new(),
        "upstream down",
    );
    assert!(!response.is_success());
    assert_eq!(response.json_body(), None);
}
