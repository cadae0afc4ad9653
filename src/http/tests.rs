//! Tests for the HTTP transport module

use super::*;
use crate::error::Error;
use crate::request::{FormParams, RequestBody, RequestDescriptor};
use crate::types::BackoffType;
use pretty_assertions::assert_eq;
use std::time::Duration;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn quick_client() -> HttpClient {
    let config = HttpClientConfig::builder()
        .no_rate_limit()
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(1),
            Duration::from_millis(5),
        )
        .build();
    HttpClient::with_config(config).unwrap()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.max_retries, 2);
    assert!(config.rate_limit.is_some());
    assert!(config.user_agent.starts_with("pagefill/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_secs(60))
        .max_retries(5)
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(200),
            Duration::from_secs(30),
        )
        .header("X-Custom", "value")
        .header("bad header", "ignored")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.backoff_type, BackoffType::Linear);
    assert_eq!(config.initial_backoff, Duration::from_millis(200));
    assert_eq!(config.max_backoff, Duration::from_secs(30));
    assert_eq!(config.default_headers.len(), 1);
    assert_eq!(config.default_headers.get("x-custom").unwrap(), "value");
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_backoff_calculation() {
    let config = HttpClientConfig::builder()
        .no_rate_limit()
        .backoff(
            BackoffType::Exponential,
            Duration::from_millis(100),
            Duration::from_millis(1000),
        )
        .build();
    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(1), Duration::from_millis(200));
    assert_eq!(client.calculate_backoff(2), Duration::from_millis(400));
    // capped
    assert_eq!(client.calculate_backoff(6), Duration::from_millis(1000));
}

#[test]
fn test_linear_and_constant_backoff() {
    let linear = HttpClient::with_config(
        HttpClientConfig::builder()
            .backoff(
                BackoffType::Linear,
                Duration::from_millis(50),
                Duration::from_secs(1),
            )
            .build(),
    )
    .unwrap();
    assert_eq!(linear.calculate_backoff(2), Duration::from_millis(150));

    let constant = HttpClient::with_config(
        HttpClientConfig::builder()
            .backoff(
                BackoffType::Constant,
                Duration::from_millis(50),
                Duration::from_secs(1),
            )
            .build(),
    )
    .unwrap();
    assert_eq!(constant.calculate_backoff(4), Duration::from_millis(50));
}

#[tokio::test]
async fn test_send_get_with_query_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/_api/transactions"))
        .and(query_param("pageSize", "50"))
        .and(header("x-session", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"id": 1}],
            "total": 1
        })))
        .mount(&mock_server)
        .await;

    let url = format!("{}/_api/transactions?pageSize=50", mock_server.uri());
    let request = RequestDescriptor::get(&url)
        .unwrap()
        .with_header("x-session", "abc")
        .unwrap();

    let response = quick_client().send(&request).await.unwrap();
    assert!(response.is_success());
    assert_eq!(response.json_body().unwrap()["total"], 1);
}

#[tokio::test]
async fn test_send_text_body_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/_api/transactions"))
        .and(body_string(r#"{"pageSize":10000}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/_api/transactions", mock_server.uri());
    let request = RequestDescriptor::post(
        &url,
        RequestBody::Text(r#"{"pageSize":10000}"#.to_string()),
    )
    .unwrap()
    .with_header("content-type", "application/json")
    .unwrap()
    // stale length from the original body must not be forwarded
    .with_header("content-length", "3")
    .unwrap();

    let response = quick_client().send(&request).await.unwrap();
    assert_eq!(response.status.as_u16(), 200);
}

#[tokio::test]
async fn test_send_form_body_urlencoded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("rows=500&q=a+b"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/search", mock_server.uri());
    let params = FormParams::from_pairs([("rows", "500"), ("q", "a b")]);
    let request = RequestDescriptor::post(&url, RequestBody::Form(params)).unwrap();

    let response = quick_client().send(&request).await.unwrap();
    assert!(response.is_success());
}

#[tokio::test]
async fn test_error_status_is_returned_as_snapshot() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/missing", mock_server.uri());
    let request = RequestDescriptor::get(&url).unwrap();

    let response = quick_client().send(&request).await.unwrap();
    assert_eq!(response.status.as_u16(), 404);
    assert!(!response.is_success());
    assert_eq!(&response.body[..], b"Not found");
}

#[tokio::test]
async fn test_retry_on_500() {
    let mock_server = MockServer::start().await;

    // First request fails, second succeeds
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let url = format!("{}/flaky", mock_server.uri());
    let request = RequestDescriptor::get(&url).unwrap();

    let response = quick_client().send(&request).await.unwrap();
    assert!(response.is_success());
}

#[tokio::test]
async fn test_rate_limited_retry_honours_retry_after() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let url = format!("{}/limited", mock_server.uri());
    let request = RequestDescriptor::get(&url).unwrap();

    let response = quick_client().send(&request).await.unwrap();
    assert!(response.is_success());
}

#[tokio::test]
async fn test_retries_exhausted_returns_last_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Server error"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let url = format!("{}/down", mock_server.uri());
    let request = RequestDescriptor::get(&url).unwrap();

    let response = quick_client().send(&request).await.unwrap();
    assert_eq!(response.status.as_u16(), 503);
}

#[tokio::test]
async fn test_connect_failure_is_an_error() {
    let config = HttpClientConfig::builder()
        .no_rate_limit()
        .max_retries(0)
        .build();
    let client = HttpClient::with_config(config).unwrap();
    // port 9 (discard) is not listening in test environments
    let request = RequestDescriptor::get("http://127.0.0.1:9/").unwrap();

    let err = client.send(&request).await.unwrap_err();
    assert!(matches!(err, Error::Http(_)));
}

#[tokio::test]
async fn test_http_client_with_rate_limiter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/paced"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .rate_limit(RateLimiterConfig::new(100, 10))
        .build();
    let client = HttpClient::with_config(config).unwrap();
    assert!(client.has_rate_limiter());

    let url = format!("{}/paced", mock_server.uri());
    let request = RequestDescriptor::get(&url).unwrap();
    for _ in 0..3 {
        let response = client.send(&request).await.unwrap();
        assert!(response.is_success());
    }
}
