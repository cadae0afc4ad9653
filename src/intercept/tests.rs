//! Tests for the interception middleware

use super::*;
use crate::config::EngineConfig;
use crate::engine::StopReason;
use crate::error::Error;
use crate::http::testing::{connect_error, status, ScriptedBackend};
use crate::http::Transport;
use crate::request::{RequestDescriptor, ResponseSnapshot};
use crate::settings::SettingsStore;
use pretty_assertions::assert_eq;
use serde_json::json;

const LIST_URL: &str = "https://authors.example.com/_api/transactions";

/// Page-index backend capping pages at 50 records out of 120
fn capped_backend() -> ScriptedBackend {
    ScriptedBackend::new(|request, _| {
        let page: usize = request
            .query_param("page")
            .and_then(|p| p.parse().ok())
            .unwrap_or(1);
        let start = ((page - 1) * 50).min(120);
        let end = (start + 50).min(120);
        let items: Vec<_> = (start..end).map(|i| json!({"id": i})).collect();
        Ok(ResponseSnapshot::json(&json!({"data": items, "total": 120})))
    })
}

async fn interceptor(backend: ScriptedBackend, desired: Option<u64>) -> Interceptor<ScriptedBackend> {
    let settings = SettingsStore::in_memory(50);
    if let Some(desired) = desired {
        settings.set_desired_page_size(desired).await.unwrap();
    }
    Interceptor::new(backend, EngineConfig::default(), settings).unwrap()
}

fn list_request(query: &str) -> RequestDescriptor {
    RequestDescriptor::get(&format!("{LIST_URL}?{query}")).unwrap()
}

#[tokio::test]
async fn test_out_of_scope_request_is_forwarded_untouched() {
    let interceptor = interceptor(capped_backend(), Some(10_000)).await;
    let request =
        RequestDescriptor::get("https://authors.example.com/_api/projects?pageSize=50").unwrap();

    interceptor.handle(&request).await.unwrap();

    assert_eq!(interceptor.transport().requests(), vec![request]);
    assert!(interceptor.last_request().await.is_none());
    assert!(interceptor.last_summary().await.is_none());
}

#[tokio::test]
async fn test_disabled_gate_forwards_but_captures() {
    let interceptor = interceptor(capped_backend(), None).await;
    assert!(!interceptor.is_enabled().await);
    let request = list_request("page=1&pageSize=50");

    let response = interceptor.handle(&request).await.unwrap();

    assert_eq!(interceptor.transport().requests(), vec![request.clone()]);
    assert_eq!(response.json_body().unwrap()["data"].as_array().unwrap().len(), 50);
    assert_eq!(interceptor.last_request().await.unwrap().request, request);

    let payload = interceptor.last_payload().await.unwrap();
    assert_eq!(payload.items.len(), 50);
    assert_eq!(payload.total, 120);
    assert!(!payload.is_complete());
    assert!(interceptor.last_summary().await.is_none());
}

#[tokio::test]
async fn test_enabled_gate_enlarges_and_merges() {
    let interceptor = interceptor(capped_backend(), Some(10_000)).await;
    assert!(interceptor.is_enabled().await);

    let request = list_request("page=1&pageSize=50");
    let response = interceptor.handle(&request).await.unwrap();

    let body = response.json_body().unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 120);
    assert_eq!(body["total"], 120);

    let sent = interceptor.transport().requests();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0].query_param("pageSize").as_deref(), Some("10000"));
    assert_eq!(sent[2].query_param("page").as_deref(), Some("3"));

    let summary = interceptor.last_summary().await.unwrap();
    assert_eq!(summary.total, Some(120));
    assert_eq!(summary.loaded, 120);
    assert_eq!(summary.pages_fetched, 3);
    assert_eq!(summary.stop_reason, StopReason::TotalReached);

    // the caller's request is what gets replayed, not the enlarged one
    assert_eq!(interceptor.last_request().await.unwrap().request, request);
    assert!(interceptor.last_payload().await.unwrap().is_complete());
}

#[tokio::test]
async fn test_unpaginated_list_request_is_forwarded() {
    let interceptor = interceptor(capped_backend(), Some(10_000)).await;
    let request = list_request("status=paid");

    interceptor.handle(&request).await.unwrap();

    assert_eq!(interceptor.transport().requests(), vec![request.clone()]);
    assert_eq!(interceptor.last_request().await.unwrap().request, request);
}

#[tokio::test]
async fn test_threshold_gates_enlargement() {
    let interceptor = interceptor(capped_backend(), Some(9_999)).await;
    assert!(!interceptor.is_enabled().await);

    interceptor.settings().set_desired_page_size(10_000).await.unwrap();
    assert!(interceptor.is_enabled().await);
}

#[tokio::test]
async fn test_initial_failure_is_an_error() {
    let backend = ScriptedBackend::new(|_, _| Err(connect_error()));
    let interceptor = interceptor(backend, Some(10_000)).await;

    let err = interceptor
        .handle(&list_request("page=1&pageSize=50"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Other(_)));
    assert!(interceptor.last_summary().await.is_none());
    // still captured for a later export attempt
    assert!(interceptor.last_request().await.is_some());
}

#[tokio::test]
async fn test_error_status_is_passed_back() {
    let backend = ScriptedBackend::new(|_, _| Ok(status(503)));
    let interceptor = interceptor(backend, Some(10_000)).await;

    let response = interceptor
        .handle(&list_request("page=1&pageSize=50"))
        .await
        .unwrap();
    assert_eq!(response.status.as_u16(), 503);
    assert_eq!(interceptor.transport().calls(), 1);
    assert!(interceptor.last_payload().await.is_none());
}

#[tokio::test]
async fn test_interceptor_is_a_transport() {
    let interceptor = interceptor(capped_backend(), Some(10_000)).await;
    let transport: &dyn Transport = &interceptor;

    let response = transport.send(&list_request("page=1&pageSize=50")).await.unwrap();
    assert_eq!(response.json_body().unwrap()["data"].as_array().unwrap().len(), 120);
}

#[tokio::test]
async fn test_clones_share_cells() {
    let interceptor = interceptor(capped_backend(), Some(10_000)).await;
    let clone = interceptor.clone();

    interceptor
        .handle(&list_request("page=1&pageSize=50"))
        .await
        .unwrap();
    assert!(clone.last_summary().await.is_some());
}

#[test]
fn test_captured_payload_total_defaults_to_item_count() {
    let payload = CapturedPayload::new(vec![json!({"id": 1}), json!({"id": 2})], None);
    assert_eq!(payload.total, 2);
    assert!(payload.is_complete());
}
