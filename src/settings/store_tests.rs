//! Tests for SettingsStore

use super::*;
use crate::error::Error;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::tempdir;

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_in_memory_store() {
    let store = SettingsStore::in_memory(50);
    assert!(store.is_in_memory());
    assert_eq!(store.default_page_size(), 50);
}

#[tokio::test]
async fn test_missing_file_reads_default() {
    let dir = tempdir().unwrap();
    let store = SettingsStore::open(dir.path().join("settings.json"), 50).unwrap();

    assert!(!store.is_in_memory());
    assert_eq!(store.desired_page_size().await, 50);
    assert!(store.snapshot().await.is_empty());
}

// ============================================================================
// Value Tests
// ============================================================================

#[tokio::test]
async fn test_set_and_get_in_memory() {
    let store = SettingsStore::in_memory(50);
    store.set_desired_page_size(10_000).await.unwrap();
    assert_eq!(store.desired_page_size().await, 10_000);
}

#[tokio::test]
async fn test_zero_is_rejected() {
    let store = SettingsStore::in_memory(50);
    let err = store.set_desired_page_size(0).await.unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));
    assert_eq!(store.desired_page_size().await, 50);
}

#[test]
fn test_unusable_values_read_as_absent() {
    for value in [json!(0), json!(-5), json!("lots"), json!(12.5), json!(null)] {
        let settings: Settings =
            serde_json::from_value(json!({ DESIRED_PAGE_SIZE_KEY: value })).unwrap();
        assert_eq!(settings.desired_page_size(), None, "value {value}");
    }

    let settings: Settings =
        serde_json::from_value(json!({ DESIRED_PAGE_SIZE_KEY: "10000" })).unwrap();
    assert_eq!(settings.desired_page_size(), Some(10_000));
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_value_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let store = SettingsStore::open(&path, 50).unwrap();
    store.set_desired_page_size(10_000).await.unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());

    let reopened = SettingsStore::open(&path, 50).unwrap();
    assert_eq!(reopened.desired_page_size().await, 10_000);
}

#[tokio::test]
async fn test_save_creates_parent_directory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");

    let store = SettingsStore::open(&path, 50).unwrap();
    store.set_desired_page_size(200).await.unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn test_unknown_keys_are_preserved() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"theme": "dark", "desired_page_size": 25}"#).unwrap();

    let store = SettingsStore::open(&path, 50).unwrap();
    assert_eq!(store.desired_page_size().await, 25);
    store.set_desired_page_size(10_000).await.unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["theme"], "dark");
    assert_eq!(written["desired_page_size"], 10_000);
}

#[tokio::test]
async fn test_corrupt_file_falls_back_to_default() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{not json").unwrap();

    let store = SettingsStore::open(&path, 50).unwrap();
    assert_eq!(store.desired_page_size().await, 50);
}

#[tokio::test]
async fn test_reload_picks_up_external_changes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let store = SettingsStore::open(&path, 50).unwrap();
    std::fs::write(&path, r#"{"desired_page_size": 300}"#).unwrap();
    assert_eq!(store.desired_page_size().await, 50);

    store.reload().await.unwrap();
    assert_eq!(store.desired_page_size().await, 300);
}

#[tokio::test]
async fn test_clones_share_state() {
    let store = SettingsStore::in_memory(50);
    let other = store.clone();
    store.set_desired_page_size(75).await.unwrap();
    assert_eq!(other.desired_page_size().await, 75);
}
