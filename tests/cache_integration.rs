//! Integration tests for cache behavior through the public fetch API.

use std::path::Path;
use std::time::Duration;

use fetcher_core::{Fetcher, FetcherConfig, GetOptions};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_fetcher(cache_dir: &Path) -> Fetcher {
    Fetcher::with_config(FetcherConfig {
        delay_range: (0.0, 0.0),
        cache_dir: cache_dir.to_path_buf(),
        ..FetcherConfig::default()
    })
    .expect("fetcher config should be valid")
}

#[tokio::test]
async fn test_cache_entry_persists_expected_json_fields() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("body text"))
        .mount(&mock_server)
        .await;

    let fetcher = test_fetcher(temp_dir.path());
    let url = format!("{}/page", mock_server.uri());
    fetcher.get(&url).await.expect("GET should succeed");

    let entry_path = fetcher.cache().entry_path(&url);
    let content = std::fs::read_to_string(&entry_path).expect("entry file should exist");
    let value: serde_json::Value = serde_json::from_str(&content).expect("entry should be JSON");

    assert_eq!(value["url"], url.as_str());
    assert_eq!(value["data"], "body text");
    let timestamp = value["timestamp"].as_str().expect("timestamp string");
    assert!(
        chrono::DateTime::parse_from_rfc3339(timestamp).is_ok(),
        "Timestamp should be RFC 3339, got: {timestamp}"
    );
}

#[tokio::test]
async fn test_malformed_cache_entry_degrades_to_network() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fresh body"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = test_fetcher(temp_dir.path());
    let url = format!("{}/page", mock_server.uri());

    // Seed a damaged entry file where the cache expects this URL
    std::fs::create_dir_all(temp_dir.path()).expect("create cache dir");
    std::fs::write(fetcher.cache().entry_path(&url), "{damaged").expect("seed entry");

    let body = fetcher.get(&url).await.expect("GET should fall through");
    assert_eq!(body, "fresh body");
}

#[tokio::test]
async fn test_expired_entry_is_refetched_and_overwritten() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("served"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let fetcher = test_fetcher(temp_dir.path());
    let url = format!("{}/page", mock_server.uri());
    let options = GetOptions {
        max_cache_age: Duration::ZERO,
        ..GetOptions::default()
    };

    fetcher.get_with(&url, &options).await.expect("first GET");

    let entry_path = fetcher.cache().entry_path(&url);
    assert!(entry_path.exists(), "First GET should write an entry");

    // Expired entry is ignored but not deleted; the refetch overwrites it
    fetcher.get_with(&url, &options).await.expect("second GET");
    assert!(entry_path.exists(), "Entry should still exist after expiry");
}

#[tokio::test]
async fn test_cache_is_shared_across_instances() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("once"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/page", mock_server.uri());

    let first = test_fetcher(temp_dir.path());
    first.get(&url).await.expect("first GET");

    // A second fetcher over the same directory reads the first one's entry
    let second = test_fetcher(temp_dir.path());
    let body = second.get(&url).await.expect("cached GET");
    assert_eq!(body, "once");
}

#[tokio::test]
async fn test_distinct_urls_get_distinct_entries() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("body a"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string("body b"))
        .mount(&mock_server)
        .await;

    let fetcher = test_fetcher(temp_dir.path());
    let url_a = format!("{}/a", mock_server.uri());
    let url_b = format!("{}/b", mock_server.uri());

    fetcher.get(&url_a).await.expect("GET a");
    fetcher.get(&url_b).await.expect("GET b");

    assert_eq!(fetcher.get(&url_a).await.as_deref().ok(), Some("body a"));
    assert_eq!(fetcher.get(&url_b).await.as_deref().ok(), Some("body b"));
    assert_ne!(
        fetcher.cache().entry_path(&url_a),
        fetcher.cache().entry_path(&url_b)
    );
}
