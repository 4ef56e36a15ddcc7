//! Mock feed API tests for the Neynar source.
//!
//! These tests use wiremock to simulate the feed API and check pagination,
//! request shape and failure handling without network access.

use castex_core::error::Error;
use castex_core::{ApiKey, ApiUrl, Cursor, FeedFetcher, FeedSource, Fid, PageRequest};
use castex_neynar::{NeynarConfig, NeynarFeed};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CASTS_PATH: &str = "/v2/farcaster/feed/user/casts";

fn mock_feed(server: &MockServer) -> NeynarFeed {
    let base = ApiUrl::new(format!(
        "http://127.0.0.1:{}/v2/farcaster",
        server.address().port()
    ))
    .unwrap();
    NeynarFeed::new(NeynarConfig::new(base, ApiKey::new("test-key"))).unwrap()
}

fn cast(hash: &str) -> Value {
    json!({
        "object": "cast",
        "hash": hash,
        "thread_hash": hash,
        "parent_hash": null,
        "author": {"fid": 3, "username": "dwr", "display_name": "Dan Romero"},
        "text": format!("cast {}", hash),
        "timestamp": "2024-05-01T12:00:00.000Z",
        "embeds": [],
        "reactions": {"likes_count": 2, "recasts_count": 1, "likes": [], "recasts": []},
        "replies": {"count": 0}
    })
}

fn first_page(fid: u64) -> PageRequest {
    PageRequest {
        fid: Fid::new(fid).unwrap(),
        limit: 150,
        include_replies: true,
        cursor: None,
    }
}

// ============================================================================
// Single page requests
// ============================================================================

#[tokio::test]
async fn test_fetch_page_sends_expected_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CASTS_PATH))
        .and(query_param("fid", "3"))
        .and(query_param("limit", "150"))
        .and(query_param("include_replies", "false"))
        .and(header("x-api-key", "test-key"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "casts": [cast("0x1"), cast("0x2")],
            "next": {"cursor": "page-2"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let feed = mock_feed(&server);
    let request = PageRequest {
        include_replies: false,
        ..first_page(3)
    };
    let page = feed.fetch_page(&request).await.unwrap();

    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0].hash(), "0x1");
    assert_eq!(page.records[0].like_count(), 2);
    assert_eq!(page.next_cursor.unwrap().as_str(), "page-2");
}

#[tokio::test]
async fn test_fetch_page_forwards_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CASTS_PATH))
        .and(query_param("cursor", "abc=="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "casts": [cast("0x9")],
            "next": {"cursor": null}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let feed = mock_feed(&server);
    let request = PageRequest {
        cursor: Cursor::from_upstream(Some("abc==".to_string())),
        ..first_page(3)
    };
    let page = feed.fetch_page(&request).await.unwrap();

    assert_eq!(page.records.len(), 1);
    assert!(page.next_cursor.is_none());
}

#[tokio::test]
async fn test_fetch_page_empty_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CASTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let feed = mock_feed(&server);
    let page = feed.fetch_page(&first_page(3)).await.unwrap();

    assert!(page.records.is_empty());
    assert!(page.next_cursor.is_none());
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[tokio::test]
async fn test_error_response_with_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CASTS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "Unauthorized",
            "message": "Invalid API key"
        })))
        .mount(&server)
        .await;

    let feed = mock_feed(&server);
    let err = feed.fetch_page(&first_page(3)).await.unwrap_err();

    match err {
        Error::Protocol(e) => {
            assert_eq!(e.status, 401);
            assert_eq!(e.code.as_deref(), Some("Unauthorized"));
            assert_eq!(e.message.as_deref(), Some("Invalid API key"));
        }
        other => panic!("expected protocol error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_error_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CASTS_PATH))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("Internal Server Error")
                .insert_header("content-type", "text/plain"),
        )
        .mount(&server)
        .await;

    let feed = mock_feed(&server);
    let err = feed.fetch_page(&first_page(3)).await.unwrap_err();

    assert!(err.to_string().contains("500"));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_malformed_success_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CASTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "casts": [{"text": "no hash"}]
        })))
        .mount(&server)
        .await;

    let feed = mock_feed(&server);
    let err = feed.fetch_page(&first_page(3)).await.unwrap_err();

    assert!(matches!(err, Error::Serialization(_)));
}

// ============================================================================
// Pagination through the fetcher
// ============================================================================

#[tokio::test]
async fn test_fetcher_walks_all_pages() {
    let server = MockServer::start().await;

    // Cursor-specific mocks are mounted first so they win over the
    // catch-all first-page mock.
    Mock::given(method("GET"))
        .and(path(CASTS_PATH))
        .and(query_param("cursor", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "casts": [cast("0x3")],
            "next": {"cursor": "c2"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(CASTS_PATH))
        .and(query_param("cursor", "c2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "casts": [cast("0x4"), cast("0x5")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(CASTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "casts": [cast("0x1"), cast("0x2")],
            "next": {"cursor": "c1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = FeedFetcher::new(mock_feed(&server));
    let outcome = fetcher.fetch_all(Fid::new(3).unwrap(), true).await;

    assert!(outcome.is_complete());
    assert_eq!(outcome.pages, 3);
    let hashes: Vec<&str> = outcome.records.iter().map(|r| r.hash()).collect();
    assert_eq!(hashes, vec!["0x1", "0x2", "0x3", "0x4", "0x5"]);
}

#[tokio::test]
async fn test_fetcher_truncates_on_failed_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CASTS_PATH))
        .and(query_param("cursor", "c1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(CASTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "casts": [cast("0x1")],
            "next": {"cursor": "c1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = FeedFetcher::new(mock_feed(&server));
    let outcome = fetcher.fetch_all(Fid::new(3).unwrap(), true).await;

    assert_eq!(outcome.records.len(), 1);
    let truncation = outcome.truncation.unwrap();
    assert_eq!(truncation.page, 2);
    assert!(truncation.reason.contains("503"));
}
