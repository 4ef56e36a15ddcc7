//! CLI integration tests against a mock feed and a directory store.

mod common;

use std::path::Path;

use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{cast, run_cli_async, stderr, stdout};

const CASTS_PATH: &str = "/v2/farcaster/feed/user/casts";

fn api_base(server: &MockServer) -> String {
    format!("http://127.0.0.1:{}/v2/farcaster", server.address().port())
}

fn exported_files(dir: &Path) -> Vec<std::path::PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

async fn mount_two_pages(server: &MockServer) {
    // Specific cursor first so the catch-all does not shadow it.
    Mock::given(method("GET"))
        .and(path(CASTS_PATH))
        .and(query_param("cursor", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "casts": [cast("0x3")],
            "next": {"cursor": null}
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(CASTS_PATH))
        .and(query_param("fid", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "casts": [cast("0x1"), cast("0x2")],
            "next": {"cursor": "page-2"}
        })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_csv_to_directory() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;
    let temp_dir = TempDir::new().unwrap();
    let out_dir = temp_dir.path().join("out");
    let base = api_base(&server);

    let output = run_cli_async(&[
        "export",
        "3",
        "--format",
        "csv",
        "--store",
        "file",
        "--out-dir",
        out_dir.to_str().unwrap(),
        "--api-base",
        &base,
        "--api-key",
        "test-key",
    ])
    .await;

    assert!(output.status.success(), "Export failed: {}", stderr(&output));
    let stdout = stdout(&output);
    assert!(stdout.contains("URL: file://"));
    assert!(stdout.contains("Casts: 3"));

    let files = exported_files(&out_dir);
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("farcaster-casts-3-"));
    assert!(name.ends_with(".csv"));

    let csv = std::fs::read_to_string(&files[0]).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.contains("\"cast 0x3\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_json_with_public_base() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CASTS_PATH))
        .and(query_param("include_replies", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "casts": [cast("0x1")],
            "next": null
        })))
        .expect(1)
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let base = api_base(&server);

    let output = run_cli_async(&[
        "export",
        "3",
        "--no-replies",
        "--store",
        "file",
        "--out-dir",
        temp_dir.path().to_str().unwrap(),
        "--public-base",
        "https://cdn.example.com/casts",
        "--api-base",
        &base,
        "--api-key",
        "test-key",
    ])
    .await;

    assert!(output.status.success(), "Export failed: {}", stderr(&output));
    assert!(stdout(&output).contains("URL: https://cdn.example.com/casts/farcaster-casts-3-"));

    let files = exported_files(temp_dir.path());
    assert_eq!(files.len(), 1);
    let manifest: Value = serde_json::from_slice(&std::fs::read(&files[0]).unwrap()).unwrap();
    assert_eq!(manifest["metadata"]["fid"], 3);
    assert_eq!(manifest["metadata"]["count"], 1);
    assert_eq!(manifest["metadata"]["includeReplies"], false);
    assert_eq!(manifest["metadata"]["truncated"], false);
    assert_eq!(manifest["casts"][0]["hash"], "0x1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_invalid_fid_makes_no_requests() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let base = api_base(&server);

    let output = run_cli_async(&[
        "export",
        "abc",
        "--store",
        "file",
        "--out-dir",
        temp_dir.path().to_str().unwrap(),
        "--api-base",
        &base,
        "--api-key",
        "test-key",
    ])
    .await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid FID"));
    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(exported_files(temp_dir.path()).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_invalid_format_rejected() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let base = api_base(&server);

    let output = run_cli_async(&[
        "export",
        "3",
        "--format",
        "xml",
        "--store",
        "file",
        "--out-dir",
        temp_dir.path().to_str().unwrap(),
        "--api-base",
        &base,
        "--api-key",
        "test-key",
    ])
    .await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid format"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_publishes_truncated_feed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CASTS_PATH))
        .and(query_param("cursor", "page-2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CASTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "casts": [cast("0x1")],
            "next": {"cursor": "page-2"}
        })))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let base = api_base(&server);

    let output = run_cli_async(&[
        "export",
        "3",
        "--store",
        "file",
        "--out-dir",
        temp_dir.path().to_str().unwrap(),
        "--api-base",
        &base,
        "--api-key",
        "test-key",
    ])
    .await;

    assert!(output.status.success(), "Export failed: {}", stderr(&output));
    assert!(stdout(&output).contains("Casts: 1"));
    assert!(stderr(&output).contains("truncated"));

    let files = exported_files(temp_dir.path());
    let manifest: Value = serde_json::from_slice(&std::fs::read(&files[0]).unwrap()).unwrap();
    assert_eq!(manifest["metadata"]["truncated"], true);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_fail_on_truncation_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CASTS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let base = api_base(&server);

    let output = run_cli_async(&[
        "export",
        "3",
        "--fail-on-truncation",
        "--store",
        "file",
        "--out-dir",
        temp_dir.path().to_str().unwrap(),
        "--api-base",
        &base,
        "--api-key",
        "test-key",
    ])
    .await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Export failed"));
    assert!(exported_files(temp_dir.path()).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_s3_requires_bucket() {
    let server = MockServer::start().await;
    let base = api_base(&server);

    let output = run_cli_async(&["export", "3", "--api-base", &base, "--api-key", "test-key"]).await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("S3_BUCKET"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_prints_json_lines() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;
    let base = api_base(&server);

    let output = run_cli_async(&["fetch", "3", "--api-base", &base, "--api-key", "test-key"]).await;

    assert!(output.status.success(), "Fetch failed: {}", stderr(&output));
    let hashes: Vec<String> = stdout(&output)
        .lines()
        .map(|line| {
            let record: Value = serde_json::from_str(line).unwrap();
            record["hash"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(hashes, ["0x1", "0x2", "0x3"]);
    assert!(stderr(&output).contains("3 casts in 2 pages"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_version_flag() {
    let output = run_cli_async(&["--version"]).await;

    assert!(output.status.success());
    assert!(stdout(&output).starts_with("castex "));
}
