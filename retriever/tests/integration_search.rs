use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use search_core::persist::{save, IndexPaths};
use search_core::{IndexBuilder, Normalizer};
use serde_json::Value;
use std::fs;
use tempfile::tempdir;
use tower::ServiceExt;

fn build_tiny_index(dir: &std::path::Path) {
    let docs = [
        ("https://example.edu/grado", "<div class=\"page\"><h1>Grado en Informática</h1></div>"),
        ("https://example.edu/master", "<div class=\"page\"><h1>Máster en Informática</h1></div>"),
    ];
    let (index, _) = IndexBuilder::build(Normalizer::default(), docs);
    save(&IndexPaths::new(dir), &index, "2024-01-01T00:00:00Z").unwrap();
}

async fn call(app: Router, uri: &str) -> (StatusCode, Bytes) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

fn app_for(dir: &std::path::Path) -> Router {
    retriever::build_app(dir.to_string_lossy().to_string()).unwrap()
}

#[tokio::test]
async fn search_returns_matches_in_document_order() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());

    let (status, body) = call(app_for(dir.path()), "/search?q=inform%C3%A1tica").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["doc_id"].as_u64().unwrap(), 0);
    assert_eq!(arr[1]["doc_id"].as_u64().unwrap(), 1);
    assert_eq!(arr[0]["url"], "https://example.edu/grado");
    assert_eq!(arr[0]["snippet"], "grado en informática");
    assert_eq!(json["no_results"], false);
}

#[tokio::test]
async fn search_applies_boolean_operators() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());

    let (status, body) = call(app_for(dir.path()), "/search?q=inform%C3%A1tica%20NOT%20m%C3%A1ster").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_hits"], 1);
    assert_eq!(json["results"][0]["url"], "https://example.edu/grado");
}

#[tokio::test]
async fn unknown_term_signals_no_results() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());

    let (status, body) = call(app_for(dir.path()), "/search?q=nosuchterm").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["no_results"], true);
    assert!(json["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn dangling_operator_is_a_bad_request() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());

    let (status, body) = call(app_for(dir.path()), "/search?q=grado%20AND").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8_lossy(&body).contains("AND"));
}

#[test]
fn missing_index_fails_to_load() {
    let dir = tempdir().unwrap();
    assert!(retriever::build_app(dir.path().to_string_lossy().to_string()).is_err());
}

#[test]
fn corrupt_index_fails_to_load() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    fs::write(dir.path().join("index.bin"), b"garbage").unwrap();
    assert!(retriever::Retriever::open(dir.path()).is_err());
}
