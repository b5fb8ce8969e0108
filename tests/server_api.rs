//! HTTP contract tests against a router built from an on-disk snapshot.

#![cfg(feature = "server")]

use std::fs;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use ncosearch::{ServerConfig, ServerState, SemanticConfig, build_router, build_snapshot_file};
use serde_json::{Value, json};
use tower::ServiceExt;

const OCCUPATIONS_TXT: &str = "\
Occupation_1: Software Developer; researches, designs and writes computer programs

Occupation_2: Gardener; cultivates flowers, vegetables and ornamental plants

Occupation_3: Sewing Machine Operator; operates machines that stitch garments
";

async fn app(dir: &tempfile::TempDir) -> Router {
    let input = dir.path().join("occupations.txt");
    fs::write(&input, OCCUPATIONS_TXT).expect("write occupations");
    let snapshot_path = dir.path().join("nco.snap");
    build_snapshot_file(&input, &snapshot_path, &SemanticConfig::stub("accurate"), 16)
        .await
        .expect("build snapshot");

    let config = ServerConfig {
        snapshot_path,
        semantic: SemanticConfig::stub("accurate"),
        ..ServerConfig::default()
    };
    let state = ServerState::from_config(config).await.expect("state");
    build_router(Arc::new(state))
}

async fn post_search(app: Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn search_contract() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = post_search(app(&dir).await, json!({"query": "software engineer"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "software engineer");
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);

    let top = &results[0];
    assert_eq!(
        top["name"],
        "Software Developer; researches, designs and writes computer programs"
    );
    assert_eq!(top["full_description"], top["name"]);
    let confidence = top["confidence"].as_f64().unwrap();
    assert!(confidence > 50.0 && confidence <= 100.0);
}

#[tokio::test]
async fn top_k_limits_results() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) =
        post_search(app(&dir).await, json!({"query": "sewing machine operator", "top_k": 1}))
            .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0]["name"].as_str().unwrap().starts_with("Sewing Machine Operator"));
}

#[tokio::test]
async fn empty_query_returns_400() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = post_search(app(&dir).await, json!({"query": ""})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No query provided");
}

#[tokio::test]
async fn readiness_reports_loaded_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let response = app(&dir).await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["components"]["store"]["occupations"], 3);
    assert_eq!(body["components"]["store"]["dimension"], 1024);
    assert_eq!(body["components"]["store"]["model"], "stub-accurate");
}

#[tokio::test]
async fn server_state_fails_on_missing_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        snapshot_path: dir.path().join("missing.snap"),
        semantic: SemanticConfig::stub("fast"),
        ..ServerConfig::default()
    };
    assert!(ServerState::from_config(config).await.is_err());
}
