//! Cross-module scenarios: two editors working on one whiteboard.

use crate::document::parse;
use crate::merge::{DocumentMerger, MergeResolution};
use crate::protocol::{decode, encode, SetWhiteboardRequest, GET_PATH, SET_PATH};
use crate::server::{app, ServerConfig, WhiteboardService};
use crate::store::{CachedStore, InMemoryStore, WhiteboardStore};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tower::ServiceExt;

fn board(cells: &[(&str, &str)]) -> String {
    let body: String = cells
        .iter()
        .map(|(id, value)| format!(r#"<mxCell id="{}" parent="1" value="{}" vertex="1"/>"#, id, value))
        .collect();
    format!(
        r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/>{}</root></mxGraphModel>"#,
        body
    )
}

fn cell_ids(document: &str) -> Vec<String> {
    parse(document)
        .unwrap()
        .iter()
        .map(|c| c.id().to_string())
        .collect()
}

async fn call(app: &Router, path: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_two_editors_over_http() {
    let app = app(InMemoryStore::new(), &ServerConfig::default()).unwrap();

    let (status, loaded) = call(&app, GET_PATH, serde_json::json!({"identifier": "team"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded["version"], 1);

    // Editor one draws the base shapes.
    let base = board(&[("A", "start"), ("B", "end")]);
    let (_, saved) = call(
        &app,
        SET_PATH,
        serde_json::json!({
            "identifier": "team",
            "sourceWhiteboardVersion": 1,
            "content": encode(&base).unwrap(),
        }),
    )
    .await;
    assert_eq!(saved["currentNewestWhiteboardVersion"], 2);

    // Both editors now work from version 2.
    let first = board(&[("A", "start"), ("B", "end"), ("C", "note")]);
    let second = board(&[("A", "start"), ("D", "step"), ("B", "end")]);
    let (_, after_first) = call(
        &app,
        SET_PATH,
        serde_json::json!({
            "identifier": "team",
            "sourceWhiteboardVersion": 2,
            "content": encode(&first).unwrap(),
        }),
    )
    .await;
    assert_eq!(after_first["currentNewestWhiteboardVersion"], 3);

    let (status, after_second) = call(
        &app,
        SET_PATH,
        serde_json::json!({
            "identifier": "team",
            "sourceWhiteboardVersion": 2,
            "content": encode(&second).unwrap(),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after_second["existingNewestWhiteboardVersion"], 3);
    assert_eq!(after_second["currentNewestWhiteboardVersion"], 4);

    let merged = decode(after_second["content"].as_str().unwrap()).unwrap();
    let ids = cell_ids(&merged);
    for id in ["0", "1", "A", "B", "C", "D"] {
        assert_eq!(ids.iter().filter(|i| i.as_str() == id).count(), 1, "cell {}", id);
    }

    let (_, reloaded) = call(&app, GET_PATH, serde_json::json!({"identifier": "team"})).await;
    assert_eq!(reloaded["version"], 4);
    assert_eq!(reloaded["content"], after_second["content"]);
}

#[tokio::test]
async fn test_conflicting_edit_new_wins_over_http() {
    let app = app(InMemoryStore::new(), &ServerConfig::default()).unwrap();
    let set = |source: u64, document: String| {
        serde_json::json!({
            "identifier": "doc",
            "sourceWhiteboardVersion": source,
            "content": encode(&document).unwrap(),
        })
    };

    call(&app, SET_PATH, set(1, board(&[("A", "v0")]))).await;
    call(&app, SET_PATH, set(2, board(&[("A", "old")]))).await;
    let (_, response) = call(&app, SET_PATH, set(2, board(&[("A", "new")]))).await;

    let merged = decode(response["content"].as_str().unwrap()).unwrap();
    assert!(merged.contains(r#"value="new""#));
    assert!(!merged.contains(r#"value="old""#));
    assert_eq!(cell_ids(&merged), vec!["0", "1", "A"]);
}

#[tokio::test]
async fn test_concurrent_first_touch_creates_one_record() {
    let store = InMemoryStore::new();
    let service = WhiteboardService::new(Arc::new(store.clone()));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.fetch("fresh").await })
        })
        .collect();
    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.version, 1);
        assert_eq!(response.content, "");
    }
    assert_eq!(store.versions("fresh"), vec![1]);
}

#[tokio::test]
async fn test_merge_path_through_cache() {
    let inner = InMemoryStore::new();
    let cached = CachedStore::new(inner.clone(), NonZeroUsize::new(8).unwrap());
    let service = WhiteboardService::new(Arc::new(cached));
    let update = |source: u64, document: &str| SetWhiteboardRequest {
        api_version: None,
        identifier: "doc".to_string(),
        source_version: Some(source),
        content: encode(document).unwrap(),
    };

    let base = board(&[("A", "")]);
    let old = board(&[("A", ""), ("B", "")]);
    let new = board(&[("C", ""), ("A", "")]);
    service.update(update(1, &base)).await.unwrap();
    service.update(update(2, &old)).await.unwrap();
    let response = service.update(update(2, &new)).await.unwrap();

    let expected = DocumentMerger::new().merge(&base, &old, &new).unwrap();
    assert_eq!(expected.resolution, MergeResolution::Combined);
    assert_eq!(decode(&response.content).unwrap(), expected.content);
    assert_eq!(inner.versions("doc"), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_versions_have_no_gaps() {
    let store = InMemoryStore::new();
    let service = WhiteboardService::new(Arc::new(store.clone()));
    let mut committed = Vec::new();
    for round in 0..5u64 {
        let newest = service.fetch("doc").await.unwrap();
        let document = board(&[(format!("n{}", round).as_str(), "")]);
        let response = service
            .update(SetWhiteboardRequest {
                api_version: None,
                identifier: "doc".to_string(),
                source_version: Some(newest.version),
                content: encode(&document).unwrap(),
            })
            .await
            .unwrap();
        committed.push(response.committed_version);
    }
    assert_eq!(committed, vec![2, 3, 4, 5, 6]);
    assert_eq!(
        store.get_newest("doc").await.unwrap().map(|r| r.version),
        Some(6)
    );
}

#[tokio::test]
async fn test_preflight_through_app() {
    let config = ServerConfig {
        allowed_origin: Some("https://draw.example".to_string()),
        record_cache_capacity: 0,
        ..Default::default()
    };
    let app = app(InMemoryStore::new(), &config).unwrap();
    let request = Request::builder()
        .method("OPTIONS")
        .uri(SET_PATH)
        .header("origin", "https://draw.example")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "https://draw.example"
    );
}

#[test]
fn test_invalid_config_rejected_by_app() {
    let config = ServerConfig {
        max_update_attempts: 0,
        ..Default::default()
    };
    assert!(app(InMemoryStore::new(), &config).is_err());
}

#[tokio::test]
async fn test_document_limit_through_app() {
    let config = ServerConfig {
        max_document_bytes: 2048,
        ..Default::default()
    };
    let app = app(InMemoryStore::new(), &config).unwrap();
    call(&app, GET_PATH, serde_json::json!({"identifier": "doc"})).await;

    // Compresses well below the body limit but inflates past the document limit.
    let padding = "x".repeat(64 * 1024);
    let (status, body) = call(
        &app,
        SET_PATH,
        serde_json::json!({
            "identifier": "doc",
            "sourceWhiteboardVersion": 1,
            "content": encode(&board(&[("A", padding.as_str())])).unwrap(),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["retryable"], false);

    let (status, loaded) = call(&app, GET_PATH, serde_json::json!({"identifier": "doc"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded["version"], 1);
}
