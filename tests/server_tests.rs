//! Router-level smoke tests with an in-memory application state.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use dowser::config::{Config, ProjectionConfig};
use dowser::corpus::{BugDataset, Workspace};
use dowser::semantic::{EmbeddingTable, Projector};
use dowser::server::{create_router, AppState};

fn fixture_state(workspace_dir: &std::path::Path) -> AppState {
    let mut dataset_file = tempfile::NamedTempFile::new().unwrap();
    dataset_file
        .write_all(
            b"bug_id,summary,description,commit\n\
              51195,NPE in Connector,Stack trace attached,abc123\n",
        )
        .unwrap();
    let dataset = BugDataset::load(dataset_file.path()).unwrap();

    let embeddings = EmbeddingTable::from_vectors(
        vec![
            ("error".to_string(), vec![1.0, 0.0]),
            ("null".to_string(), vec![0.0, 1.0]),
            ("pointer".to_string(), vec![0.7, 0.7]),
        ],
        2,
    )
    .unwrap();
    let projector = Projector::fit(&embeddings, &ProjectionConfig::default()).unwrap();

    AppState {
        config: Arc::new(Config::default()),
        dataset: Arc::new(dataset),
        embeddings: Arc::new(embeddings),
        projector: Arc::new(projector),
        workspace: Arc::new(Workspace::new(workspace_dir)),
        started: Instant::now(),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint() {
    let temp = tempfile::tempdir().unwrap();
    let router = create_router(fixture_state(temp.path()));

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "dowser");
}

#[tokio::test]
async fn status_reports_vocabulary() {
    let temp = tempfile::tempdir().unwrap();
    let router = create_router(fixture_state(temp.path()));

    let response = router
        .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["vocabularyWords"], 3);
    assert_eq!(json["embeddingDimension"], 2);
    assert_eq!(json["bugs"], 1);
    assert_eq!(json["cachedFileVectors"], 0);
    // no checkout has happened and the fixture dir is not a repository
    assert!(json["checkedOutRevision"].is_null());
    assert!(json["headRevision"].is_null());
}

#[tokio::test]
async fn bug_listing() {
    let temp = tempfile::tempdir().unwrap();
    let router = create_router(fixture_state(temp.path()));

    let response = router
        .oneshot(Request::builder().uri("/bug").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json[0]["bugId"], 51195);
    assert_eq!(json[0]["summary"], "NPE in Connector");
}

#[tokio::test]
async fn unknown_bug_is_404() {
    let temp = tempfile::tempdir().unwrap();
    let router = create_router(fixture_state(temp.path()));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/bug/999999/similarities")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("999999"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let temp = tempfile::tempdir().unwrap();
    let router = create_router(fixture_state(temp.path()));

    let response = router
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
