//! Poll strategy against a local JSON endpoint.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use radio_engine::error::MetadataError;
use radio_engine::metadata::{fetch_title, MetadataEvent, MetadataSource, MetadataWatcher};
use serde_json::json;
use tokio::sync::mpsc;

/// First request fails, then the title changes every other request.
async fn now_playing(State(hits): State<Arc<AtomicUsize>>) -> impl IntoResponse {
    let n = hits.fetch_add(1, Ordering::SeqCst);
    if n == 0 {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let title = format!("Song {}", (n + 1) / 2);
    Json(json!({"now": {"title": title}})).into_response()
}

fn app() -> (Router, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/now", get(now_playing))
        .route("/broken", get(|| async { "{not json" }))
        .route("/empty", get(|| async { Json(json!({"now": {}})) }))
        .with_state(hits.clone());
    (router, hits)
}

#[tokio::test]
async fn poll_keeps_going_after_failures() {
    let (router, hits) = app();
    let addr = common::serve(router).await;
    let (tx, mut rx) = mpsc::unbounded_channel::<MetadataEvent>();

    let mut w = MetadataWatcher::new(
        Some(MetadataSource::Poll {
            endpoint: format!("http://{}/now", addr),
            title_field: "now.title".to_string(),
            interval: Duration::from_millis(50),
        }),
        reqwest::Client::new(),
    );
    w.subscribe(Arc::new(move |e: MetadataEvent| {
        let _ = tx.send(e);
    }));

    let first = common::recv_within(&mut rx, 5).await;
    assert_eq!(first.title, "Song 1");
    // Unchanged titles are still reported; change detection is downstream.
    let mut titles = vec![first.title];
    while titles.len() < 4 {
        titles.push(common::recv_within(&mut rx, 5).await.title);
    }
    assert_eq!(titles, ["Song 1", "Song 1", "Song 2", "Song 2"]);
    assert!(w.is_subscribed());

    w.unsubscribe();
    let seen = hits.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(hits.load(Ordering::SeqCst) <= seen + 1);
}

#[tokio::test]
async fn fetch_title_reports_each_failure_kind() {
    let (router, _) = app();
    let addr = common::serve(router).await;
    let client = reqwest::Client::new();

    let err = fetch_title(&client, &format!("http://{}/now", addr), "now.title")
        .await
        .unwrap_err();
    assert!(matches!(err, MetadataError::Status(500)));

    let err = fetch_title(&client, &format!("http://{}/broken", addr), "title")
        .await
        .unwrap_err();
    assert!(matches!(err, MetadataError::Parse(_)));

    let none = fetch_title(&client, &format!("http://{}/empty", addr), "now.title")
        .await
        .unwrap();
    assert_eq!(none, None);

    let err = fetch_title(&client, "http://127.0.0.1:1/now", "title")
        .await
        .unwrap_err();
    assert!(matches!(err, MetadataError::Http(_)));
}
