//! Push strategy against a local SSE endpoint.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use radio_engine::metadata::{MetadataEvent, MetadataSource, MetadataWatcher};
use tokio::sync::mpsc;

const FEED: &str = concat!(
    ": connected\n\n",
    "data: {\"streamTitle\":\"Track One\"}\n\n",
    "data: not json\n\n",
    "event: ping\ndata: {\"streamTitle\":\"ignored\"}\n\n",
    "data: {\"other\":1}\n\n",
    "data: {\"streamTitle\":\"  Track Two  \"}\r\n\r\n",
);

async fn feed(headers: HeaderMap) -> impl IntoResponse {
    let accepts_sse = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/event-stream"));
    if !accepts_sse {
        return (StatusCode::NOT_ACCEPTABLE, [(header::CONTENT_TYPE, "text/plain")], "")
            .into_response();
    }
    ([(header::CONTENT_TYPE, "text/event-stream")], FEED).into_response()
}

fn watcher(endpoint: String) -> MetadataWatcher {
    MetadataWatcher::new(
        Some(MetadataSource::Push {
            endpoint,
            title_field: "streamTitle".to_string(),
        }),
        reqwest::Client::new(),
    )
}

#[tokio::test]
async fn push_delivers_titles_and_skips_bad_messages() {
    let addr = common::serve(Router::new().route("/meta", get(feed))).await;
    let (tx, mut rx) = mpsc::unbounded_channel::<MetadataEvent>();

    let mut w = watcher(format!("http://{}/meta", addr));
    w.subscribe(Arc::new(move |e: MetadataEvent| {
        let _ = tx.send(e);
    }));

    let first = common::recv_within(&mut rx, 5).await;
    assert_eq!(first.title, "Track One");
    let second = common::recv_within(&mut rx, 5).await;
    assert_eq!(second.title, "Track Two");
    assert!(second.received_at >= first.received_at);

    // The server closes the stream after the last message; no reconnect.
    tokio::time::timeout(Duration::from_secs(5), async {
        while w.is_subscribed() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("watcher should stop when the stream ends");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn push_gives_up_on_error_status() {
    let app = Router::new().route("/meta", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
    let addr = common::serve(app).await;
    let (tx, mut rx) = mpsc::unbounded_channel::<MetadataEvent>();

    let mut w = watcher(format!("http://{}/meta", addr));
    w.subscribe(Arc::new(move |e: MetadataEvent| {
        let _ = tx.send(e);
    }));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!w.is_subscribed());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn unsubscribe_stops_delivery() {
    let addr = common::serve(Router::new().route("/meta", get(feed))).await;
    let (tx, mut rx) = mpsc::unbounded_channel::<MetadataEvent>();

    let mut w = watcher(format!("http://{}/meta", addr));
    w.subscribe(Arc::new(move |e: MetadataEvent| {
        let _ = tx.send(e);
    }));
    w.unsubscribe();
    assert!(!w.is_subscribed());

    // The sink was dropped with the task, so the channel closes empty.
    let closed = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("sink should be dropped");
    assert!(closed.is_none());
}
