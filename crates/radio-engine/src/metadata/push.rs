use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Client;
use tracing::{debug, info, warn};

use super::sse::SseDecoder;
use super::{extract_title, EventSink, MetadataEvent};

/// Read one SSE stream until it fails or ends. No reconnect.
pub(super) async fn run(client: Client, endpoint: String, title_field: String, sink: EventSink) {
    let response = match client
        .get(&endpoint)
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            warn!("metadata push: connect to {} failed: {}", endpoint, e);
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        warn!("metadata push: {} returned {}", endpoint, status);
        return;
    }
    info!("metadata push: subscribed to {}", endpoint);

    let mut decoder = SseDecoder::new();
    let mut bytes_stream = response.bytes_stream();
    while let Some(next) = bytes_stream.next().await {
        let chunk = match next {
            Ok(c) => c,
            Err(e) => {
                warn!("metadata push: stream error from {}: {}", endpoint, e);
                return;
            }
        };

        for event in decoder.feed(&chunk) {
            if !event.is_message() {
                debug!("metadata push: ignoring `{}` event", event.event);
                continue;
            }
            let value: serde_json::Value = match serde_json::from_str(&event.data) {
                Ok(v) => v,
                Err(e) => {
                    warn!("metadata push: unparseable message: {}", e);
                    continue;
                }
            };
            match extract_title(&value, &title_field) {
                Some(title) => sink(MetadataEvent::new(title)),
                None => debug!("metadata push: message without `{}`", title_field),
            }
        }
    }

    warn!("metadata push: stream from {} ended", endpoint);
}
