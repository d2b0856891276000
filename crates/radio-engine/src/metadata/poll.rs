use std::time::Duration;

use reqwest::Client;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::{extract_title, EventSink, MetadataEvent};
use crate::error::MetadataError;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// One GET of a poll endpoint. `Ok(None)` when the document has no title at
/// `title_field`.
pub async fn fetch_title(
    client: &Client,
    endpoint: &str,
    title_field: &str,
) -> Result<Option<String>, MetadataError> {
    let response = client.get(endpoint).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(MetadataError::Status(status.as_u16()));
    }
    let body = response.bytes().await?;
    let value: serde_json::Value = serde_json::from_slice(&body)?;
    Ok(extract_title(&value, title_field))
}

/// Fetch now, then every `interval`, until aborted.
pub(super) async fn run(
    client: Client,
    endpoint: String,
    title_field: String,
    interval: Duration,
    sink: EventSink,
) {
    let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match fetch_title(&client, &endpoint, &title_field).await {
            Ok(Some(title)) => sink(MetadataEvent::new(title)),
            Ok(None) => debug!("metadata poll: no `{}` in {}", title_field, endpoint),
            Err(e) => warn!("metadata poll: {}", e),
        }
    }
}
