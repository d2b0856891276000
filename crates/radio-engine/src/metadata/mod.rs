//! Track-title discovery for one player.
//!
//! A [`MetadataWatcher`] runs one background task per subscription, either
//! reading a Server-Sent Events stream (push) or fetching a JSON document on
//! a timer (poll). Every title it sees is handed to the subscriber as a
//! [`MetadataEvent`]; deciding whether that title is a change is the
//! [`TrackTracker`]'s job.

mod poll;
mod push;
pub mod sse;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use radio_proto::config::MetadataConfig;
use tokio::task::AbortHandle;
use tracing::debug;

pub use poll::fetch_title;

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEvent {
    pub title: String,
    pub received_at: DateTime<Utc>,
}

impl MetadataEvent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            received_at: Utc::now(),
        }
    }
}

/// Callback a watcher delivers events through.
pub type EventSink = Arc<dyn Fn(MetadataEvent) + Send + Sync>;

/// Last-known title of a player and the rule for replacing it.
///
/// A candidate is a change when, once trimmed, it is non-empty and differs
/// from the current title. Comparison is exact: case and inner whitespace
/// count.
#[derive(Debug, Clone, Default)]
pub struct TrackTracker {
    current: String,
}

impl TrackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn is_change(&self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        !candidate.is_empty() && candidate != self.current
    }

    /// Record `candidate` if it is a change, returning the accepted title.
    pub fn accept(&mut self, candidate: &str) -> Option<&str> {
        if !self.is_change(candidate) {
            return None;
        }
        self.current = candidate.trim().to_string();
        Some(&self.current)
    }
}

/// Where a watcher gets its titles from.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataSource {
    Push {
        endpoint: String,
        title_field: String,
    },
    Poll {
        endpoint: String,
        title_field: String,
        interval: Duration,
    },
}

impl MetadataSource {
    pub fn from_config(config: &MetadataConfig, default_interval: Duration) -> Self {
        match config {
            MetadataConfig::Push {
                endpoint,
                title_field,
            } => MetadataSource::Push {
                endpoint: endpoint.clone(),
                title_field: title_field.clone(),
            },
            MetadataConfig::Poll {
                endpoint,
                title_field,
                poll_interval_ms,
            } => MetadataSource::Poll {
                endpoint: endpoint.clone(),
                title_field: title_field.clone(),
                interval: poll_interval_ms
                    .map(|ms| Duration::from_millis(ms.max(1)))
                    .unwrap_or(default_interval),
            },
        }
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            MetadataSource::Push { .. } => "push",
            MetadataSource::Poll { .. } => "poll",
        }
    }
}

pub struct MetadataWatcher {
    source: Option<MetadataSource>,
    client: reqwest::Client,
    task: Option<AbortHandle>,
}

impl MetadataWatcher {
    /// A watcher with no source never emits; subscribing it is a no-op.
    pub fn new(source: Option<MetadataSource>, client: reqwest::Client) -> Self {
        Self {
            source,
            client,
            task: None,
        }
    }

    pub fn source(&self) -> Option<&MetadataSource> {
        self.source.as_ref()
    }

    /// Start delivering titles to `sink`, replacing any live subscription.
    pub fn subscribe(&mut self, sink: EventSink) {
        self.unsubscribe();
        let Some(source) = self.source.clone() else {
            return;
        };
        debug!("metadata: subscribing ({})", source.strategy());

        let client = self.client.clone();
        let handle = match source {
            MetadataSource::Push {
                endpoint,
                title_field,
            } => tokio::spawn(push::run(client, endpoint, title_field, sink)),
            MetadataSource::Poll {
                endpoint,
                title_field,
                interval,
            } => tokio::spawn(poll::run(client, endpoint, title_field, interval, sink)),
        };
        self.task = Some(handle.abort_handle());
    }

    /// Stop the transport or timer. Safe when not subscribed.
    pub fn unsubscribe(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("metadata: unsubscribed");
        }
    }

    /// True while a subscription task is alive. A push stream that ended on
    /// its own reports false.
    pub fn is_subscribed(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for MetadataWatcher {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Read a trimmed string at dot-separated `path` inside `value`.
pub fn extract_title(value: &serde_json::Value, path: &str) -> Option<String> {
    let mut node = value;
    for key in path.split('.') {
        node = node.get(key)?;
    }
    node.as_str().map(|s| s.trim().to_string())
}
