//! Cover art lookup for track titles.
//!
//! The resolver never fails: anything short of a usable image URL yields the
//! caller's fallback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use radio_proto::config::ArtworkConfig;

use crate::error::LookupError;

/// Search response of an iTunes-style catalogue.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SearchResponse {
    #[serde(rename = "resultCount", default)]
    pub result_count: u32,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SearchResult {
    #[serde(rename = "artworkUrl100", default)]
    pub artwork_url_100: Option<String>,
}

/// A catalogue that can be searched for one song by free-text term.
#[async_trait]
pub trait LookupService: Send + Sync {
    async fn search_song(&self, term: &str) -> Result<SearchResponse, LookupError>;
}

/// iTunes Search API client.
pub struct ItunesSearch {
    client: reqwest::Client,
    search_url: String,
    timeout: Duration,
}

impl ItunesSearch {
    pub fn new(client: reqwest::Client, config: &ArtworkConfig) -> Self {
        Self {
            client,
            search_url: config.search_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl LookupService for ItunesSearch {
    async fn search_song(&self, term: &str) -> Result<SearchResponse, LookupError> {
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("term", term), ("entity", "song"), ("limit", "1")])
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }
        Ok(response.json::<SearchResponse>().await?)
    }
}

/// Collapse a raw stream title into a search term: hyphens become spaces,
/// whitespace runs become one space, ends are trimmed.
pub fn normalize_term(title: &str) -> String {
    title
        .replace('-', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Swap the first `from` size token in `url` for `to`.
pub fn upscale(url: &str, from: &str, to: &str) -> String {
    if from.is_empty() {
        return url.to_string();
    }
    url.replacen(from, to, 1)
}

pub struct ArtworkResolver {
    service: Arc<dyn LookupService>,
    upscale_from: String,
    upscale_to: String,
}

impl ArtworkResolver {
    pub fn new(service: Arc<dyn LookupService>, config: &ArtworkConfig) -> Self {
        Self {
            service,
            upscale_from: config.upscale_from.clone(),
            upscale_to: config.upscale_to.clone(),
        }
    }

    /// Image URL for `title`, or `fallback` when none can be found.
    pub async fn resolve(&self, title: &str, fallback: &str) -> String {
        let term = normalize_term(title);
        if term.is_empty() {
            return fallback.to_string();
        }

        let response = match self.service.search_song(&term).await {
            Ok(r) => r,
            Err(e) => {
                warn!("artwork: lookup for {:?} failed: {}", term, e);
                return fallback.to_string();
            }
        };

        let found = response
            .results
            .into_iter()
            .next()
            .and_then(|r| r.artwork_url_100)
            .filter(|u| !u.is_empty());

        match found {
            Some(url) => upscale(&url, &self.upscale_from, &self.upscale_to),
            None => {
                debug!(
                    "artwork: no match for {:?} ({} results)",
                    term, response.result_count
                );
                fallback.to_string()
            }
        }
    }
}
