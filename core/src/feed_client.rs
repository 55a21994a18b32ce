//! NeoWs feed client.
//!
//! Single attempt per call; retries are the caller's policy.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::time::Duration;

use crate::config::FeedConfig;
use crate::errors::{NeoError, Result};

/// Source of raw feed payloads.
///
/// Returns the JSON body untouched so callers can decide between decoding
/// ([`crate::feed::FeedResponse::from_value`]) and pass-through.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the feed for the inclusive window `start..=end`.
    async fn fetch_feed(&self, start: NaiveDate, end: NaiveDate) -> Result<Value>;
}

/// reqwest-backed client for `GET {api_base}/feed`.
pub struct NeoWsClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl NeoWsClient {
    pub fn new(cfg: &FeedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| NeoError::config_with_source("failed to build feed HTTP client", e))?;

        if cfg.api_key == "DEMO_KEY" {
            tracing::warn!("using NeoWs DEMO_KEY; expect aggressive rate limiting");
        }

        Ok(Self::with_client(client, &cfg.api_base, &cfg.api_key))
    }

    /// Creates a client with a custom HTTP client.
    pub fn with_client(client: reqwest::Client, api_base: &str, api_key: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl FeedSource for NeoWsClient {
    async fn fetch_feed(&self, start: NaiveDate, end: NaiveDate) -> Result<Value> {
        let url = format!("{}/feed", self.api_base);
        let start_date = start.format("%Y-%m-%d").to_string();
        let end_date = end.format("%Y-%m-%d").to_string();

        tracing::debug!(%start_date, %end_date, "fetching NeoWs feed");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("start_date", start_date.as_str()),
                ("end_date", end_date.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| NeoError::feed_with_source("feed request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NeoError::feed(format!("feed returned {status}: {body}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| NeoError::feed_with_source("feed body is not JSON", e))
    }
}
