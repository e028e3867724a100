//! ==============================================================================
//! feed.rs - thingspeak feed client (the ingestion normalizer)
//! ==============================================================================
//!
//! purpose:
//!     one GET against the channel feed, decode, normalize.
//!
//! contract:
//!     fetch_measurements() never fails. every problem (unreachable host,
//!     non-2xx status, bad json, empty feed) becomes an empty row list plus
//!     a FetchError in the returned FetchOutcome.
//!
//!     no retries, no timeout override: the reqwest client defaults apply.
//!
//! relationships:
//!     - uses: normalize.rs (pure string -> typed conversion)
//!     - used by: store.rs (refresh), main.rs (construction)
//!
//! ==============================================================================

use crate::config::FeedConfig;
use crate::domain::{FeedResponse, MeasurementRow};
use crate::error::FetchError;
use crate::normalize::{normalize_feed, NormalizePolicy};

pub const DEFAULT_BASE_URL: &str = "https://api.thingspeak.com";
pub const DEFAULT_CHANNEL_ID: u64 = 1596152;

/// number of most recent entries requested per fetch
pub const FEED_RESULTS: u32 = 5;

/// rows from one fetch, plus the reason if there are none
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub rows: Vec<MeasurementRow>,
    pub error: Option<FetchError>,
}

impl FetchOutcome {
    fn failed(error: FetchError) -> Self {
        Self { rows: Vec::new(), error: Some(error) }
    }
}

pub struct FeedClient {
    client: reqwest::Client,
    url: String,
    policy: NormalizePolicy,
}

impl FeedClient {
    pub fn new(feed: &FeedConfig, policy: NormalizePolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: feed_url(&feed.base_url, feed.channel_id),
            policy,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// fetch and normalize, surfacing the failure reason as an error
    pub async fn try_fetch_measurements(&self) -> Result<Vec<MeasurementRow>, FetchError> {
        tracing::debug!(url = %self.url, "fetching feed");
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        let decoded: FeedResponse = serde_json::from_str(&body)?;
        if decoded.feeds.is_empty() {
            return Err(FetchError::EmptyFeed);
        }

        let normalized = normalize_feed(&decoded, self.policy);
        if normalized.rows.is_empty() {
            return Err(FetchError::NoValidRows { rejected: normalized.rejected.len() });
        }
        if !normalized.rejected.is_empty() {
            tracing::info!(
                kept = normalized.rows.len(),
                dropped = normalized.rejected.len(),
                policy = ?self.policy,
                "some feed entries were dropped"
            );
        }
        Ok(normalized.rows)
    }

    /// fetch and normalize; never fails, see module docs
    pub async fn fetch_measurements(&self) -> FetchOutcome {
        match self.try_fetch_measurements().await {
            Ok(rows) => FetchOutcome { rows, error: None },
            Err(e) => {
                tracing::warn!(kind = e.kind(), error = %e, "feed fetch failed");
                FetchOutcome::failed(e)
            }
        }
    }
}

fn feed_url(base_url: &str, channel_id: u64) -> String {
    format!(
        "{}/channels/{}/feeds.json?results={}",
        base_url.trim_end_matches('/'),
        channel_id,
        FEED_RESULTS
    )
}
