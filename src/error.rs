//! fetch error taxonomy
//!
//! none of these escape `FeedClient::fetch_measurements`; they ride along in
//! the `FetchOutcome` so the dashboard can show why there is no data.

/// why a feed fetch produced no rows
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// the request never completed (dns, connect, tls, body read)
    #[error("feed unreachable: {0}")]
    Network(#[from] reqwest::Error),

    /// the feed answered with a non-success status
    #[error("feed returned HTTP {0}")]
    HttpStatus(u16),

    /// the body was not the expected json
    #[error("malformed feed body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("feed contained no entries")]
    EmptyFeed,

    /// entries arrived but every one failed normalization
    #[error("all {rejected} feed entries were rejected")]
    NoValidRows { rejected: usize },
}

impl FetchError {
    /// short machine-readable tag for the json api
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::HttpStatus(_) => "http_status",
            FetchError::Parse(_) => "parse",
            FetchError::EmptyFeed => "empty_feed",
            FetchError::NoValidRows { .. } => "no_valid_rows",
        }
    }
}
