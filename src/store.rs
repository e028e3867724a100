//! ==============================================================================
//! store.rs - the held "current data" for the dashboard
//! ==============================================================================
//!
//! purpose:
//!     explicit holder for the last fetch result, owned by main.rs and shared
//!     with the web handlers and the optional refresh task.
//!
//! semantics:
//!     every refresh replaces the whole store (no merge). a failed refresh
//!     therefore clears previously held rows.
//!
//!     fetches run outside the lock, so a manual refresh can overlap a
//!     scheduled one. each refresh takes a ticket before fetching and a
//!     result is only swapped in if no later-started refresh has already
//!     landed: the most recently started fetch wins, not the slowest.
//!
//! ==============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::domain::MeasurementRow;
use crate::feed::{FeedClient, FetchOutcome};

pub type SharedStore = Arc<RwLock<MeasurementStore>>;

/// error details kept from the last failed fetch
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoredError {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct MeasurementStore {
    /// rows from the latest fetch, feed order
    pub rows: Vec<MeasurementRow>,
    /// when the latest fetch finished
    pub last_update: Option<DateTime<Utc>>,
    /// set when the latest fetch produced no rows
    pub last_error: Option<StoredError>,
    /// number of fetches applied so far
    pub refresh_count: u64,
    /// last ticket handed out
    #[serde(skip)]
    issued: u64,
    /// ticket of the fetch currently held
    #[serde(skip)]
    applied: u64,
}

impl MeasurementStore {
    pub fn shared() -> SharedStore {
        Arc::new(RwLock::new(Self::default()))
    }

    /// replace the held data with a fetch result
    pub fn replace(&mut self, outcome: FetchOutcome, at: DateTime<Utc>) {
        self.rows = outcome.rows;
        self.last_error = outcome
            .error
            .map(|e| StoredError { kind: e.kind(), message: e.to_string() });
        self.last_update = Some(at);
        self.refresh_count += 1;
    }

    /// reserve a ticket for a fetch about to start
    pub fn issue_ticket(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// swap in a ticketed fetch result unless a later-started one already landed
    ///
    /// returns false when the outcome was stale and dropped.
    pub fn apply(&mut self, ticket: u64, outcome: FetchOutcome, at: DateTime<Utc>) -> bool {
        if ticket <= self.applied {
            return false;
        }
        self.applied = ticket;
        self.replace(outcome, at);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// fetch once and swap the result into the shared store
///
/// the fetch runs without holding the lock; returns a snapshot of the store
/// after the swap (or as found, if this fetch was overtaken).
pub async fn refresh(store: &SharedStore, client: &FeedClient, show_rows: bool) -> MeasurementStore {
    let ticket = store.write().await.issue_ticket();
    let outcome = client.fetch_measurements().await;

    let (snapshot, applied) = {
        let mut guard = store.write().await;
        let applied = guard.apply(ticket, outcome, Utc::now());
        (guard.clone(), applied)
    };
    if !applied {
        tracing::debug!(ticket, "newer refresh already landed, dropping result");
        return snapshot;
    }

    match &snapshot.last_error {
        None => tracing::info!(rows = snapshot.rows.len(), "feed refreshed"),
        Some(err) => tracing::warn!(kind = err.kind, "refresh left no data: {}", err.message),
    }
    if show_rows {
        for row in &snapshot.rows {
            tracing::info!(
                at = %row.timestamp,
                pm25 = row.pm25,
                pm10 = row.pm10,
                ozone = row.ozone,
                humidity = row.humidity,
                temperature = row.temperature,
                co = row.co,
                "row"
            );
        }
    }
    snapshot
}

/// re-fetch every `period` until the task is aborted
///
/// the first refresh happens one full period after the call; the startup
/// load covers time zero.
pub fn spawn_scheduled_refresh(
    store: SharedStore,
    client: Arc<FeedClient>,
    period: Duration,
    show_rows: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // first tick fires immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            refresh(&store, &client, show_rows).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::feed::tests::{client_for, serve_feed, ONE_ENTRY};
    use crate::normalize::NormalizePolicy;
    use axum::http::StatusCode;

    fn row(minute: u32) -> MeasurementRow {
        use chrono::TimeZone;
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap();
        MeasurementRow::from_values(ts, [1.0; 6])
    }

    #[test]
    fn replace_is_wholesale() {
        let mut store = MeasurementStore::default();
        store.replace(FetchOutcome { rows: vec![row(0), row(1)], error: None }, Utc::now());
        store.replace(FetchOutcome { rows: vec![row(5)], error: None }, Utc::now());
        assert_eq!(store.rows, vec![row(5)]);
        assert_eq!(store.refresh_count, 2);
        assert!(store.last_error.is_none());
    }

    #[test]
    fn failed_fetch_clears_previous_rows() {
        let mut store = MeasurementStore::default();
        store.replace(FetchOutcome { rows: vec![row(0)], error: None }, Utc::now());
        store.replace(
            FetchOutcome { rows: vec![], error: Some(FetchError::HttpStatus(503)) },
            Utc::now(),
        );
        assert!(store.is_empty());
        assert_eq!(
            store.last_error,
            Some(StoredError { kind: "http_status", message: "feed returned HTTP 503".into() })
        );
    }

    #[test]
    fn success_after_failure_clears_error() {
        let mut store = MeasurementStore::default();
        store.replace(FetchOutcome { rows: vec![], error: Some(FetchError::EmptyFeed) }, Utc::now());
        store.replace(FetchOutcome { rows: vec![row(2)], error: None }, Utc::now());
        assert!(store.last_error.is_none());
        assert_eq!(store.rows.len(), 1);
    }

    #[test]
    fn overtaken_fetch_is_dropped() {
        let mut store = MeasurementStore::default();
        let early = store.issue_ticket();
        let late = store.issue_ticket();

        assert!(store.apply(late, FetchOutcome { rows: vec![row(9)], error: None }, Utc::now()));
        assert!(!store.apply(
            early,
            FetchOutcome { rows: vec![], error: Some(FetchError::HttpStatus(500)) },
            Utc::now()
        ));
        assert_eq!(store.rows, vec![row(9)]);
        assert!(store.last_error.is_none());
        assert_eq!(store.refresh_count, 1);
    }

    #[test]
    fn in_order_tickets_all_apply() {
        let mut store = MeasurementStore::default();
        let first = store.issue_ticket();
        assert!(store.apply(first, FetchOutcome { rows: vec![row(1)], error: None }, Utc::now()));
        let second = store.issue_ticket();
        assert!(store.apply(second, FetchOutcome { rows: vec![row(2)], error: None }, Utc::now()));
        assert_eq!(store.rows, vec![row(2)]);
        assert_eq!(store.refresh_count, 2);
    }

    #[tokio::test]
    async fn scheduled_refresh_keeps_fetching() {
        let base = serve_feed(StatusCode::OK, ONE_ENTRY).await;
        let client = Arc::new(client_for(base, NormalizePolicy::Strict));
        let store = MeasurementStore::shared();

        let handle =
            spawn_scheduled_refresh(store.clone(), client, Duration::from_millis(20), false);
        let reached = tokio::time::timeout(Duration::from_secs(10), async {
            while store.read().await.refresh_count < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        handle.abort();

        assert!(reached.is_ok(), "scheduled refresh did not run twice");
        assert_eq!(store.read().await.rows.len(), 1);
    }

    #[tokio::test]
    async fn scheduled_refresh_waits_one_period_before_first_fetch() {
        let base = serve_feed(StatusCode::OK, ONE_ENTRY).await;
        let client = Arc::new(client_for(base, NormalizePolicy::Strict));
        let store = MeasurementStore::shared();

        let handle = spawn_scheduled_refresh(store.clone(), client, Duration::from_secs(3600), false);
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        assert_eq!(store.read().await.refresh_count, 0);
    }

    #[tokio::test]
    async fn refresh_writes_into_shared_store() {
        let base = serve_feed(StatusCode::OK, ONE_ENTRY).await;
        let client = client_for(base, NormalizePolicy::Strict);
        let store = MeasurementStore::shared();

        let snapshot = refresh(&store, &client, false).await;
        assert_eq!(snapshot.rows.len(), 1);
        assert!(snapshot.last_update.is_some());

        let held = store.read().await;
        assert_eq!(held.rows, snapshot.rows);
        assert_eq!(held.refresh_count, 1);
    }
}
