//! ==============================================================================
//! normalize.rs - raw feed entries -> typed measurement rows
//! ==============================================================================
//!
//! purpose:
//!     pure conversion step of the ingestion path. no i/o here, feed.rs does
//!     the http side and hands the decoded body over.
//!
//! policy:
//!     a row without a usable timestamp is always dropped. what happens to a
//!     bad measurement field depends on NormalizePolicy:
//!     - Strict  (default): any bad field drops the whole row
//!     - Lenient:           bad fields become 0.0 and the row is kept
//!
//!     "bad" means missing, null, unparsable, or not finite.
//!
//! ==============================================================================

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{FeedRecord, FeedResponse, MeasurementRow, Metric};

/// naive layouts accepted after rfc 3339 fails, read as utc
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizePolicy {
    #[default]
    Strict,
    Lenient,
}

/// why a single feed entry was dropped
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("missing created_at")]
    MissingTimestamp,

    #[error("unparsable created_at {0:?}")]
    BadTimestamp(String),

    #[error("invalid {metric}: {raw}")]
    BadField { metric: Metric, raw: String },
}

/// result of normalizing a whole feed
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Normalized {
    /// surviving rows in feed order
    pub rows: Vec<MeasurementRow>,
    /// (feed index, reason) for every dropped entry
    pub rejected: Vec<(usize, Rejection)>,
}

/// parse a feed timestamp into utc
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// coerce a raw field to a finite f64
pub fn parse_field(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// normalize one entry under the given policy
pub fn normalize_record(
    record: &FeedRecord,
    policy: NormalizePolicy,
) -> Result<MeasurementRow, Rejection> {
    let timestamp = match record.created_at.as_ref().ok_or(Rejection::MissingTimestamp)? {
        Value::String(raw) => {
            parse_timestamp(raw).ok_or_else(|| Rejection::BadTimestamp(raw.clone()))?
        }
        other => return Err(Rejection::BadTimestamp(other.to_string())),
    };

    let mut values = [0.0; 6];
    for (slot, metric) in values.iter_mut().zip(Metric::ALL) {
        match (parse_field(record.field(metric)), policy) {
            (Some(v), _) => *slot = v,
            (None, NormalizePolicy::Lenient) => *slot = 0.0,
            (None, NormalizePolicy::Strict) => {
                return Err(Rejection::BadField { metric, raw: describe(record.field(metric)) });
            }
        }
    }

    Ok(MeasurementRow::from_values(timestamp, values))
}

/// normalize a decoded feed body, keeping source order
pub fn normalize_feed(response: &FeedResponse, policy: NormalizePolicy) -> Normalized {
    let mut out = Normalized::default();
    for (index, record) in response.feeds.iter().enumerate() {
        match normalize_record(record, policy) {
            Ok(row) => out.rows.push(row),
            Err(reason) => {
                tracing::debug!(index, %reason, "dropping feed entry");
                out.rejected.push((index, reason));
            }
        }
    }
    out
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None => "missing".to_string(),
        Some(v) => v.to_string(),
    }
}
