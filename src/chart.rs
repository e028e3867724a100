//! chart series for the dashboard page
//!
//! one series per metric in `Metric::ALL` order. the page draws them as-is;
//! all the numbers the page needs (points, color, y range) are computed here.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{MeasurementRow, Metric};
use crate::store::{MeasurementStore, StoredError};

/// floor for the top of every y axis
const Y_AXIS_MIN_TOP: f64 = 70.0;
/// headroom added above the largest observed value
const Y_AXIS_HEADROOM: f64 = 10.0;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSeries {
    pub metric: Metric,
    pub label: &'static str,
    pub color: &'static str,
    pub points: Vec<ChartPoint>,
    /// [lower, upper]
    pub y_range: [f64; 2],
}

/// payload for `GET /api/charts`
#[derive(Clone, Debug, Serialize)]
pub struct ChartsView {
    pub available: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub error: Option<StoredError>,
    pub charts: Vec<ChartSeries>,
}

/// upper y bound: max(observed_max + 10, 70); an empty series counts as 0
pub fn y_axis_upper(values: impl IntoIterator<Item = f64>) -> f64 {
    let observed = values.into_iter().fold(None, |acc: Option<f64>, v| {
        Some(acc.map_or(v, |m| m.max(v)))
    });
    (observed.unwrap_or(0.0) + Y_AXIS_HEADROOM).max(Y_AXIS_MIN_TOP)
}

pub fn series(rows: &[MeasurementRow], metric: Metric) -> ChartSeries {
    let points: Vec<ChartPoint> = rows
        .iter()
        .map(|r| ChartPoint { timestamp: r.timestamp, value: r.value(metric) })
        .collect();
    let upper = y_axis_upper(points.iter().map(|p| p.value));
    ChartSeries {
        metric,
        label: metric.label(),
        color: metric.color(),
        points,
        y_range: [0.0, upper],
    }
}

pub fn build_charts(rows: &[MeasurementRow]) -> Vec<ChartSeries> {
    Metric::ALL.iter().map(|&m| series(rows, m)).collect()
}

impl ChartsView {
    pub fn from_store(store: &MeasurementStore) -> Self {
        Self {
            available: !store.is_empty(),
            last_update: store.last_update,
            error: store.last_error.clone(),
            charts: build_charts(&store.rows),
        }
    }
}
