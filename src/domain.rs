//! ==============================================================================
//! domain.rs - feed payloads and normalized measurement rows
//! ==============================================================================
//!
//! purpose:
//!     shapes shared by the ingestion side (feed.rs, normalize.rs) and the
//!     presentation side (chart.rs, server.rs).
//!
//!     raw side:    FeedResponse -> FeedRecord  (strings as thingspeak sends them)
//!     typed side:  MeasurementRow              (utc timestamp + six f64 values)
//!
//! ==============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// body of `GET /channels/{id}/feeds.json`
///
/// the `channel` block thingspeak also returns is not needed and is skipped.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FeedResponse {
    #[serde(default)]
    pub feeds: Vec<FeedRecord>,
}

/// one raw feed entry
///
/// fields stay as loose json values: thingspeak sends strings, but numbers
/// and nulls show up too depending on how the channel was written.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FeedRecord {
    /// kept loose so one malformed timestamp only costs its own entry
    #[serde(default)]
    pub created_at: Option<Value>,
    #[serde(default)]
    pub field1: Option<Value>,
    #[serde(default)]
    pub field2: Option<Value>,
    #[serde(default)]
    pub field3: Option<Value>,
    #[serde(default)]
    pub field4: Option<Value>,
    #[serde(default)]
    pub field5: Option<Value>,
    #[serde(default)]
    pub field6: Option<Value>,
}

impl FeedRecord {
    /// raw source value backing a metric
    pub fn field(&self, metric: Metric) -> Option<&Value> {
        match metric {
            Metric::Pm25 => self.field1.as_ref(),
            Metric::Pm10 => self.field2.as_ref(),
            Metric::Ozone => self.field3.as_ref(),
            Metric::Humidity => self.field4.as_ref(),
            Metric::Temperature => self.field5.as_ref(),
            Metric::Co => self.field6.as_ref(),
        }
    }
}

/// the six measurements on the channel, in display order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Pm25,
    Pm10,
    Ozone,
    Humidity,
    Temperature,
    Co,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Pm25,
        Metric::Pm10,
        Metric::Ozone,
        Metric::Humidity,
        Metric::Temperature,
        Metric::Co,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Pm25 => "PM2.5",
            Metric::Pm10 => "PM10",
            Metric::Ozone => "Ozone",
            Metric::Humidity => "Humidity",
            Metric::Temperature => "Temperature",
            Metric::Co => "CO",
        }
    }

    /// chart line color
    pub fn color(self) -> &'static str {
        match self {
            Metric::Pm25 => "blue",
            Metric::Pm10 => "green",
            Metric::Ozone => "yellow",
            Metric::Humidity => "cyan",
            Metric::Temperature => "orange",
            Metric::Co => "red",
        }
    }

    /// name of the thingspeak field carrying this metric
    pub fn source_field(self) -> &'static str {
        match self {
            Metric::Pm25 => "field1",
            Metric::Pm10 => "field2",
            Metric::Ozone => "field3",
            Metric::Humidity => "field4",
            Metric::Temperature => "field5",
            Metric::Co => "field6",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.source_field())
    }
}

/// a normalized feed entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRow {
    /// entry creation time (utc)
    pub timestamp: DateTime<Utc>,
    /// fine particulate matter, field1
    pub pm25: f64,
    /// coarse particulate matter, field2
    pub pm10: f64,
    /// field3
    pub ozone: f64,
    /// relative humidity, field4
    pub humidity: f64,
    /// field5
    pub temperature: f64,
    /// carbon monoxide, field6
    pub co: f64,
}

impl MeasurementRow {
    /// build a row from values ordered like `Metric::ALL`
    pub fn from_values(timestamp: DateTime<Utc>, values: [f64; 6]) -> Self {
        let [pm25, pm10, ozone, humidity, temperature, co] = values;
        Self { timestamp, pm25, pm10, ozone, humidity, temperature, co }
    }

    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Pm25 => self.pm25,
            Metric::Pm10 => self.pm10,
            Metric::Ozone => self.ozone,
            Metric::Humidity => self.humidity,
            Metric::Temperature => self.temperature,
            Metric::Co => self.co,
        }
    }
}
