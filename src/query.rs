use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoverageError, Result};

/// Timestamp format the query service expects in temporal intervals.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(CoverageError::InvalidArgument(format!(
                "coordinate ({}, {}) is outside lat [-90, 90] / lon [-180, 180]",
                lat, lon
            )));
        }
        Ok(Self { lat, lon })
    }
}

impl FromStr for Coordinate {
    type Err = CoverageError;

    /// Parses `"<lat>,<lon>"`.
    fn from_str(s: &str) -> Result<Self> {
        let (lat, lon) = s.split_once(',').ok_or_else(|| {
            CoverageError::InvalidArgument(format!("expected `<lat>,<lon>`, got `{}`", s))
        })?;
        let parse = |v: &str| {
            v.trim().parse::<f64>().map_err(|_| {
                CoverageError::InvalidArgument(format!("`{}` is not a number", v.trim()))
            })
        };
        Self::new(parse(lat)?, parse(lon)?)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if end < start {
            return Err(CoverageError::InvalidArgument(format!(
                "time window ends ({}) before it starts ({})",
                end.format(TIME_FORMAT),
                start.format(TIME_FORMAT)
            )));
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_time(start)?, parse_time(end)?)
    }
}

fn parse_time(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIME_FORMAT).map_err(|e| {
        CoverageError::InvalidArgument(format!(
            "`{}` is not a `YYYY-MM-DD HH:MM:SS` timestamp: {}",
            s, e
        ))
    })
}

/// Single-layer, single-point query body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeQuery {
    pub name: String,
    pub layers: Vec<QueryLayer>,
    pub spatial: Spatial,
    pub temporal: Temporal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryLayer {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spatial {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[lat, lon]`
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Temporal {
    pub intervals: Vec<Interval>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interval {
    pub start: String,
    pub end: String,
}

impl ProbeQuery {
    pub fn point(
        name: &str,
        layer_id: &str,
        layer_type: &str,
        at: Coordinate,
        window: TimeWindow,
    ) -> Self {
        Self {
            name: name.to_string(),
            layers: vec![QueryLayer {
                id: layer_id.to_string(),
                kind: layer_type.to_string(),
            }],
            spatial: Spatial {
                kind: "point".to_string(),
                coordinates: [at.lat, at.lon],
            },
            temporal: Temporal {
                intervals: vec![Interval {
                    start: window.start.format(TIME_FORMAT).to_string(),
                    end: window.end.format(TIME_FORMAT).to_string(),
                }],
            },
        }
    }

    pub fn layer_id(&self) -> Option<&str> {
        self.layers.first().map(|l| l.id.as_str())
    }
}

/// Parsed reply of a point query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    pub query_id: Option<String>,
    /// `layers[0].id` of the reply, when present.
    pub layer_id: Option<String>,
    /// Raw point records.
    pub data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    data: Option<Vec<Value>>,
    #[serde(default)]
    submit_response: Option<RawSubmit>,
    #[serde(default)]
    layers: Option<Vec<RawLayerRef>>,
}

#[derive(Debug, Deserialize)]
struct RawSubmit {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    data: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawLayerRef {
    id: Value,
}

impl QueryResponse {
    /// Reads a reply carrying its points under `submit_response.data` or `data`.
    ///
    /// A reply with neither field is an error rather than an empty result.
    pub fn from_reply(value: Value) -> Result<Self> {
        let raw: RawReply = serde_json::from_value(value).map_err(|e| {
            CoverageError::QueryServiceFailure(format!("unexpected query reply: {}", e))
        })?;

        let (submit_id, submit_data) = match raw.submit_response {
            Some(s) => (s.id, s.data),
            None => (None, None),
        };

        let data = submit_data.or(raw.data).ok_or_else(|| {
            CoverageError::QueryServiceFailure(
                "query reply has neither `submit_response.data` nor `data`".to_string(),
            )
        })?;

        let layer_id = raw
            .layers
            .and_then(|l| l.into_iter().next())
            .and_then(|l| scalar_string(&l.id));

        Ok(Self {
            query_id: submit_id.or(raw.id).as_ref().and_then(scalar_string),
            layer_id,
            data,
        })
    }

    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }

    /// The point records as a table, with a calendar `datetime` derived from
    /// the epoch-millisecond `timestamp`.
    pub fn point_table(&self) -> Vec<PointObservation> {
        self.data.iter().map(PointObservation::from_record).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointObservation {
    pub layer_id: Option<String>,
    pub timestamp: Option<i64>,
    pub value: Value,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// `None` when the timestamp is missing or out of range.
    pub datetime: Option<NaiveDateTime>,
}

impl PointObservation {
    fn from_record(record: &Value) -> Self {
        let field = |names: &[&str]| names.iter().find_map(|n| record.get(*n));

        let timestamp = field(&["timestamp"]).and_then(|v| match v {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        let coord = |names: &[&str]| {
            field(names).and_then(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
        };

        Self {
            layer_id: field(&["layerId", "layer_id"]).and_then(scalar_string),
            timestamp,
            value: field(&["value"]).cloned().unwrap_or(Value::Null),
            latitude: coord(&["latitude", "lat"]),
            longitude: coord(&["longitude", "lon"]),
            datetime: timestamp.and_then(millis_to_datetime),
        }
    }
}

/// Epoch milliseconds to UTC calendar time.
pub fn millis_to_datetime(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

fn scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
