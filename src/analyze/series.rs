//! Per-second score series recovered from a model response

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Lower bound of every score
pub const SCORE_MIN: f64 = 0.0;
/// Upper bound of every score
pub const SCORE_MAX: f64 = 100.0;
/// Largest accepted timestamp; every value up to it is exact as `f64`
pub const MAX_TIMESTAMP: u64 = (1 << 53) - 1;

/// Which scored dimension a series describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Confidence,
    Engagement,
}

impl SeriesKind {
    pub const ALL: [Self; 2] = [Self::Confidence, Self::Engagement];

    /// Keys the containing object may use for this series, in lookup order
    #[must_use]
    pub fn object_keys(self) -> [&'static str; 2] {
        match self {
            Self::Confidence => ["confidenceData", "confidence_data"],
            Self::Engagement => ["engagementData", "engagement_data"],
        }
    }

    /// Key holding the score inside each point object
    #[must_use]
    pub fn value_key(self) -> &'static str {
        match self {
            Self::Confidence => "confidence",
            Self::Engagement => "engagement",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Confidence => "Presentation Confidence Over Time",
            Self::Engagement => "Presentation Engagement Over Time",
        }
    }

    #[must_use]
    pub fn axis_label(self) -> &'static str {
        match self {
            Self::Confidence => "Confidence Score (0-100)",
            Self::Engagement => "Engagement Score (0-100)",
        }
    }

    /// Line color as RGB
    #[must_use]
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Confidence => (0x3b, 0x82, 0xf6),
            Self::Engagement => (0x10, 0xb9, 0x81),
        }
    }
}

impl std::fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.value_key())
    }
}

/// One score at one second of the video
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub timestamp: u64,
    pub value: f64,
}

/// Scores for one dimension, ascending by timestamp.
///
/// Only built through [`Series::new`], which establishes the ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub kind: SeriesKind,
    pub points: Vec<TimeSeriesPoint>,
}

impl Series {
    /// Build a series from already-typed points.
    ///
    /// Sorts by timestamp (stable, duplicates kept in input order).
    #[must_use]
    pub fn new(kind: SeriesKind, mut points: Vec<TimeSeriesPoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self { kind, points }
    }

    /// Convert a JSON array of point objects.
    ///
    /// Elements without a usable timestamp or score are skipped. Returns
    /// `None` when nothing survives.
    #[must_use]
    pub fn from_values(kind: SeriesKind, values: &[Value]) -> Option<Self> {
        let points: Vec<TimeSeriesPoint> = values
            .iter()
            .filter_map(|v| {
                let point = point_from_value(kind, v);
                if point.is_none() {
                    debug!(%kind, element = %v, "Skipping malformed data point");
                }
                point
            })
            .collect();

        if points.is_empty() {
            None
        } else {
            Some(Self::new(kind, points))
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Summary statistics, `None` for an empty series
    #[must_use]
    pub fn stats(&self) -> Option<SeriesStats> {
        let first = self.points.first()?;
        let last = self.points.last()?;

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for p in &self.points {
            min = min.min(p.value);
            max = max.max(p.value);
            sum += p.value;
        }

        Some(SeriesStats {
            count: self.points.len(),
            min,
            max,
            mean: sum / self.points.len() as f64,
            first_timestamp: first.timestamp,
            last_timestamp: last.timestamp,
        })
    }
}

/// Summary of one series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub first_timestamp: u64,
    pub last_timestamp: u64,
}

fn point_from_value(kind: SeriesKind, value: &Value) -> Option<TimeSeriesPoint> {
    let obj = value.as_object()?;
    let timestamp = timestamp_from(obj.get("timestamp")?)?;
    let score = [kind.value_key(), "value", "score"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_f64))?;

    if !score.is_finite() {
        return None;
    }

    Some(TimeSeriesPoint {
        timestamp,
        value: score.clamp(SCORE_MIN, SCORE_MAX),
    })
}

/// Whole seconds; fractional timestamps truncate. Negatives and values
/// above [`MAX_TIMESTAMP`] are rejected.
fn timestamp_from(value: &Value) -> Option<u64> {
    if let Some(ts) = value.as_u64() {
        return (ts <= MAX_TIMESTAMP).then_some(ts);
    }
    let ts = value.as_f64()?;
    if ts.is_finite() && ts >= 0.0 && ts <= MAX_TIMESTAMP as f64 {
        Some(ts.trunc() as u64)
    } else {
        None
    }
}
