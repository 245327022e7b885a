//! Score series extraction from free-form model output
//!
//! The model is asked for prose feedback followed by a JSON object with
//! `confidenceData` and `engagementData` arrays, but nothing guarantees the
//! shape: the object may sit in a code fence, be surrounded by prose, or be
//! cut off. Extraction therefore tries progressively looser recognizers:
//!
//! 1. unwrap the first fenced code block, if any
//! 2. parse the first brace-balanced object
//! 3. parse a small object anchored on one of the key names
//! 4. parse each key's array on its own
//!
//! The first whole-object layer that yields a series wins. Only the last
//! layer can return one series without the other. Extraction never fails;
//! whatever cannot be recovered comes back as `None`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::series::{Series, SeriesKind};

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\s*\n(.*?)\n```").expect("valid regex"));

static ANY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```\s*\n(.*?)\n```").expect("valid regex"));

static ANCHORED_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)\{[^{}]*"(?:confidenceData|engagementData)"[^{}]*\}?"#)
        .expect("valid regex")
});

static CONFIDENCE_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)"confidenceData"\s*:\s*\[(.*?)\]"#).expect("valid regex"));

static ENGAGEMENT_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)"engagementData"\s*:\s*\[(.*?)\]"#).expect("valid regex"));

/// Recognizer that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionLayer {
    /// First `{` to its matching `}`
    BalancedObject,
    /// Single-level object containing a key name
    AnchoredObject,
    /// Each key's array parsed independently
    PerKeyArrays,
}

impl std::fmt::Display for ExtractionLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::BalancedObject => "balanced object",
            Self::AnchoredObject => "anchored object",
            Self::PerKeyArrays => "per-key arrays",
        })
    }
}

/// Series recovered from one response
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedSeries {
    pub confidence: Option<Series>,
    pub engagement: Option<Series>,
    /// `None` when nothing was recovered
    pub layer: Option<ExtractionLayer>,
}

impl ExtractedSeries {
    #[must_use]
    pub fn get(&self, kind: SeriesKind) -> Option<&Series> {
        match kind {
            SeriesKind::Confidence => self.confidence.as_ref(),
            SeriesKind::Engagement => self.engagement.as_ref(),
        }
    }

    /// Present series, confidence first
    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.confidence.iter().chain(self.engagement.iter())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.confidence.is_none() && self.engagement.is_none()
    }

    /// Dimensions that could not be recovered
    #[must_use]
    pub fn missing(&self) -> Vec<SeriesKind> {
        SeriesKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).is_none())
            .collect()
    }

    fn with_layer(mut self, layer: ExtractionLayer) -> Self {
        self.layer = Some(layer);
        self
    }
}

/// Recover the confidence and engagement series embedded in `text`
#[must_use]
pub fn extract_series(text: &str) -> ExtractedSeries {
    let candidate = unwrap_fence(text);

    if let Some(found) = balanced_object(candidate).and_then(series_from_object) {
        debug!("Series recovered from balanced object");
        return found.with_layer(ExtractionLayer::BalancedObject);
    }

    if let Some(found) = anchored_object(candidate).and_then(series_from_object) {
        debug!("Series recovered from anchored object");
        return found.with_layer(ExtractionLayer::AnchoredObject);
    }

    let found = ExtractedSeries {
        confidence: array_for_key(&CONFIDENCE_ARRAY, candidate, SeriesKind::Confidence),
        engagement: array_for_key(&ENGAGEMENT_ARRAY, candidate, SeriesKind::Engagement),
        layer: None,
    };
    if found.is_empty() {
        debug!("No series found in response");
        found
    } else {
        debug!("Series recovered from per-key arrays");
        found.with_layer(ExtractionLayer::PerKeyArrays)
    }
}

/// Inner text of the first fenced block, or the whole text.
///
/// A `json`-labelled fence takes precedence; if one is present but
/// malformed, unlabelled fences are not tried.
fn unwrap_fence(text: &str) -> &str {
    let fence = if text.contains("```json") {
        &*JSON_FENCE
    } else if text.contains("```") {
        &*ANY_FENCE
    } else {
        return text;
    };

    fence
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str())
}

/// First `{` through its matching `}`.
///
/// Plain depth counting: braces inside JSON strings are counted too, so a
/// `{` or `}` in a string value can end the scan early or late.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = close_braces(text, start, 0)?;
    Some(&text[start..end])
}

/// Innermost object around the first key name.
///
/// [`ANCHORED_OBJECT`] matches from the nearest `{` before a key up to the
/// next brace. When that brace opens a nested value the match is left
/// unbalanced and is extended by brace counting.
fn anchored_object(text: &str) -> Option<&str> {
    let m = ANCHORED_OBJECT.find(text)?;
    let matched = m.as_str();

    let open = depth_delta(matched);
    if open <= 0 {
        return Some(matched);
    }

    // Unbalanced to the end of the text: take what we have and let the
    // JSON parser reject it.
    let end = close_braces(text, m.end(), open).unwrap_or(text.len());
    Some(&text[m.start()..end])
}

/// Scan from `from` with `depth` braces already open; returns the byte
/// index just past the brace that brings depth back to zero.
fn close_braces(text: &str, from: usize, mut depth: i64) -> Option<usize> {
    for (offset, byte) in text.as_bytes()[from..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn depth_delta(text: &str) -> i64 {
    text.bytes().fold(0, |depth, b| match b {
        b'{' => depth + 1,
        b'}' => depth - 1,
        _ => depth,
    })
}

/// Parse a JSON object and pull both series out of it.
///
/// Returns `None` unless at least one series is recovered, so the caller
/// falls through to the next layer.
fn series_from_object(json: &str) -> Option<ExtractedSeries> {
    let value: Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Candidate object is not valid JSON");
            return None;
        }
    };
    let obj = value.as_object()?;

    let found = ExtractedSeries {
        confidence: series_in(obj, SeriesKind::Confidence),
        engagement: series_in(obj, SeriesKind::Engagement),
        layer: None,
    };
    (!found.is_empty()).then_some(found)
}

/// First non-empty array under any of the kind's keys
fn series_in(obj: &Map<String, Value>, kind: SeriesKind) -> Option<Series> {
    kind.object_keys()
        .iter()
        .find_map(|key| match obj.get(*key) {
            Some(Value::Array(items)) if !items.is_empty() => Some(items),
            _ => None,
        })
        .and_then(|items| Series::from_values(kind, items))
}

fn array_for_key(pattern: &Regex, text: &str, kind: SeriesKind) -> Option<Series> {
    let body = pattern.captures(text)?.get(1)?.as_str();
    let wrapped = format!("[{body}]");

    match serde_json::from_str::<Vec<Value>>(&wrapped) {
        Ok(items) => Series::from_values(kind, &items),
        Err(e) => {
            debug!(%kind, error = %e, "Array for key is not valid JSON");
            None
        }
    }
}
