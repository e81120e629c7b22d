//! Parsing of vision-model replies into raw candidates.
//!
//! The model is asked for a JSON array of `{"title", "confidence"}` objects,
//! but replies arrive wrapped in Markdown fences, as prose ("I can't make
//! out any titles"), as JSON followed by commentary, or as a numbered list.
//! [`parse_reply`] recovers whatever candidates it can and never fails.
//!
//! Coordinates on reply items are sanitized here, at the caller side of the
//! pipeline: an out-of-range `x`/`y` drops the position, and valid
//! positions get their size clamped to plausible spine proportions.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

use crate::models::{Position, RawCandidate};
use crate::normalize::decode_candidate;

/// Default spine width, in percent of the tile, when the model omits it.
pub const DEFAULT_SPINE_WIDTH: f64 = 12.0;
/// Default spine height, in percent of the tile, when the model omits it.
pub const DEFAULT_SPINE_HEIGHT: f64 = 25.0;

const SPINE_WIDTH_RANGE: (f64, f64) = (5.0, 30.0);
const SPINE_HEIGHT_RANGE: (f64, f64) = (10.0, 50.0);

/// Phrases a model uses when it declines to list anything.
const NOTHING_FOUND_PHRASES: &[&str] = &[
    "can't detect",
    "no readable",
    "unclear",
    "difficult to analyze",
];

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\n?").expect("valid fence regex"));
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*?\]").expect("valid bracket regex"));
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d.\-*\s]+").expect("valid list marker regex"));

/// Recover raw candidates from one reply.
pub fn parse_reply(content: &str) -> Vec<RawCandidate> {
    let content = content.trim();
    let cleaned = strip_code_fences(content);

    if !cleaned.starts_with('[') && !cleaned.starts_with('{') {
        debug!(reply = %cleaned, "reply is prose, no titles");
        return Vec::new();
    }

    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Array(items)) => items.iter().filter_map(decode_reply_item).collect(),
        Ok(_) => Vec::new(),
        Err(e) => {
            debug!(error = %e, "reply is not clean JSON, salvaging");
            salvage(content)
        }
    }
}

fn strip_code_fences(content: &str) -> String {
    if content.contains("```") {
        FENCE.replace_all(content, "").trim().to_string()
    } else {
        content.to_string()
    }
}

/// Best-effort recovery from a reply that looked like JSON but did not parse.
fn salvage(content: &str) -> Vec<RawCandidate> {
    if let Some(m) = BRACKETED.find(content) {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(m.as_str()) {
            return items.iter().filter_map(decode_reply_item).collect();
        }
    }

    let lower = content.to_lowercase();
    if NOTHING_FOUND_PHRASES.iter().any(|p| lower.contains(p)) {
        return Vec::new();
    }

    content
        .lines()
        .filter(|line| line.trim().chars().count() > 2)
        .map(|line| LIST_MARKER.replace(line, "").trim().to_string())
        .filter(|title| title.chars().count() > 2)
        .map(RawCandidate::new)
        .collect()
}

/// Decode one reply item and sanitize its coordinates.
pub fn decode_reply_item(value: &Value) -> Option<RawCandidate> {
    let mut raw = decode_candidate(value)?;
    raw.position = raw.position.map(clamp_spine);
    Some(raw)
}

fn clamp_spine(pos: Position) -> Position {
    let size = |v: Option<f64>, default: f64, (lo, hi): (f64, f64)| {
        v.filter(|v| *v != 0.0).unwrap_or(default).clamp(lo, hi)
    };
    Position {
        x: pos.x,
        y: pos.y,
        width: Some(size(pos.width, DEFAULT_SPINE_WIDTH, SPINE_WIDTH_RANGE)),
        height: Some(size(pos.height, DEFAULT_SPINE_HEIGHT, SPINE_HEIGHT_RANGE)),
    }
}
