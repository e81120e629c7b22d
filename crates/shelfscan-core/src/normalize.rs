//! Input decoding and confidence normalization.
//!
//! Vision callers hand over loosely-typed JSON: plain strings from older
//! prompts, objects keyed `title` or `text`, confidence tags in any case,
//! and coordinates that may be missing or nonsense. Decoding drops items
//! that carry no usable title and discards unusable positions; it never
//! fails a batch.

use serde_json::{Map, Value};
use tracing::debug;

use crate::models::{Candidate, Confidence, Position, RawCandidate};

/// Decode every usable item, preserving order.
pub fn decode_candidates(values: &[Value]) -> Vec<RawCandidate> {
    values.iter().filter_map(decode_candidate).collect()
}

/// Decode one item.
///
/// Strings are taken as the title. Objects use `title`, falling back to
/// `text`. Anything else, or a title that is blank after trimming, yields
/// `None`.
pub fn decode_candidate(value: &Value) -> Option<RawCandidate> {
    let raw = match value {
        Value::String(s) => RawCandidate::new(s.as_str()),
        Value::Object(obj) => decode_object(obj)?,
        other => {
            debug!(item = %other, "skipped malformed candidate");
            return None;
        }
    };

    if raw.text.trim().is_empty() {
        debug!("skipped blank candidate");
        return None;
    }
    Some(raw)
}

fn decode_object(obj: &Map<String, Value>) -> Option<RawCandidate> {
    let text = ["title", "text"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))?;

    let confidence = obj
        .get("confidence")
        .and_then(Value::as_str)
        .and_then(Confidence::parse);

    let number = |key: &str| obj.get(key).and_then(Value::as_f64);
    let position = Position::from_parts(
        number("x"),
        number("y"),
        number("width"),
        number("height"),
    );
    if position.is_none() && (obj.contains_key("x") || obj.contains_key("y")) {
        debug!(title = text, "dropped unusable position");
    }

    Some(RawCandidate {
        text: text.to_string(),
        confidence,
        position,
    })
}

/// Resolve confidence and rename `text` to `title`.
///
/// Missing confidence becomes `medium`. Titles are trimmed. Order is
/// preserved; only items that violate the non-blank invariant are skipped.
pub fn normalize(raw: Vec<RawCandidate>) -> Vec<Candidate> {
    raw.into_iter()
        .filter_map(|r| {
            let title = r.text.trim();
            if title.is_empty() {
                return None;
            }
            Some(Candidate {
                title: title.to_string(),
                confidence: r.confidence.unwrap_or_default(),
                position: r.position,
            })
        })
        .collect()
}
