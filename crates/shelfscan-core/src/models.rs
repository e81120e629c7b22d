//! Core data models used throughout Shelfscan.
//!
//! These types represent the candidate titles that flow from the vision
//! caller through the reconciliation pipeline, and the reasons a candidate
//! can be dropped along the way.

use serde::Serialize;
use std::fmt;

/// Model-reported certainty bucket attached to a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl Confidence {
    /// Parse a confidence tag, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for anything other than `high`, `medium` or `low`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Confidence::High),
            "medium" => Some(Confidence::Medium),
            "low" => Some(Confidence::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounding box in percent of the tile (or image, once projected).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl Position {
    /// Build a position from optional parts.
    ///
    /// `x` and `y` must both be finite and within `[0, 100]`; otherwise the
    /// position is considered absent. Non-finite sizes are discarded.
    pub fn from_parts(
        x: Option<f64>,
        y: Option<f64>,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Option<Self> {
        let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        let (x, y) = (x?, y?);
        if !in_range(x) || !in_range(y) {
            return None;
        }
        Some(Position {
            x,
            y,
            width: width.filter(|w| w.is_finite()),
            height: height.filter(|h| h.is_finite()),
        })
    }
}

/// One item as emitted by the vision caller for one image tile.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawCandidate {
    pub text: String,
    pub confidence: Option<Confidence>,
    pub position: Option<Position>,
}

impl RawCandidate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

/// A candidate title with its confidence resolved.
///
/// Produced by normalization and carried unchanged through the filters;
/// the pipeline's output is the subset that survives every stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub title: String,
    pub confidence: Confidence,
    #[serde(flatten)]
    pub position: Option<Position>,
}

impl Candidate {
    pub fn new(title: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            title: title.into(),
            confidence,
            position: None,
        }
    }
}

/// Pipeline stage that removed a candidate.
///
/// Items dropped while decoding (no usable title) never become candidates,
/// so they show up only in the stage counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    NonBook,
    Validity,
    Dedup,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::NonBook => "non_book",
            Stage::Validity => "validity",
            Stage::Dedup => "dedup",
        }
    }
}

/// Why a candidate was removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum Rejection {
    /// Fewer than two characters once trimmed.
    TooShort,
    /// Matched an entry of the non-book table (games, media, imprints, ...).
    NonBookPattern(&'static str),
    /// Looked like a personal name rather than a title.
    AuthorName,
    /// Matched an official-document hallucination pattern.
    DocumentPattern(&'static str),
    /// Longer than a spine title plausibly is.
    Overlong,
    /// Looked like an ISBN rather than a title.
    IsbnShaped,
    /// Generic placeholder phrasing ("untitled", "volume 3", ...).
    Placeholder(&'static str),
    /// Nothing but digits.
    DigitsOnly,
    /// Outside the hard length bounds.
    OutOfBounds,
    /// Failed the stricter bar applied to low-confidence candidates.
    LowConfidence,
    /// Near-duplicate of an earlier accepted title.
    Duplicate(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::TooShort => write!(f, "shorter than two characters"),
            Rejection::NonBookPattern(label) => write!(f, "not a book ({})", label),
            Rejection::AuthorName => write!(f, "looks like an author name"),
            Rejection::DocumentPattern(label) => {
                write!(f, "looks like an official document ({})", label)
            }
            Rejection::Overlong => write!(f, "too long for a spine title"),
            Rejection::IsbnShaped => write!(f, "looks like an ISBN"),
            Rejection::Placeholder(label) => write!(f, "placeholder text ({})", label),
            Rejection::DigitsOnly => write!(f, "digits only"),
            Rejection::OutOfBounds => write!(f, "outside the allowed length"),
            Rejection::LowConfidence => write!(f, "too weak for a low-confidence reading"),
            Rejection::Duplicate(of) => write!(f, "duplicate of \"{}\"", of),
        }
    }
}

/// A title removed by the pipeline, with the stage and reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedCandidate {
    pub title: String,
    pub confidence: Confidence,
    pub stage: Stage,
    #[serde(flatten)]
    pub rejection: Rejection,
}
