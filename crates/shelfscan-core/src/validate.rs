//! Hallucination and validity filter.
//!
//! Vision models asked to read spines sometimes report shelf labels,
//! government documents, barcodes or placeholder text as titles. This stage
//! rejects those, enforces hard length bounds, and holds `low` confidence
//! readings to a stricter bar.
//!
//! Rules are applied in order and the first match decides:
//!
//! 1. official-document phrasing
//! 2. longer than [`MAX_SPINE_CHARS`]
//! 3. ISBN-shaped digits
//! 4. placeholder phrasing
//! 5. outside `[MIN_TITLE_CHARS, MAX_TITLE_CHARS]`, or digits only
//! 6. `low` confidence only: outside `[LOW_CONFIDENCE_MIN_CHARS, MAX_SPINE_CHARS]`,
//!    or a leading article on a title shorter than [`SHORT_ARTICLE_TITLE_CHARS`]

use crate::filter::MIN_TITLE_CHARS;
use crate::models::{Candidate, Confidence, RejectedCandidate, Rejection, Stage};
use crate::pipeline::apply_stage;
use crate::tables::{DOCUMENT_PATTERNS, ISBN_PATTERNS, PLACEHOLDER_PATTERNS};

/// Longest plausible spine title. Fixed, not configurable.
pub const MAX_SPINE_CHARS: usize = 50;

/// Hard upper bound on any title.
pub const MAX_TITLE_CHARS: usize = 100;

/// Minimum length for a `low` confidence title.
pub const LOW_CONFIDENCE_MIN_CHARS: usize = 5;

/// `low` confidence titles starting with an article must be at least this long.
pub const SHORT_ARTICLE_TITLE_CHARS: usize = 10;

/// Why `candidate` should be discarded, or `None` if it passes.
pub fn validity_reason(candidate: &Candidate) -> Option<Rejection> {
    let title = candidate.title.as_str();
    let len = title.chars().count();

    if let Some(label) = DOCUMENT_PATTERNS.first_match(title) {
        return Some(Rejection::DocumentPattern(label));
    }
    if len > MAX_SPINE_CHARS {
        return Some(Rejection::Overlong);
    }
    if ISBN_PATTERNS.first_match(title).is_some() {
        return Some(Rejection::IsbnShaped);
    }
    if let Some(label) = PLACEHOLDER_PATTERNS.first_match(title) {
        return Some(Rejection::Placeholder(label));
    }
    if !(MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&len) {
        return Some(Rejection::OutOfBounds);
    }
    if title.chars().all(|c| c.is_ascii_digit()) {
        return Some(Rejection::DigitsOnly);
    }

    if candidate.confidence == Confidence::Low {
        if !(LOW_CONFIDENCE_MIN_CHARS..=MAX_SPINE_CHARS).contains(&len) {
            return Some(Rejection::LowConfidence);
        }
        if starts_with_article(title) && len < SHORT_ARTICLE_TITLE_CHARS {
            return Some(Rejection::LowConfidence);
        }
    }

    None
}

fn starts_with_article(title: &str) -> bool {
    match title.split_once(|c: char| c.is_whitespace()) {
        Some((first, _)) => matches!(first.to_lowercase().as_str(), "the" | "a" | "an"),
        None => false,
    }
}

/// Validity stage: keep candidates [`validity_reason`] passes, in order.
pub fn validate_titles(
    candidates: Vec<Candidate>,
    rejected: &mut Vec<RejectedCandidate>,
) -> Vec<Candidate> {
    apply_stage(candidates, Stage::Validity, rejected, validity_reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(title: &str, confidence: Confidence) -> Option<Rejection> {
        validity_reason(&Candidate::new(title, confidence))
    }

    #[test]
    fn test_document_hallucinations() {
        assert_eq!(
            check("Census of Population and Housing", Confidence::High),
            Some(Rejection::DocumentPattern("census"))
        );
        assert_eq!(
            check("Social Characteristics", Confidence::High),
            Some(Rejection::DocumentPattern("characteristics"))
        );
        assert!(check("The Federal Register Index", Confidence::Medium).is_some());
    }

    #[test]
    fn test_isbn_rejected() {
        assert_eq!(check("9780134685991", Confidence::High), Some(Rejection::IsbnShaped));
        assert_eq!(check("0134685997", Confidence::Medium), Some(Rejection::IsbnShaped));
    }

    #[test]
    fn test_length_bounds() {
        let long = "x".repeat(101);
        assert_eq!(check(&long, Confidence::High), Some(Rejection::Overlong));

        let fifty = "y".repeat(50);
        assert_eq!(check(&fifty, Confidence::High), None);
        let fifty_one = "y".repeat(51);
        assert_eq!(check(&fifty_one, Confidence::High), Some(Rejection::Overlong));

        assert_eq!(check("Go", Confidence::Medium), None);
        assert_eq!(check("G", Confidence::Medium), Some(Rejection::OutOfBounds));
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(check("1984", Confidence::High), Some(Rejection::DigitsOnly));
        assert_eq!(check("1984 Revisited", Confidence::High), None);
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            check("Untitled", Confidence::High),
            Some(Rejection::Placeholder("untitled"))
        );
        assert_eq!(
            check("Encyclopedia Volume 12", Confidence::High),
            Some(Rejection::Placeholder("volume number"))
        );
        assert!(check("Unknown Author", Confidence::Medium).is_some());
        assert_eq!(check("Volume 12 of Memories", Confidence::High), None);
    }

    #[test]
    fn test_low_confidence_stricter() {
        assert_eq!(check("Sea", Confidence::Low), Some(Rejection::LowConfidence));
        assert_eq!(check("Sea", Confidence::High), None);
        assert_eq!(check("Sea", Confidence::Medium), None);

        assert_eq!(check("The Sea", Confidence::Low), Some(Rejection::LowConfidence));
        assert_eq!(check("The Sea", Confidence::Medium), None);
        assert_eq!(check("The Seawolf", Confidence::Low), None);
        assert_eq!(check("Theory", Confidence::Low), None);
    }

    #[test]
    fn test_validate_preserves_order() {
        let mut rejected = Vec::new();
        let out = validate_titles(
            vec![
                Candidate::new("Dune", Confidence::High),
                Candidate::new("9780134685991", Confidence::High),
                Candidate::new("Emma", Confidence::Medium),
            ],
            &mut rejected,
        );
        let titles: Vec<&str> = out.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Dune", "Emma"]);
        assert_eq!(rejected[0].stage, Stage::Validity);
        assert_eq!(rejected[0].rejection, Rejection::IsbnShaped);
    }
}
