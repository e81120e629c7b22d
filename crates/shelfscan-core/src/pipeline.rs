//! The title reconciliation pipeline.
//!
//! Turns the raw candidates gathered from every tile of one scan into a
//! clean, ordered list of titles worth looking up in a catalog.
//!
//! # Stages
//!
//! 1. **Normalize**: resolve confidence, trim titles ([`crate::normalize`]).
//! 2. **Non-book filter**: games, imprints, author names ([`crate::filter`]).
//! 3. **Validity filter**: hallucinations, ISBNs, length bounds ([`crate::validate`]).
//! 4. **Dedup**: collapse near-duplicates, first seen wins ([`crate::dedup`]).
//!
//! The pipeline is a pure function of its input: no I/O, no shared state,
//! and the same input in the same order always produces the same output.
//! Because dedup keeps the first variant it sees, reordering the input may
//! change which spelling of a duplicated title survives.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::dedup::{collapse_duplicates, SIMILARITY_THRESHOLD};
use crate::filter::{filter_non_books, non_book_reason};
use crate::models::{Candidate, Confidence, RawCandidate, RejectedCandidate, Rejection, Stage};
use crate::normalize::{decode_candidates, normalize};
use crate::validate::{validate_titles, validity_reason};

/// Tunable pipeline parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileOptions {
    /// Similarity above which two titles collapse into one.
    pub similarity_threshold: f64,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: SIMILARITY_THRESHOLD,
        }
    }
}

/// Number of candidates left after each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    pub input: usize,
    pub normalized: usize,
    pub after_non_book: usize,
    pub after_validity: usize,
    pub unique: usize,
}

/// Survivors per confidence bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfidenceBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl ConfidenceBreakdown {
    pub fn from_candidates(candidates: &[Candidate]) -> Self {
        let mut breakdown = Self::default();
        for c in candidates {
            match c.confidence {
                Confidence::High => breakdown.high += 1,
                Confidence::Medium => breakdown.medium += 1,
                Confidence::Low => breakdown.low += 1,
            }
        }
        breakdown
    }
}

/// Full result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileReport {
    /// Validated, deduplicated titles in input order.
    pub candidates: Vec<Candidate>,
    pub counts: StageCounts,
    pub confidence: ConfidenceBreakdown,
    /// Every candidate removed by a filter or by dedup, in input order.
    pub rejected: Vec<RejectedCandidate>,
}

impl ReconcileReport {
    /// True when the input had candidates but none survived.
    pub fn nothing_detected(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Run the pipeline with default options and return only the survivors.
pub fn reconcile(raw: Vec<RawCandidate>) -> Vec<Candidate> {
    reconcile_with(raw, &ReconcileOptions::default()).candidates
}

/// Decode loosely-typed JSON items, then run the pipeline.
///
/// Malformed items are skipped and counted in `counts.input` but not in
/// `counts.normalized`.
pub fn reconcile_values(values: &[Value], options: &ReconcileOptions) -> ReconcileReport {
    let raw = decode_candidates(values);
    let mut report = reconcile_with(raw, options);
    report.counts.input = values.len();
    report
}

/// Run the pipeline and report what each stage removed.
pub fn reconcile_with(raw: Vec<RawCandidate>, options: &ReconcileOptions) -> ReconcileReport {
    let mut counts = StageCounts {
        input: raw.len(),
        ..Default::default()
    };
    let mut rejected = Vec::new();

    let normalized = normalize(raw);
    counts.normalized = normalized.len();

    let books = filter_non_books(normalized, &mut rejected);
    counts.after_non_book = books.len();

    let valid = validate_titles(books, &mut rejected);
    counts.after_validity = valid.len();

    let unique = collapse_duplicates(valid, options.similarity_threshold, &mut rejected);
    counts.unique = unique.len();

    let confidence = ConfidenceBreakdown::from_candidates(&unique);
    info!(
        input = counts.input,
        after_filtering = counts.after_validity,
        unique = counts.unique,
        high = confidence.high,
        medium = confidence.medium,
        low = confidence.low,
        "reconciled candidate titles"
    );

    ReconcileReport {
        candidates: unique,
        counts,
        confidence,
        rejected,
    }
}

/// Check a single title against both filters without dedup.
pub fn check_title(candidate: &Candidate) -> Option<(Stage, Rejection)> {
    if let Some(reason) = non_book_reason(&candidate.title) {
        return Some((Stage::NonBook, reason));
    }
    validity_reason(candidate).map(|reason| (Stage::Validity, reason))
}

/// Split `candidates` by `verdict`, recording each rejection under `stage`.
pub(crate) fn apply_stage<F>(
    candidates: Vec<Candidate>,
    stage: Stage,
    rejected: &mut Vec<RejectedCandidate>,
    mut verdict: F,
) -> Vec<Candidate>
where
    F: FnMut(&Candidate) -> Option<Rejection>,
{
    let mut kept = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match verdict(&candidate) {
            None => kept.push(candidate),
            Some(rejection) => {
                debug!(title = %candidate.title, ?stage, %rejection, "rejected candidate");
                rejected.push(RejectedCandidate {
                    title: candidate.title,
                    confidence: candidate.confidence,
                    stage,
                    rejection,
                });
            }
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(title: &str) -> RawCandidate {
        RawCandidate::new(title)
    }

    fn titles(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn test_end_to_end_scenario() {
        let input = vec![
            raw("The Great Gatsby").with_confidence(Confidence::High),
            raw("Connect 4"),
            raw("9780134685991"),
            raw("Great Gatsby").with_confidence(Confidence::Medium),
        ];
        let out = reconcile(input);
        assert_eq!(out, vec![Candidate::new("The Great Gatsby", Confidence::High)]);
    }

    #[test]
    fn test_report_attributes_each_rejection() {
        let input = vec![
            raw("The Great Gatsby").with_confidence(Confidence::High),
            raw("Connect 4"),
            raw("9780134685991"),
            raw("Great Gatsby"),
        ];
        let report = reconcile_with(input, &ReconcileOptions::default());
        assert_eq!(
            report.counts,
            StageCounts {
                input: 4,
                normalized: 4,
                after_non_book: 3,
                after_validity: 2,
                unique: 1,
            }
        );
        let stages: Vec<Stage> = report.rejected.iter().map(|r| r.stage).collect();
        assert_eq!(stages, vec![Stage::NonBook, Stage::Validity, Stage::Dedup]);
        assert_eq!(
            report.rejected[2].rejection,
            Rejection::Duplicate("the great gatsby".to_string())
        );
        assert_eq!(report.confidence.high, 1);
    }

    #[test]
    fn test_empty_input() {
        let report = reconcile_with(Vec::new(), &ReconcileOptions::default());
        assert!(report.candidates.is_empty());
        assert!(report.rejected.is_empty());
        assert!(report.nothing_detected());
    }

    #[test]
    fn test_all_filtered_is_not_an_error() {
        let report = reconcile_with(
            vec![raw("Monopoly"), raw("DVD"), raw("Untitled")],
            &ReconcileOptions::default(),
        );
        assert!(report.nothing_detected());
        assert_eq!(report.rejected.len(), 3);
    }

    #[test]
    fn test_idempotent() {
        let input = vec![
            raw("Dune"),
            raw("Dune Messiah").with_confidence(Confidence::Low),
            raw("Emma"),
            raw("emma"),
            raw("The Hobbit"),
            raw("Hobbit"),
        ];
        let first = reconcile(input.clone());
        let second = reconcile(input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_order_preserved_without_duplicates() {
        let input: Vec<RawCandidate> = ["Persuasion", "Dune", "Emma", "Ulysses", "Beloved"]
            .iter()
            .map(|t| raw(t))
            .collect();
        let out = reconcile(input);
        assert_eq!(titles(&out), vec!["Persuasion", "Dune", "Emma", "Ulysses", "Beloved"]);
    }

    #[test]
    fn test_confidence_default() {
        let out = reconcile(vec![raw("Beloved")]);
        assert_eq!(out[0].confidence, Confidence::Medium);
    }

    #[test]
    fn test_low_vs_high_confidence() {
        let out = reconcile(vec![raw("Sea").with_confidence(Confidence::Low)]);
        assert!(out.is_empty());
        let out = reconcile(vec![raw("Sea").with_confidence(Confidence::High)]);
        assert_eq!(titles(&out), vec!["Sea"]);
    }

    #[test]
    fn test_custom_threshold() {
        let input = vec![raw("Wuthering Heights"), raw("Wutherinq Heights")];
        let strict = ReconcileOptions {
            similarity_threshold: 0.99,
        };
        assert_eq!(reconcile_with(input.clone(), &strict).candidates.len(), 2);
        assert_eq!(reconcile(input).len(), 1);
    }

    #[test]
    fn test_values_skip_malformed_and_keep_positions() {
        let values = vec![
            json!({"title": "Beloved", "confidence": "high", "x": 10, "y": 20, "width": 5, "height": 30}),
            json!(42),
            json!({"title": "Dune", "x": 500, "y": 20}),
            json!("Emma"),
        ];
        let report = reconcile_values(&values, &ReconcileOptions::default());
        assert_eq!(report.counts.input, 4);
        assert_eq!(report.counts.normalized, 3);
        assert_eq!(titles(&report.candidates), vec!["Beloved", "Dune", "Emma"]);
        let pos = report.candidates[0].position.unwrap();
        assert_eq!((pos.x, pos.y), (10.0, 20.0));
        assert!(report.candidates[1].position.is_none());
    }

    #[test]
    fn test_decode_drops_only_show_in_counts() {
        let values = vec![json!("Dune"), json!(42), json!({"title": "   "}), json!("Monopoly")];
        let report = reconcile_values(&values, &ReconcileOptions::default());

        assert_eq!(report.counts.input, 4);
        assert_eq!(report.counts.normalized, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].stage, Stage::NonBook);
    }

    #[test]
    fn test_check_title() {
        assert_eq!(
            check_title(&Candidate::new("Shakespeare", Confidence::High)),
            Some((Stage::NonBook, Rejection::NonBookPattern("shakespeare")))
        );
        assert_eq!(
            check_title(&Candidate::new("9780134685991", Confidence::High)),
            Some((Stage::Validity, Rejection::IsbnShaped))
        );
        assert_eq!(
            check_title(&Candidate::new("42", Confidence::High)),
            Some((Stage::NonBook, Rejection::NonBookPattern("number")))
        );
        assert_eq!(check_title(&Candidate::new("Go", Confidence::Medium)), None);
    }
}
