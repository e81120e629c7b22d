//! Near-duplicate collapsing for titles read from overlapping tiles.
//!
//! Adjacent tiles overlap, so the same spine is usually reported several
//! times, sometimes truncated or with a misread letter. Collapsing is
//! first-seen-wins: the earliest variant is kept and later ones dropped.
//!
//! # Similarity
//!
//! Two normalized (trimmed, lower-cased) titles are the same book when:
//!
//! 1. they are equal, or
//! 2. either contains the other (a truncated tile view), or
//! 3. `1 - levenshtein / max(len_a, len_b)` exceeds the threshold.
//!
//! Lengths and distances are counted in characters.

use crate::filter::MIN_TITLE_CHARS;
use crate::models::{Candidate, RejectedCandidate, Rejection, Stage};
use crate::pipeline::apply_stage;

/// Default similarity above which two titles are considered the same.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Trim and lower-case a title for comparison.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Character-level edit distance with unit insert/delete/substitute costs.
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Normalized edit similarity in `[0, 1]`; `1.0` for identical strings.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

/// Whether two already-normalized titles refer to the same book.
pub fn titles_similar(a: &str, b: &str, threshold: f64) -> bool {
    if a == b {
        return true;
    }
    if a.contains(b) || b.contains(a) {
        return true;
    }
    similarity(a, b) > threshold
}

/// Order-preserving set of accepted titles.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    threshold: f64,
    accepted: Vec<String>,
}

impl Deduplicator {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            accepted: Vec::new(),
        }
    }

    /// Try to accept `title`.
    ///
    /// Returns `Ok(())` when it is new, or the rejection naming the earlier
    /// accepted title it duplicates.
    pub fn admit(&mut self, title: &str) -> Result<(), Rejection> {
        let clean = normalize_title(title);
        if clean.chars().count() < MIN_TITLE_CHARS {
            return Err(Rejection::TooShort);
        }
        if let Some(seen) = self
            .accepted
            .iter()
            .find(|seen| titles_similar(&clean, seen, self.threshold))
        {
            return Err(Rejection::Duplicate(seen.clone()));
        }
        self.accepted.push(clean);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Dedup stage: keep the first occurrence of each book, in order.
pub fn collapse_duplicates(
    candidates: Vec<Candidate>,
    threshold: f64,
    rejected: &mut Vec<RejectedCandidate>,
) -> Vec<Candidate> {
    let mut dedup = Deduplicator::new(threshold);
    apply_stage(candidates, Stage::Dedup, rejected, |c| dedup.admit(&c.title).err())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Confidence;

    fn titles(input: &[&str]) -> Vec<String> {
        let cands = input
            .iter()
            .map(|t| Candidate::new(*t, Confidence::Medium))
            .collect();
        collapse_duplicates(cands, SIMILARITY_THRESHOLD, &mut Vec::new())
            .into_iter()
            .map(|c| c.title)
            .collect()
    }

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("dune", "dune"), 0);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("émile", "emile"), 1);
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert!((similarity("abcde", "abcdx") - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_is_strict() {
        // exactly 0.8 is not a duplicate
        assert!(!titles_similar("abcde", "abcdx", 0.8));
        assert!(titles_similar("abcdefghij", "abcdefghix", 0.8));
    }

    #[test]
    fn test_exact_duplicates() {
        assert_eq!(titles(&["Dune", "Dune"]), vec!["Dune"]);
        assert_eq!(titles(&["Dune", "  DUNE "]), vec!["Dune"]);
    }

    #[test]
    fn test_containment_first_seen_wins() {
        assert_eq!(titles(&["The Hobbit", "Hobbit"]), vec!["The Hobbit"]);
        assert_eq!(titles(&["Hobbit", "The Hobbit"]), vec!["Hobbit"]);
    }

    #[test]
    fn test_fuzzy_duplicates() {
        assert_eq!(
            titles(&["Pride and Prejudice", "Pride and Prejudic"]),
            vec!["Pride and Prejudice"]
        );
        assert_eq!(
            titles(&["Wuthering Heights", "Wutherinq Heights"]),
            vec!["Wuthering Heights"]
        );
    }

    #[test]
    fn test_distinct_titles_kept_in_order() {
        let input = ["Emma", "Dune", "Persuasion", "Middlemarch"];
        assert_eq!(titles(&input), input.to_vec());
    }

    #[test]
    fn test_admit_reports_match() {
        let mut d = Deduplicator::new(SIMILARITY_THRESHOLD);
        assert!(d.admit("The Hobbit").is_ok());
        assert_eq!(
            d.admit("Hobbit"),
            Err(Rejection::Duplicate("the hobbit".to_string()))
        );
        assert_eq!(d.admit("x"), Err(Rejection::TooShort));
        assert_eq!(d.len(), 1);
    }
}
