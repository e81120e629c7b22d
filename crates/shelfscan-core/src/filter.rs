//! Non-book and author-name filter.
//!
//! Removes candidates that are evidently not book titles: board games and
//! media formats, bare digits or letters, bylines, publisher imprints, and
//! strings that read like a person's name.
//!
//! The author heuristic is intentionally narrow. A name that slips through
//! costs one catalog lookup; a real title rejected here is lost.

use crate::models::{Candidate, RejectedCandidate, Rejection, Stage};
use crate::pipeline::apply_stage;
use crate::tables::{
    in_name_list, FIRST_NAMES, NON_BOOK_PATTERNS, PAIRED_SURNAMES, SINGLE_WORD_SURNAMES,
};

/// Minimum title length, in characters, after trimming.
pub const MIN_TITLE_CHARS: usize = 2;

/// Single-word surnames longer than this are never flagged.
pub const MAX_SURNAME_CHARS: usize = 8;

/// Why `title` is not a book title, or `None` if it may be one.
pub fn non_book_reason(title: &str) -> Option<Rejection> {
    let clean = title.trim().to_lowercase();
    if clean.chars().count() < MIN_TITLE_CHARS {
        return Some(Rejection::TooShort);
    }

    if let Some(label) = NON_BOOK_PATTERNS.first_match(&clean) {
        return Some(Rejection::NonBookPattern(label));
    }

    if is_likely_author_name(title) {
        return Some(Rejection::AuthorName);
    }

    None
}

/// Conservative check for strings that read like a personal name.
///
/// Flags, in order:
/// - a `by ` prefix or an embedded ` by `;
/// - one word from the common-surname list, at most eight characters;
/// - exactly two words, a common first name followed by a common surname;
/// - exactly three words where one is an initial such as `R.`.
///
/// Name lists are compared case-insensitively; initials must be a capital
/// letter followed by a period.
pub fn is_likely_author_name(title: &str) -> bool {
    let trimmed = title.trim();
    let lower = trimmed.to_lowercase();
    if lower.starts_with("by ") || lower.contains(" by ") {
        return true;
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();
    match words.as_slice() {
        [single] => {
            single.chars().count() <= MAX_SURNAME_CHARS
                && in_name_list(SINGLE_WORD_SURNAMES, single)
        }
        [first, last] => in_name_list(FIRST_NAMES, first) && in_name_list(PAIRED_SURNAMES, last),
        [_, _, _] => words.iter().any(|w| is_initial(w)),
        _ => false,
    }
}

fn is_initial(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(letter), Some('.'), None) if letter.is_ascii_uppercase()
    )
}

/// Non-book stage: keep candidates [`non_book_reason`] passes, in order.
pub fn filter_non_books(
    candidates: Vec<Candidate>,
    rejected: &mut Vec<RejectedCandidate>,
) -> Vec<Candidate> {
    apply_stage(candidates, Stage::NonBook, rejected, |c| non_book_reason(&c.title))
}
