//! Fixed lookup tables used by the title filters.
//!
//! All tables are immutable static data. Pattern tables pair a short label
//! (reported back in [`Rejection`](crate::models::Rejection)s) with a regex
//! that is compiled once on first use.
//!
//! The name lists are deliberately short and literal. Letting an author name
//! through only costs one fruitless catalog lookup; rejecting a real title
//! loses a book, so the lists only hold the most common names.

use regex::Regex;
use std::sync::LazyLock;

/// A labelled, compiled set of regexes checked in declaration order.
pub struct PatternTable {
    entries: Vec<(&'static str, Regex)>,
}

impl PatternTable {
    fn compile(specs: &[(&'static str, &'static str)]) -> Self {
        let entries = specs
            .iter()
            .map(|(label, pattern)| {
                let re = Regex::new(pattern)
                    .unwrap_or_else(|e| panic!("invalid pattern for '{}': {}", label, e));
                (*label, re)
            })
            .collect();
        Self { entries }
    }

    /// Label of the first entry matching `text`, if any.
    pub fn first_match(&self, text: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(label, _)| *label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Matched against the trimmed, lower-cased title.
const NON_BOOK_SPECS: &[(&str, &str)] = &[
    // games and media
    ("connect 4", r"^connect\s*4$"),
    ("pentago", r"^pentago$"),
    ("ticket to ride", r"^ticket\s*to\s*ride$"),
    ("monopoly", r"^monopoly$"),
    ("scrabble", r"^scrabble$"),
    ("chess", r"^chess$"),
    ("dvd", r"^dvd$"),
    ("cd", r"^cd$"),
    ("blu-ray", r"^blu[-\s]*ray$"),
    ("game", r"^game$"),
    ("board game", r"^board\s*game$"),
    // bare tokens
    // 10 to 13 digits is left for the ISBN rule in the validity stage
    ("number", r"^(?:\d{1,9}|\d{14,})$"),
    ("single letter", r"^[a-z]$"),
    // author bylines
    ("initials and surname", r"^[a-z]\.\s*[a-z]\.\s*[a-z]+$"),
    ("byline", r"^by\s+[a-z]"),
    // publisher imprints
    ("penguin", r"^penguin\s*(classics?)?$"),
    ("random house", r"^random\s*house$"),
    ("bantam", r"^bantam$"),
    ("vintage", r"^vintage$"),
    ("harpercollins", r"^harper\s*(collins?)?$"),
    // surnames of classics authors that get read off spines on their own
    ("shakespeare", r"^shakespeare$"),
    ("dickens", r"^dickens$"),
    ("austen", r"^austen$"),
    ("tolkien", r"^tolkien$"),
    ("hemingway", r"^hemingway$"),
    ("steinbeck", r"^steinbeck$"),
];

const DOCUMENT_SPECS: &[(&str, &str)] = &[
    ("census", r"(?i)census\s+of\s+population"),
    ("united states summary", r"(?i)united\s+states\s+summary"),
    ("population and housing", r"(?i)population\s+and\s+housing"),
    ("characteristics", r"(?i)characteristics"),
    ("federal register", r"(?i)federal\s+register"),
    ("government publication", r"(?i)government\s+publication"),
    ("year summary", r"(?i)\d{4}:\s*[a-z]+\s+summary"),
    ("summary characteristics", r"(?i)summary\s+[a-z]+\s+characteristics"),
];

const ISBN_SPECS: &[(&str, &str)] = &[
    ("isbn digits", r"^\d{10,13}$"),
    ("isbn-13", r"978\d{10}"),
];

const PLACEHOLDER_SPECS: &[(&str, &str)] = &[
    ("unknown author", r"(?i)unknown\s+author"),
    ("no title", r"(?i)no\s+title"),
    ("untitled", r"(?i)untitled"),
    ("book number", r"(?i)book\s+\d+$"),
    ("volume number", r"(?i)volume\s+\d+$"),
    ("chapter number", r"(?i)chapter\s+\d+$"),
];

/// Games, media formats, bylines, imprints and lone classics surnames.
pub static NON_BOOK_PATTERNS: LazyLock<PatternTable> =
    LazyLock::new(|| PatternTable::compile(NON_BOOK_SPECS));

/// Official-document phrasing vision models hallucinate from shelf labels.
pub static DOCUMENT_PATTERNS: LazyLock<PatternTable> =
    LazyLock::new(|| PatternTable::compile(DOCUMENT_SPECS));

/// Numeric strings shaped like an ISBN.
pub static ISBN_PATTERNS: LazyLock<PatternTable> =
    LazyLock::new(|| PatternTable::compile(ISBN_SPECS));

/// Generic placeholder phrasing.
pub static PLACEHOLDER_PATTERNS: LazyLock<PatternTable> =
    LazyLock::new(|| PatternTable::compile(PLACEHOLDER_SPECS));

/// Surnames flagged when a candidate is a single word.
pub const SINGLE_WORD_SURNAMES: &[&str] = &[
    "king", "smith", "brown", "jones", "miller", "davis", "garcia", "rodriguez", "wilson",
    "martinez", "anderson", "taylor", "thomas", "hernandez", "moore", "martin", "jackson",
    "thompson", "white", "lopez", "lee", "gonzalez", "harris", "clark", "lewis", "robinson",
    "walker", "perez", "hall", "young",
];

/// First names flagged when followed by one of [`PAIRED_SURNAMES`].
pub const FIRST_NAMES: &[&str] = &[
    "john", "mary", "james", "robert", "michael", "william", "david", "richard", "joseph",
    "thomas",
];

pub const PAIRED_SURNAMES: &[&str] = &[
    "smith", "johnson", "williams", "brown", "jones", "garcia", "miller", "davis", "rodriguez",
    "martinez",
];

/// Case-insensitive membership test against one of the lower-case name lists.
pub fn in_name_list(list: &[&str], word: &str) -> bool {
    let lower = word.to_lowercase();
    list.contains(&lower.as_str())
}
