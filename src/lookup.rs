//! Catalog lookup for reconciled titles.
//!
//! Each surviving candidate is turned into a search query and looked up one
//! at a time through a [`TitleLookup`]. Matches whose ISBN is already in the
//! user's library, or was already matched earlier in the batch, are set
//! aside instead of being added twice.
//!
//! The bundled [`CatalogLookup`] answers from a local JSON catalog, which is
//! what `shelf lookup` uses.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shelfscan_core::dedup::{normalize_title, similarity, SIMILARITY_THRESHOLD};
use shelfscan_core::models::{Candidate, Confidence, Position};

use crate::config::{Config, LookupConfig};
use crate::reconcile::{read_candidates, OutputFormat};

/// Longest query sent to a catalog.
pub const MAX_QUERY_CHARS: usize = 100;

static NON_QUERY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s\-']").expect("valid query regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// One catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookMatch {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl BookMatch {
    /// The ISBN, unless it is missing or a placeholder such as `N/A`.
    pub fn usable_isbn(&self) -> Option<&str> {
        self.isbn
            .as_deref()
            .map(str::trim)
            .filter(|isbn| !isbn.is_empty() && !isbn.eq_ignore_ascii_case("n/a"))
    }
}

/// Resolves a query to at most one catalog match.
#[async_trait]
pub trait TitleLookup: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<Option<BookMatch>>;
}

/// A matched book ready to be added to a library.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryEntry {
    pub id: String,
    #[serde(flatten)]
    pub book: BookMatch,
    pub confidence: Confidence,
    #[serde(flatten)]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl LibraryEntry {
    pub fn from_match(book: BookMatch, candidate: &Candidate, photo: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            book,
            confidence: candidate.confidence,
            position: candidate.position,
            photo: photo.map(str::to_string),
            added_at: Utc::now(),
        }
    }
}

/// Result of looking up a batch of candidates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LookupOutcome {
    pub found: Vec<LibraryEntry>,
    pub not_found: Vec<String>,
    pub already_in_library: Vec<String>,
    /// Candidates past `max_titles` that were never looked up.
    pub skipped: usize,
}

/// Turn a spine title into a catalog query.
///
/// Punctuation other than `-` and `'` becomes a space, whitespace runs
/// collapse, and the result is cut to [`MAX_QUERY_CHARS`] characters.
pub fn clean_query(title: &str) -> String {
    let spaced = NON_QUERY_CHARS.replace_all(title, " ");
    let collapsed = WHITESPACE.replace_all(spaced.trim(), " ");
    collapsed.chars().take(MAX_QUERY_CHARS).collect::<String>().trim_end().to_string()
}

/// Look up candidates in order, one request at a time.
pub async fn lookup_titles(
    lookup: &dyn TitleLookup,
    candidates: &[Candidate],
    existing_isbns: &HashSet<String>,
    settings: &LookupConfig,
    photo: Option<&str>,
) -> LookupOutcome {
    let batch = &candidates[..candidates.len().min(settings.max_titles)];
    let mut outcome = LookupOutcome {
        skipped: candidates.len() - batch.len(),
        ..Default::default()
    };
    if outcome.skipped > 0 {
        warn!(
            max_titles = settings.max_titles,
            skipped = outcome.skipped,
            "too many titles, looking up only the first batch"
        );
    }

    let mut seen_isbns: HashSet<String> = HashSet::new();
    for (i, candidate) in batch.iter().enumerate() {
        let query = clean_query(&candidate.title);
        debug!(title = %candidate.title, query = %query, "looking up title");

        match lookup.lookup(&query).await {
            Ok(Some(book)) => {
                let isbn = book.usable_isbn().map(str::to_string);
                match isbn {
                    Some(isbn) if existing_isbns.contains(&isbn) || seen_isbns.contains(&isbn) => {
                        debug!(title = %candidate.title, isbn = %isbn, "already in library");
                        outcome.already_in_library.push(candidate.title.clone());
                    }
                    _ => {
                        if let Some(isbn) = isbn {
                            seen_isbns.insert(isbn);
                        }
                        outcome.found.push(LibraryEntry::from_match(book, candidate, photo));
                    }
                }
            }
            Ok(None) => outcome.not_found.push(candidate.title.clone()),
            Err(e) => {
                let error = format!("{:#}", e);
                warn!(title = %candidate.title, error = %error, "lookup failed");
                outcome.not_found.push(candidate.title.clone());
            }
        }

        let delay = settings.delay();
        if i + 1 < batch.len() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    info!(
        found = outcome.found.len(),
        not_found = outcome.not_found.len(),
        already_in_library = outcome.already_in_library.len(),
        "lookup complete"
    );
    outcome
}

/// A [`TitleLookup`] over an in-memory catalog.
///
/// An exact match on the normalized title wins; otherwise the most similar
/// title above the similarity threshold is returned.
#[derive(Debug, Clone, Default)]
pub struct CatalogLookup {
    books: Vec<BookMatch>,
}

impl CatalogLookup {
    pub fn new(books: Vec<BookMatch>) -> Self {
        Self { books }
    }

    /// Load a catalog from a JSON array of book records.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
        let books: Vec<BookMatch> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog: {}", path.display()))?;
        Ok(Self::new(books))
    }

    fn best_match(&self, query: &str) -> Option<&BookMatch> {
        let wanted = normalize_title(&clean_query(query));
        if wanted.is_empty() {
            return None;
        }
        let key = |b: &BookMatch| normalize_title(&clean_query(&b.title));

        if let Some(exact) = self.books.iter().find(|b| key(b) == wanted) {
            return Some(exact);
        }

        self.books
            .iter()
            .map(|b| (similarity(&wanted, &key(b)), b))
            .filter(|(score, _)| *score > SIMILARITY_THRESHOLD)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, b)| b)
    }
}

#[async_trait]
impl TitleLookup for CatalogLookup {
    async fn lookup(&self, query: &str) -> Result<Option<BookMatch>> {
        Ok(self.best_match(query).cloned())
    }
}

/// Read a library ISBN list: one ISBN per line, blank lines and `#`
/// comments ignored.
pub fn load_library_isbns(path: &Path) -> Result<HashSet<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read library file: {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// `shelf lookup`: reconcile a candidate file, then look up the survivors.
pub async fn run_lookup(
    config: &Config,
    input: &str,
    catalog: &Path,
    library: Option<&Path>,
    photo: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let values = read_candidates(input)?;
    let report = shelfscan_core::pipeline::reconcile_values(&values, &config.reconcile.options());
    if report.nothing_detected() {
        eprintln!("No book titles detected. Nothing to look up.");
        return Ok(());
    }

    let lookup = CatalogLookup::from_file(catalog)?;
    let existing = match library {
        Some(path) => load_library_isbns(path)?,
        None => HashSet::new(),
    };

    let outcome = lookup_titles(&lookup, &report.candidates, &existing, &config.lookup, photo).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => {
            for entry in &outcome.found {
                let authors = if entry.book.authors.is_empty() {
                    "unknown author".to_string()
                } else {
                    entry.book.authors.join(", ")
                };
                println!(
                    "+ {} ({}) isbn={}",
                    entry.book.title,
                    authors,
                    entry.book.usable_isbn().unwrap_or("-")
                );
            }
            for title in &outcome.already_in_library {
                println!("= {} (already in library)", title);
            }
            for title in &outcome.not_found {
                println!("? {} (not found)", title);
            }
            println!(
                "\n{} found, {} already in library, {} not found",
                outcome.found.len(),
                outcome.already_in_library.len(),
                outcome.not_found.len()
            );
        }
    }
    Ok(())
}
