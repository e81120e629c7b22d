//! # Shelfscan Core
//!
//! Pure, I/O-free logic for Shelfscan: candidate models, the title
//! reconciliation pipeline, vision reply parsing, and tile geometry.
//!
//! This crate contains no tokio, no network or filesystem access, and no
//! global mutable state. Every function takes its inputs explicitly, so the
//! pipeline can be called from any number of batches concurrently.
//!
//! # Pipeline
//!
//! ```text
//! raw candidates ──▶ normalize ──▶ non-book filter ──▶ validity filter ──▶ dedup
//!  (per tile)        (confidence)   (games, authors)    (hallucinations)    (first wins)
//! ```
//!
//! # Example
//!
//! ```rust
//! use shelfscan_core::models::{Confidence, RawCandidate};
//! use shelfscan_core::pipeline::reconcile;
//!
//! let raw = vec![
//!     RawCandidate::new("The Great Gatsby").with_confidence(Confidence::High),
//!     RawCandidate::new("Connect 4"),
//!     RawCandidate::new("Great Gatsby"),
//! ];
//! let titles = reconcile(raw);
//! assert_eq!(titles.len(), 1);
//! assert_eq!(titles[0].title, "The Great Gatsby");
//! ```

pub mod dedup;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod response;
pub mod tables;
pub mod tiles;
pub mod validate;
