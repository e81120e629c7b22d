//! # Shelfscan
//!
//! Turns what a vision model reads off a bookshelf photo into a clean list
//! of book titles worth looking up.
//!
//! A shelf photo is cut into overlapping tiles; each tile's reply is parsed
//! into raw candidates, positioned on the whole image, and the combined
//! list is reconciled: non-books, author names, hallucinations and
//! near-duplicates are removed, leaving titles in reading order.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │ Tile planner │──▶│ VisionClient │──▶│  Reconcile   │──▶│  Lookup  │
//! │  (tiles)     │   │ (scan/replay)│   │  (pipeline)  │   │ (catalog)│
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────┘
//! ```
//!
//! The pure pieces (models, filters, dedup, reply parsing, tile geometry)
//! live in `shelfscan-core` and are re-exported here. This crate adds the
//! configuration layer, the async scan and lookup drivers, and the `shelf`
//! binary.
//!
//! ## Quick Start
//!
//! ```bash
//! shelf reconcile candidates.json --report --format text
//! shelf check "by J.K. Rowling"
//! shelf tiles --width 4032 --height 3024
//! shelf scan ./replies --width 4032 --height 3024
//! shelf lookup candidates.json --catalog catalog.json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`reconcile`] | `reconcile` and `check` commands, report rendering |
//! | [`scan`] | Tile scan orchestration with rate-limit backoff |
//! | [`replay`] | Vision client backed by recorded replies |
//! | [`lookup`] | Catalog lookup driver |
//! | [`pipeline`] | The reconciliation pipeline (from `shelfscan-core`) |

pub mod config;
pub mod lookup;
pub mod reconcile;
pub mod replay;
pub mod scan;

pub use shelfscan_core::{
    dedup, filter, models, normalize, pipeline, response, tables, tiles, validate,
};
