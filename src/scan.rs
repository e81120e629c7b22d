//! Tile scan orchestration.
//!
//! Drives a [`VisionClient`] over every tile of a planned grid, one call at
//! a time, then hands the gathered candidates to the reconciliation
//! pipeline.
//!
//! # Flow
//!
//! ```text
//! plan_tiles ──▶ for each tile:
//!                  analyze_tile ──(429)──▶ backoff, retry (≤ max_attempts)
//!                  parse_reply ──▶ project positions ──▶ collect
//!                  sleep inter_tile_delay (not after the last tile)
//!            ──▶ reconcile
//! ```
//!
//! A tile that fails (any non-rate-limit error, or rate limits past the last
//! attempt) is counted and skipped; the scan always runs to the end.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tracing::{info, warn};

use shelfscan_core::models::RawCandidate;
use shelfscan_core::pipeline::reconcile_with;
use shelfscan_core::response::parse_reply;
use shelfscan_core::tiles::{plan_tiles, project_position, TileRect};

use crate::config::{Config, ScanConfig};
use crate::reconcile::{print_report, OutputFormat};
use crate::replay::ReplayClient;

/// Error returned by a [`VisionClient`].
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    /// The API asked us to slow down; worth retrying after a backoff.
    #[error("vision API rate limit exceeded")]
    RateLimited,
    /// Anything else; the tile is given up.
    #[error("vision request failed: {0:#}")]
    Failed(#[from] anyhow::Error),
}

/// A vision model that reads book titles off one tile.
///
/// Implementations return the model's raw reply text; parsing and
/// sanitizing happen in [`scan_tiles`].
#[async_trait]
pub trait VisionClient: Send + Sync {
    async fn analyze_tile(&self, tile: &TileRect) -> Result<String, VisionError>;
}

/// Candidates gathered from one scan, plus per-tile bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub candidates: Vec<RawCandidate>,
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
}

/// Analyze every tile in order and collect image-relative candidates.
pub async fn scan_tiles(
    client: &dyn VisionClient,
    tiles: &[TileRect],
    image_width: u32,
    image_height: u32,
    settings: &ScanConfig,
) -> ScanOutcome {
    let mut outcome = ScanOutcome {
        total: tiles.len(),
        ..Default::default()
    };

    for (i, tile) in tiles.iter().enumerate() {
        info!(tile = i + 1, total = tiles.len(), "scanning tile");

        match analyze_with_retry(client, tile, settings).await {
            Ok(reply) => {
                let found = parse_reply(&reply);
                info!(tile = i + 1, found = found.len(), "tile analyzed");
                outcome.candidates.extend(found.into_iter().map(|mut raw| {
                    raw.position = raw
                        .position
                        .map(|p| project_position(&p, tile, image_width, image_height));
                    raw
                }));
                outcome.successful += 1;
            }
            Err(e) => {
                warn!(tile = i + 1, error = %e, "tile analysis failed");
                outcome.failed += 1;
            }
        }

        let delay = settings.inter_tile_delay();
        if i + 1 < tiles.len() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    info!(
        successful = outcome.successful,
        failed = outcome.failed,
        total = outcome.total,
        candidates = outcome.candidates.len(),
        "scan complete"
    );
    outcome
}

async fn analyze_with_retry(
    client: &dyn VisionClient,
    tile: &TileRect,
    settings: &ScanConfig,
) -> Result<String, VisionError> {
    let mut attempt = 1;
    loop {
        match client.analyze_tile(tile).await {
            Err(VisionError::RateLimited) if attempt < settings.max_attempts => {
                let delay = settings.backoff(attempt);
                info!(
                    tile = tile.index + 1,
                    attempt,
                    max_attempts = settings.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "rate limited, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// `shelf scan`: replay recorded tile replies and reconcile them.
pub async fn run_scan(
    config: &Config,
    dir: &Path,
    image_width: u32,
    image_height: u32,
    format: OutputFormat,
    show_report: bool,
) -> Result<()> {
    let tiles = plan_tiles(image_width, image_height, &config.tiles.grid());
    if tiles.is_empty() {
        anyhow::bail!(
            "Image {}x{} is too small for a {}x{} tile grid",
            image_width,
            image_height,
            config.tiles.columns,
            config.tiles.rows
        );
    }

    let client = ReplayClient::from_dir(dir)?;
    if client.len() != tiles.len() {
        warn!(
            replies = client.len(),
            tiles = tiles.len(),
            "reply count does not match tile count"
        );
    }

    let outcome = scan_tiles(&client, &tiles, image_width, image_height, &config.scan).await;
    eprintln!(
        "Scanned {}/{} tiles ({} failed), {} raw titles",
        outcome.successful,
        outcome.total,
        outcome.failed,
        outcome.candidates.len()
    );

    let report = reconcile_with(outcome.candidates, &config.reconcile.options());
    print_report(&report, format, show_report)
}

/// `shelf tiles`: print the tile plan for an image size.
pub fn run_tiles(
    config: &Config,
    image_width: u32,
    image_height: u32,
    format: OutputFormat,
) -> Result<()> {
    let tiles = plan_tiles(image_width, image_height, &config.tiles.grid());
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tiles)?),
        OutputFormat::Text => {
            println!(
                "{} tiles ({}x{} grid, {:.0}% overlap) for {}x{}",
                tiles.len(),
                config.tiles.columns,
                config.tiles.rows,
                config.tiles.overlap * 100.0,
                image_width,
                image_height
            );
            for t in &tiles {
                println!(
                    "  #{:<3} row {} col {}  x={} y={} {}x{}",
                    t.index + 1,
                    t.row,
                    t.col,
                    t.x,
                    t.y,
                    t.width,
                    t.height
                );
            }
        }
    }
    Ok(())
}
