//! TOML configuration parsing.
//!
//! Every section is optional; a missing file or missing key falls back to
//! the defaults below. [`load_config`] validates ranges after parsing.
//!
//! ```toml
//! [reconcile]
//! similarity_threshold = 0.8
//!
//! [tiles]
//! columns = 5
//! rows = 4
//! overlap = 0.5
//!
//! [scan]
//! inter_tile_delay_ms = 1000
//! max_attempts = 3
//! backoff_base_ms = 2000
//! backoff_factor = 2.5
//! backoff_max_ms = 15000
//!
//! [lookup]
//! max_titles = 150
//! delay_ms = 300
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use shelfscan_core::dedup::SIMILARITY_THRESHOLD;
use shelfscan_core::pipeline::ReconcileOptions;
use shelfscan_core::tiles::TileGrid;

/// Largest number of tile columns or rows accepted from a config file.
pub const MAX_GRID_SIDE: u32 = 64;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub tiles: TilesConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReconcileConfig {
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

fn default_similarity_threshold() -> f64 {
    SIMILARITY_THRESHOLD
}

#[derive(Debug, Deserialize, Clone)]
pub struct TilesConfig {
    #[serde(default = "default_columns")]
    pub columns: u32,
    #[serde(default = "default_rows")]
    pub rows: u32,
    #[serde(default = "default_overlap")]
    pub overlap: f64,
}

impl Default for TilesConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            rows: default_rows(),
            overlap: default_overlap(),
        }
    }
}

fn default_columns() -> u32 {
    5
}
fn default_rows() -> u32 {
    4
}
fn default_overlap() -> f64 {
    0.5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    #[serde(default = "default_inter_tile_delay_ms")]
    pub inter_tile_delay_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            inter_tile_delay_ms: default_inter_tile_delay_ms(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_factor: default_backoff_factor(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

fn default_inter_tile_delay_ms() -> u64 {
    1000
}
fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_base_ms() -> u64 {
    2000
}
fn default_backoff_factor() -> f64 {
    2.5
}
fn default_backoff_max_ms() -> u64 {
    15000
}

#[derive(Debug, Deserialize, Clone)]
pub struct LookupConfig {
    #[serde(default = "default_max_titles")]
    pub max_titles: usize,
    #[serde(default = "default_lookup_delay_ms")]
    pub delay_ms: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            max_titles: default_max_titles(),
            delay_ms: default_lookup_delay_ms(),
        }
    }
}

fn default_max_titles() -> usize {
    150
}
fn default_lookup_delay_ms() -> u64 {
    300
}

impl ReconcileConfig {
    pub fn options(&self) -> ReconcileOptions {
        ReconcileOptions {
            similarity_threshold: self.similarity_threshold,
        }
    }
}

impl TilesConfig {
    pub fn grid(&self) -> TileGrid {
        TileGrid {
            columns: self.columns,
            rows: self.rows,
            overlap: self.overlap,
        }
    }
}

impl ScanConfig {
    pub fn inter_tile_delay(&self) -> Duration {
        Duration::from_millis(self.inter_tile_delay_ms)
    }

    /// Backoff before retry number `attempt` (1-based) after a rate limit:
    /// `min(base × factor^(attempt − 1), max)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1) as i32;
        let ms = self.backoff_base_ms as f64 * self.backoff_factor.powi(exp);
        Duration::from_millis(ms.min(self.backoff_max_ms as f64) as u64)
    }
}

impl LookupConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Parse and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise use built-in defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    let t = config.reconcile.similarity_threshold;
    if !(t > 0.0 && t <= 1.0) {
        anyhow::bail!("reconcile.similarity_threshold must be in (0.0, 1.0]");
    }

    if config.tiles.columns == 0 || config.tiles.rows == 0 {
        anyhow::bail!("tiles.columns and tiles.rows must be >= 1");
    }
    if config.tiles.columns > MAX_GRID_SIDE || config.tiles.rows > MAX_GRID_SIDE {
        anyhow::bail!("tiles.columns and tiles.rows must be <= {}", MAX_GRID_SIDE);
    }
    if !(0.0..1.0).contains(&config.tiles.overlap) {
        anyhow::bail!("tiles.overlap must be in [0.0, 1.0)");
    }

    if config.scan.max_attempts == 0 {
        anyhow::bail!("scan.max_attempts must be >= 1");
    }
    if !(config.scan.backoff_factor >= 1.0) {
        anyhow::bail!("scan.backoff_factor must be >= 1.0");
    }

    if config.lookup.max_titles == 0 {
        anyhow::bail!("lookup.max_titles must be >= 1");
    }

    Ok(())
}
