//! Recorded vision replies.
//!
//! A replay directory holds one reply file per tile. Files are sorted by
//! name and matched to tiles by position, so `tile-00.txt`, `tile-01.txt`,
//! ... line up with tile indices 0, 1, .... Hidden files are ignored.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use shelfscan_core::tiles::TileRect;

use crate::scan::{VisionClient, VisionError};

/// A [`VisionClient`] that answers from files on disk.
#[derive(Debug, Clone)]
pub struct ReplayClient {
    files: Vec<PathBuf>,
}

impl ReplayClient {
    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            bail!("Replay directory does not exist: {}", dir.display());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry
                .with_context(|| format!("Failed to read replay directory: {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            files.push(entry.into_path());
        }

        tracing::debug!(dir = %dir.display(), replies = files.len(), "loaded replay directory");
        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl VisionClient for ReplayClient {
    async fn analyze_tile(&self, tile: &TileRect) -> Result<String, VisionError> {
        let path = self
            .files
            .get(tile.index)
            .ok_or_else(|| anyhow::anyhow!("no recorded reply for tile {}", tile.index + 1))?;

        let reply = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read reply file: {}", path.display()))?;
        Ok(reply)
    }
}
