//! Overlapping tile grid and position projection.
//!
//! A shelf photo is cut into a `columns × rows` grid of cells; each tile is
//! its cell grown by `overlap × cell` on every side and clipped to the
//! image, so spines straddling a cell border appear whole in at least one
//! tile. Tiles are numbered row-major.
//!
//! Candidate positions come back in percent of the tile; [`project_position`]
//! maps them into percent of the whole image.

use serde::Serialize;

use crate::models::Position;

/// Default spine width, in percent of the tile, when projecting a bare point.
pub const DEFAULT_PROJECTED_WIDTH: f64 = 10.0;
/// Default spine height, in percent of the tile, when projecting a bare point.
pub const DEFAULT_PROJECTED_HEIGHT: f64 = 15.0;

/// Grid shape used to cut an image into tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGrid {
    pub columns: u32,
    pub rows: u32,
    /// Fraction of a cell added on each side, in `[0, 1)`.
    pub overlap: f64,
}

impl Default for TileGrid {
    fn default() -> Self {
        Self {
            columns: 5,
            rows: 4,
            overlap: 0.5,
        }
    }
}

/// One tile's pixel rectangle within the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileRect {
    pub index: usize,
    pub row: u32,
    pub col: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Cut an `image_width × image_height` image into overlapping tiles.
///
/// Returns tiles in row-major order, or nothing when the grid has more
/// columns or rows than the image has pixels.
pub fn plan_tiles(image_width: u32, image_height: u32, grid: &TileGrid) -> Vec<TileRect> {
    if grid.columns == 0 || grid.rows == 0 {
        return Vec::new();
    }

    let cell_w = image_width / grid.columns;
    let cell_h = image_height / grid.rows;
    if cell_w == 0 || cell_h == 0 {
        return Vec::new();
    }
    let overlap = grid.overlap.clamp(0.0, 1.0);
    let ov_x = (cell_w as f64 * overlap).floor() as u32;
    let ov_y = (cell_h as f64 * overlap).floor() as u32;

    let mut tiles = Vec::new();
    for row in 0..grid.rows {
        for col in 0..grid.columns {
            let (x0, x1) = span(col, cell_w, ov_x, image_width);
            let (y0, y1) = span(row, cell_h, ov_y, image_height);
            if x1 <= x0 || y1 <= y0 {
                continue;
            }
            tiles.push(TileRect {
                index: tiles.len(),
                row,
                col,
                x: x0,
                y: y0,
                width: x1 - x0,
                height: y1 - y0,
            });
        }
    }
    tiles
}

fn span(i: u32, cell: u32, overlap: u32, limit: u32) -> (u32, u32) {
    let start = (i * cell).saturating_sub(overlap);
    let end = ((i + 1) * cell).saturating_add(overlap).min(limit);
    (start, end)
}

/// Map a tile-relative position to image-relative percentages.
///
/// Missing sizes default to [`DEFAULT_PROJECTED_WIDTH`] and
/// [`DEFAULT_PROJECTED_HEIGHT`] percent of the tile.
pub fn project_position(
    pos: &Position,
    tile: &TileRect,
    image_width: u32,
    image_height: u32,
) -> Position {
    if image_width == 0 || image_height == 0 {
        return *pos;
    }
    let (iw, ih) = (image_width as f64, image_height as f64);
    let (tw, th) = (tile.width as f64, tile.height as f64);

    let width = pos.width.unwrap_or(DEFAULT_PROJECTED_WIDTH);
    let height = pos.height.unwrap_or(DEFAULT_PROJECTED_HEIGHT);

    Position {
        x: (tile.x as f64 + pos.x / 100.0 * tw) / iw * 100.0,
        y: (tile.y as f64 + pos.y / 100.0 * th) / ih * 100.0,
        width: Some(width / 100.0 * tw / iw * 100.0),
        height: Some(height / 100.0 * th / ih * 100.0),
    }
}
