/// Decoded-pixel budget used when none is supplied: ~800MB of uncompressed
/// RGBA at 4 bytes per pixel.
pub const DEFAULT_MAX_PIXELS: u64 = 800 * 1024 * 1024 / 4;

/// A rows x cols partition of a document window into equal tiles, sized so
/// that one decoded tile stays within half of a pixel budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub rows: u32,
    pub cols: u32,
}

impl TileGrid {
    /// Grow a 1x1 grid until a single tile at `dpi` fits in `max_pixels / 2`,
    /// incrementing rows and columns alternately starting with rows. Tile
    /// area strictly decreases each step, so this terminates.
    pub fn compute(window: (f64, f64), dpi: u32, max_pixels: u64) -> TileGrid {
        let mut grid = TileGrid { rows: 1, cols: 1 };
        let mut grow_rows = true;
        // A budget below one pixel is never satisfiable; clamp so the loop
        // still terminates once a tile shrinks to a single pixel.
        let budget = ((max_pixels / 2) as f64).max(1.0);
        let dpi = dpi as f64;

        loop {
            let tile = grid.tile_size(window);
            if tile.0 * dpi * tile.1 * dpi <= budget {
                return grid;
            }
            if grow_rows {
                grid.rows += 1;
            } else {
                grid.cols += 1;
            }
            grow_rows = !grow_rows;
        }
    }

    /// Tile size in inches: the first window axis is split across rows, the
    /// second across columns.
    pub fn tile_size(&self, window: (f64, f64)) -> (f64, f64) {
        (window.0 / self.rows as f64, window.1 / self.cols as f64)
    }

    /// Physical origin of the tile at (row, col): each index advances its
    /// axis by one tile size.
    pub fn tile_origin(&self, window: (f64, f64), origin: (f64, f64), row: u32, col: u32) -> (f64, f64) {
        let tile = self.tile_size(window);
        (
            origin.0 + row as f64 * tile.0,
            origin.1 + col as f64 * tile.1,
        )
    }
}
