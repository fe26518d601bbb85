use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::compare::{images_match, is_blank};
use crate::error::{Error, Result};
use crate::raster::{rasterize_svg, Rasterizer};
use crate::tile::TileGrid;

/// Compute the PNG paths for one render of a generated/source document pair,
/// both placed in the generated document's directory so they are easy to
/// compare side by side: `<stem><suffix>.png` and
/// `<sourceStem>-source<suffix>.png`. Stale files at either path are deleted.
pub fn render_paths(generated: &Path, source: &Path, suffix: &str) -> Result<(PathBuf, PathBuf)> {
    let dir = generated.parent().unwrap_or_else(|| Path::new("."));

    let generated_stem = generated
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();
    let generated_png = dir.join(format!("{generated_stem}{suffix}.png"));

    let source_stem = source.file_stem().unwrap_or_default().to_string_lossy();
    let source_png = dir.join(format!("{source_stem}-source{suffix}.png"));

    for path in [&generated_png, &source_png] {
        if path.exists() {
            fs::remove_file(path).map_err(|err| Error::io(path.as_path(), err))?;
        }
    }

    Ok((generated_png, source_png))
}

/// Rasterize two SVG documents at `dpi` and compare the renders under the
/// one-pixel-erosion tolerance.
pub fn svgs_equivalent(generated: &Path, source: &Path, dpi: u32) -> Result<bool> {
    let (png_generated, png_source) = render_paths(generated, source, "")?;

    rasterize_svg(generated, &png_generated, dpi)?;
    rasterize_svg(source, &png_source, dpi)?;

    images_match(&png_generated, &png_source)
}

/// Compare two gerber documents tile by tile.
///
/// The `window` (inches) anchored at `origin` is partitioned into a tile grid
/// that respects `max_pixels` (see [`TileGrid::compute`]); each tile of each
/// document is rendered through `rasterizer` and the per-tile verdicts are
/// AND'ed into the result. A document that renders fully blank across all
/// tiles is a broken test fixture and yields [`Error::BlankRender`] instead
/// of a verdict.
pub fn gerbers_equivalent<R: Rasterizer>(
    rasterizer: &R,
    generated: &Path,
    source: &Path,
    dpi: u32,
    origin: (f64, f64),
    window: (f64, f64),
    max_pixels: u64,
) -> Result<bool> {
    let grid = TileGrid::compute(window, dpi, max_pixels);
    debug!(
        "Comparing {} against {} with a {}x{} tile grid",
        generated.display(),
        source.display(),
        grid.rows,
        grid.cols
    );

    let mut generated_blank = true;
    let mut source_blank = true;
    let mut equal = true;

    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let tile_origin = grid.tile_origin(window, origin, row, col);
            let (png_generated, png_source) =
                render_paths(generated, source, &format!("R{row}C{col}"))?;

            rasterizer.rasterize(generated, &png_generated, dpi, tile_origin, grid.tile_size(window))?;
            rasterizer.rasterize(source, &png_source, dpi, tile_origin, grid.tile_size(window))?;

            generated_blank = generated_blank && is_blank(&image::open(&png_generated)?);
            source_blank = source_blank && is_blank(&image::open(&png_source)?);

            equal = equal && images_match(&png_generated, &png_source)?;
        }
    }

    if generated_blank {
        return Err(Error::BlankRender {
            path: generated.to_path_buf(),
        });
    }
    if source_blank {
        return Err(Error::BlankRender {
            path: source.to_path_buf(),
        });
    }

    if !equal {
        info!(
            "Gerber documents are not equivalent: {} vs {}",
            generated.display(),
            source.display()
        );
    }
    Ok(equal)
}
