use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::exec::run_and_capture;

/// SVG user units per inch (CSS reference pixel).
const SVG_UNITS_PER_INCH: f32 = 96.0;

/// A capability that renders one rectangular window of a document to a PNG
/// file. Injected into the tiled comparison so tests can substitute a fake.
pub trait Rasterizer {
    /// Render the `window` (width, height in inches) of `source`, whose lower
    /// corner sits at `origin` (inches), at `dpi` into `png_out`.
    fn rasterize(
        &self,
        source: &Path,
        png_out: &Path,
        dpi: u32,
        origin: (f64, f64),
        window: (f64, f64),
    ) -> Result<()>;
}

/// Rasterizes gerber files by shelling out to the `gerbv` executable.
#[derive(Debug, Clone)]
pub struct GerbvRasterizer {
    command: String,
}

impl GerbvRasterizer {
    pub fn new() -> Self {
        Self {
            command: "gerbv".to_string(),
        }
    }

    /// Use an alternative executable name or path instead of `gerbv`.
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Health probe: true iff the configured executable runs `--version`
    /// successfully and prints the expected banner.
    pub fn installed(&self) -> bool {
        match run_and_capture(&self.command, ["--version"]) {
            Ok(output) => output.success() && output.stdout.starts_with("gerbv version"),
            Err(_) => false,
        }
    }

    fn export_args(
        source: &Path,
        png_out: &Path,
        dpi: u32,
        origin: (f64, f64),
        window: (f64, f64),
    ) -> Vec<String> {
        vec![
            "--export=png".to_string(),
            format!("--dpi={dpi}"),
            format!("--origin={:.2}x{:.2}", origin.0, origin.1),
            format!("--window_inch={:.2}x{:.2}", window.0, window.1),
            format!("--output={}", png_out.display()),
            "--foreground=#FFFFFF".to_string(),
            "--background=#000000".to_string(),
            source.display().to_string(),
        ]
    }
}

impl Default for GerbvRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for GerbvRasterizer {
    fn rasterize(
        &self,
        source: &Path,
        png_out: &Path,
        dpi: u32,
        origin: (f64, f64),
        window: (f64, f64),
    ) -> Result<()> {
        let args = Self::export_args(source, png_out, dpi, origin, window);
        let output = run_and_capture(&self.command, &args)?;
        if !output.success() {
            return Err(Error::Rasterization {
                status: output.status,
                stderr: output.stderr,
            });
        }
        Ok(())
    }
}

/// Health probe for the default `gerbv` executable.
pub fn gerbv_installed() -> bool {
    GerbvRasterizer::new().installed()
}

/// Render a whole SVG document to a PNG file at the given resolution,
/// in-process via resvg. The document size in SVG user units is mapped to
/// inches at 96 units per inch.
pub fn rasterize_svg(svg_path: &Path, png_out: &Path, dpi: u32) -> Result<()> {
    let svg_str = fs::read_to_string(svg_path).map_err(|err| Error::io(svg_path, err))?;
    let tree = usvg::Tree::from_str(&svg_str, &usvg::Options::default())?;

    let scale = dpi as f32 / SVG_UNITS_PER_INCH;
    let size = tree.size();
    let width = (size.width() * scale).round().max(1.0) as u32;
    let height = (size.height() * scale).round().max(1.0) as u32;

    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(Error::SvgRender { width, height })?;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    pixmap
        .save_png(png_out)
        .map_err(|err| Error::PngEncode(err.to_string()))?;
    Ok(())
}
