use std::path::Path;

use image::{ColorType, DynamicImage, GenericImageView, GrayImage, Luma};
use log::info;

use crate::error::Result;

/// Outcome of comparing two decoded images.
#[derive(Debug)]
pub enum ImageComparison {
    /// The images have different pixel dimensions. Definitive mismatch.
    DimensionMismatch,
    /// The images have different channel layouts. Definitive mismatch.
    ModeMismatch,
    /// Every sample of every pixel is identical.
    Identical,
    /// Some pixels differ, but every difference is single-pixel noise that a
    /// one-step erosion removes (antialiasing along curved edges).
    Tolerated(DiffDiagnostics),
    /// Differences survive erosion; the images genuinely differ.
    Different(DiffDiagnostics),
}

impl ImageComparison {
    pub fn is_match(&self) -> bool {
        matches!(self, ImageComparison::Identical | ImageComparison::Tolerated(_))
    }
}

/// Intermediate images produced while judging a nonzero pixel difference.
/// Callers decide whether and where to persist them.
#[derive(Debug)]
pub struct DiffDiagnostics {
    width: u32,
    height: u32,
    color: ColorType,
    /// Raw per-sample absolute difference, same layout as the inputs.
    pub difference: Vec<u8>,
    /// Per-pixel mask: 255 where any channel differs, 0 elsewhere.
    pub binary_mask: GrayImage,
    /// The binary mask after one 3x3 min-filter erosion.
    pub eroded_mask: GrayImage,
    /// Number of pixels that survived erosion.
    pub eroded_count: u64,
}

impl DiffDiagnostics {
    /// Persist the three diagnostic images beside `image_path`:
    /// `<path>.diff.png`, `<path>.binary_result.png` and
    /// `<path>.eroded_result_<count>.png`.
    pub fn write_beside(&self, image_path: &Path) -> Result<()> {
        let base = image_path.display();

        image::save_buffer(
            format!("{base}.diff.png"),
            &self.difference,
            self.width,
            self.height,
            image::ExtendedColorType::from(self.color),
        )?;
        self.binary_mask.save(format!("{base}.binary_result.png"))?;
        self.eroded_mask
            .save(format!("{base}.eroded_result_{}.png", self.eroded_count))?;
        Ok(())
    }
}

/// Compare two images under a one-pixel-erosion tolerance.
///
/// The difference image is thresholded per channel, the channel masks are
/// OR'd together, and the combined mask is eroded once with a 3x3 min filter
/// (out-of-bounds neighbors count as zero, so border pixels always erode
/// away). The images are considered a match when nothing survives erosion.
pub fn compare(a: &DynamicImage, b: &DynamicImage) -> ImageComparison {
    if a.dimensions() != b.dimensions() {
        return ImageComparison::DimensionMismatch;
    }
    if a.color() != b.color() {
        return ImageComparison::ModeMismatch;
    }

    let difference: Vec<u8> = a
        .as_bytes()
        .iter()
        .zip(b.as_bytes())
        .map(|(&x, &y)| x.abs_diff(y))
        .collect();

    if difference.iter().all(|&d| d == 0) {
        return ImageComparison::Identical;
    }

    let (width, height) = a.dimensions();
    // Bytes per pixel across all channels; a pixel differs if any byte does,
    // which is the thresholded per-channel masks OR'd together.
    let stride = difference.len() / (width as usize * height as usize);
    let mut binary_mask = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let base = (y as usize * width as usize + x as usize) * stride;
            let differs = difference[base..base + stride].iter().any(|&d| d != 0);
            binary_mask.put_pixel(x, y, Luma([if differs { 255 } else { 0 }]));
        }
    }

    let eroded_mask = erode(&binary_mask);
    let eroded_count = eroded_mask.pixels().filter(|p| p[0] != 0).count() as u64;

    let diagnostics = DiffDiagnostics {
        width,
        height,
        color: a.color(),
        difference,
        binary_mask,
        eroded_mask,
        eroded_count,
    };

    if eroded_count == 0 {
        ImageComparison::Tolerated(diagnostics)
    } else {
        ImageComparison::Different(diagnostics)
    }
}

/// One erosion step: a pixel stays set only if it and all 8 neighbors are
/// set. Neighbors outside the image count as unset.
fn erode(mask: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut eroded = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut min = 255u8;
            'window: for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                        min = 0;
                        break 'window;
                    }
                    min = min.min(mask.get_pixel(nx as u32, ny as u32)[0]);
                    if min == 0 {
                        break 'window;
                    }
                }
            }
            eroded.put_pixel(x, y, Luma([min]));
        }
    }
    eroded
}

/// True iff every channel of every pixel is zero.
pub fn is_blank(image: &DynamicImage) -> bool {
    image.as_bytes().iter().all(|&b| b == 0)
}

/// Decode two PNGs and compare them under the erosion tolerance. Whenever the
/// raw difference is nonzero (match or not), the diagnostic images are written
/// beside `path_a`.
pub fn images_match(path_a: &Path, path_b: &Path) -> Result<bool> {
    let a = image::open(path_a)?;
    let b = image::open(path_b)?;

    match compare(&a, &b) {
        ImageComparison::DimensionMismatch => {
            info!(
                "Image size mismatch: {} vs {}",
                path_a.display(),
                path_b.display()
            );
            Ok(false)
        }
        ImageComparison::ModeMismatch => {
            info!(
                "Image mode mismatch: {} vs {}",
                path_a.display(),
                path_b.display()
            );
            Ok(false)
        }
        ImageComparison::Identical => Ok(true),
        ImageComparison::Tolerated(diagnostics) => {
            diagnostics.write_beside(path_a)?;
            Ok(true)
        }
        ImageComparison::Different(diagnostics) => {
            info!(
                "Images differ: {} pixels survive erosion ({} vs {})",
                diagnostics.eroded_count,
                path_a.display(),
                path_b.display()
            );
            diagnostics.write_beside(path_a)?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn solid_rgb(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([value; 3])))
    }

    #[test]
    fn test_reflexivity() {
        let img = solid_rgb(16, 16, 120);
        assert!(matches!(compare(&img, &img), ImageComparison::Identical));
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = solid_rgb(16, 16, 0);
        let b = solid_rgb(16, 17, 0);
        let comparison = compare(&a, &b);
        assert!(matches!(comparison, ImageComparison::DimensionMismatch));
        assert!(!comparison.is_match());
    }

    #[test]
    fn test_mode_mismatch() {
        let a = solid_rgb(8, 8, 0);
        let b = DynamicImage::ImageLuma8(GrayImage::new(8, 8));
        assert!(matches!(compare(&a, &b), ImageComparison::ModeMismatch));
    }

    #[test]
    fn test_single_pixel_difference_is_tolerated() {
        let a = solid_rgb(16, 16, 0);
        let mut b = solid_rgb(16, 16, 0).to_rgb8();
        b.put_pixel(8, 8, image::Rgb([255, 255, 255]));
        let b = DynamicImage::ImageRgb8(b);

        let comparison = compare(&a, &b);
        assert!(comparison.is_match());
        match comparison {
            ImageComparison::Tolerated(diagnostics) => {
                assert_eq!(diagnostics.eroded_count, 0);
                assert_eq!(diagnostics.binary_mask.get_pixel(8, 8)[0], 255);
            }
            other => panic!("expected Tolerated, got {:?}", other),
        }
    }

    #[test]
    fn test_corner_pixel_difference_is_tolerated() {
        // Zero padding at the border: a corner pixel can never survive erosion.
        let a = solid_rgb(16, 16, 0);
        let mut b = a.to_rgb8();
        b.put_pixel(0, 0, image::Rgb([1, 0, 0]));
        let comparison = compare(&a, &DynamicImage::ImageRgb8(b));
        assert!(comparison.is_match());
    }

    #[test]
    fn test_two_by_two_block_is_tolerated() {
        // No pixel of a 2x2 block has all 8 neighbors set, so erosion removes it.
        let a = solid_rgb(16, 16, 0);
        let mut b = a.to_rgb8();
        for y in 4..6 {
            for x in 4..6 {
                b.put_pixel(x, y, image::Rgb([255, 255, 255]));
            }
        }
        assert!(compare(&a, &DynamicImage::ImageRgb8(b)).is_match());
    }

    #[test]
    fn test_three_by_three_block_is_a_mismatch() {
        // The center of a 3x3 block survives erosion.
        let a = solid_rgb(16, 16, 0);
        let mut b = a.to_rgb8();
        for y in 4..7 {
            for x in 4..7 {
                b.put_pixel(x, y, image::Rgb([255, 255, 255]));
            }
        }
        let comparison = compare(&a, &DynamicImage::ImageRgb8(b));
        assert!(!comparison.is_match());
        match comparison {
            ImageComparison::Different(diagnostics) => {
                assert_eq!(diagnostics.eroded_count, 1);
                assert_eq!(diagnostics.eroded_mask.get_pixel(5, 5)[0], 255);
            }
            other => panic!("expected Different, got {:?}", other),
        }
    }

    #[test]
    fn test_difference_in_single_channel_sets_mask() {
        let a = solid_rgb(8, 8, 10);
        let mut b = a.to_rgb8();
        // Only the green channel differs.
        b.put_pixel(3, 3, image::Rgb([10, 11, 10]));
        match compare(&a, &DynamicImage::ImageRgb8(b)) {
            ImageComparison::Tolerated(diagnostics) => {
                assert_eq!(diagnostics.binary_mask.get_pixel(3, 3)[0], 255);
                assert_eq!(diagnostics.binary_mask.get_pixel(3, 4)[0], 0);
            }
            other => panic!("expected Tolerated, got {:?}", other),
        }
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(&solid_rgb(4, 4, 0)));
        assert!(!is_blank(&solid_rgb(4, 4, 1)));

        let mut almost_blank = RgbImage::new(4, 4);
        almost_blank.put_pixel(2, 1, image::Rgb([0, 0, 1]));
        assert!(!is_blank(&DynamicImage::ImageRgb8(almost_blank)));
    }

    #[test]
    fn test_erode_full_mask_keeps_interior() {
        let mask = GrayImage::from_pixel(5, 5, Luma([255]));
        let eroded = erode(&mask);
        // Border erodes away against the implicit zero padding.
        assert_eq!(eroded.get_pixel(0, 0)[0], 0);
        assert_eq!(eroded.get_pixel(4, 2)[0], 0);
        // The 3x3 interior survives.
        for y in 1..4 {
            for x in 1..4 {
                assert_eq!(eroded.get_pixel(x, y)[0], 255);
            }
        }
    }

    #[test]
    fn test_images_match_writes_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let path_a = dir.path().join("a.png");
        let path_b = dir.path().join("b.png");

        let a = solid_rgb(16, 16, 0);
        let mut b = a.to_rgb8();
        b.put_pixel(8, 8, image::Rgb([255, 0, 0]));
        a.save(&path_a).unwrap();
        b.save(&path_b).unwrap();

        assert!(images_match(&path_a, &path_b).unwrap());
        assert!(dir.path().join("a.png.diff.png").exists());
        assert!(dir.path().join("a.png.binary_result.png").exists());
        assert!(dir.path().join("a.png.eroded_result_0.png").exists());
    }

    #[test]
    fn test_images_match_identical_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path_a = dir.path().join("a.png");
        let path_b = dir.path().join("b.png");
        solid_rgb(8, 8, 40).save(&path_a).unwrap();
        solid_rgb(8, 8, 40).save(&path_b).unwrap();

        assert!(images_match(&path_a, &path_b).unwrap());
        assert!(!dir.path().join("a.png.diff.png").exists());
    }
}
