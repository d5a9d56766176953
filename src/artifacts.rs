//! Final artifact cleanup after matting and inpainting.
//!
//! Three ordered passes:
//!
//! 1. **Edge strips**: the top and bottom `edge_strip` rows are cleared.
//! 2. **Low alpha**: nearly invisible pixels (alpha below `alpha_threshold`)
//!    become fully transparent; they otherwise render as a faint dark fringe.
//! 3. **Dark-edge erosion**: dark, neutral pixels touching transparency are
//!    peeled off one layer per pass, for at most `max_erosion_passes` passes.
//!    Interior dark art has no transparent neighbour and is left alone.

use image::RgbaImage;
use tracing::debug;

use crate::color::is_dark_neutral;

/// Default alpha below which a pixel is cleared.
pub const ALPHA_THRESHOLD: u8 = 10;

/// Default brightness below which a neutral pixel is an erosion candidate.
pub const GRAY_THRESHOLD: u8 = 50;

/// Default erosion pass limit.
pub const MAX_EROSION_PASSES: u32 = 3;

/// Knobs for [`clean_artifacts`].
#[derive(Debug, Clone)]
pub struct ArtifactOptions {
    /// Pixels with alpha below this are cleared.
    pub alpha_threshold: u8,
    /// Brightness threshold for dark-edge erosion; 0 disables erosion.
    pub gray_threshold: u8,
    /// Rows cleared at the top and bottom; 0 disables.
    pub edge_strip: u32,
    /// Upper bound on erosion passes.
    pub max_erosion_passes: u32,
}

impl Default for ArtifactOptions {
    fn default() -> Self {
        Self {
            alpha_threshold: ALPHA_THRESHOLD,
            gray_threshold: GRAY_THRESHOLD,
            edge_strip: 0,
            max_erosion_passes: MAX_EROSION_PASSES,
        }
    }
}

/// Pixel counts cleared by each pass of [`clean_artifacts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactReport {
    /// Cleared by the edge-strip pass.
    pub edge: usize,
    /// Cleared by the low-alpha pass.
    pub low_alpha: usize,
    /// Cleared by dark-edge erosion.
    pub eroded: usize,
}

/// Run the three cleanup passes over `frame`.
#[must_use]
pub fn clean_artifacts(frame: &RgbaImage, opts: &ArtifactOptions) -> (RgbaImage, ArtifactReport) {
    let mut out = frame.clone();
    let mut report = ArtifactReport {
        edge: clear_edge_strips(&mut out, opts.edge_strip),
        ..ArtifactReport::default()
    };

    for px in out.pixels_mut() {
        if px[3] > 0 && px[3] < opts.alpha_threshold {
            px[3] = 0;
            report.low_alpha += 1;
        }
    }

    for _ in 0..opts.max_erosion_passes {
        let (next, eroded) = erode_dark_edges(&out, opts.gray_threshold);
        if eroded == 0 {
            break;
        }
        report.eroded += eroded;
        out = next;
    }

    debug!(
        edge = report.edge,
        low_alpha = report.low_alpha,
        eroded = report.eroded,
        "cleaned artifacts"
    );
    (out, report)
}

fn clear_edge_strips(img: &mut RgbaImage, strip: u32) -> usize {
    let (width, height) = img.dimensions();
    let strip = strip.min(height);
    let mut cleared = 0;

    for y in (0..strip).chain(height - strip..height) {
        for x in 0..width {
            let px = img.get_pixel_mut(x, y);
            if px[3] > 0 {
                px[3] = 0;
                cleared += 1;
            }
        }
    }
    cleared
}

/// One erosion pass, reading only the state committed by the previous pass.
fn erode_dark_edges(snapshot: &RgbaImage, gray_threshold: u8) -> (RgbaImage, usize) {
    let (width, height) = snapshot.dimensions();
    let mut out = snapshot.clone();
    let mut eroded = 0;

    for y in 0..height {
        for x in 0..width {
            let px = *snapshot.get_pixel(x, y);
            if px[3] == 0 || !is_dark_neutral(px, gray_threshold) {
                continue;
            }
            if touches_transparency(snapshot, x, y) {
                out.get_pixel_mut(x, y)[3] = 0;
                eroded += 1;
            }
        }
    }
    (out, eroded)
}

/// True if any in-bounds 8-neighbour of `(x, y)` is fully transparent.
fn touches_transparency(img: &RgbaImage, x: u32, y: u32) -> bool {
    let (width, height) = img.dimensions();
    for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
        for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
            if (nx, ny) != (x, y) && img.get_pixel(nx, ny)[3] == 0 {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const DARK: Rgba<u8> = Rgba([20, 20, 25, 255]);
    const ORANGE: Rgba<u8> = Rgba([230, 120, 20, 255]);

    fn block(size: u32, x0: u32, y0: u32, side: u32, px: Rgba<u8>) -> RgbaImage {
        let mut img = RgbaImage::new(size, size);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                img.put_pixel(x, y, px);
            }
        }
        img
    }

    fn opaque(img: &RgbaImage) -> usize {
        img.pixels().filter(|p| p[3] > 0).count()
    }

    #[test]
    fn edge_strips_clear_top_and_bottom_rows() {
        let img = RgbaImage::from_pixel(6, 10, ORANGE);
        let opts = ArtifactOptions {
            edge_strip: 2,
            ..ArtifactOptions::default()
        };
        let (out, report) = clean_artifacts(&img, &opts);

        assert_eq!(report.edge, 6 * 4);
        for x in 0..6 {
            assert_eq!(out.get_pixel(x, 1)[3], 0);
            assert_eq!(out.get_pixel(x, 2)[3], 255);
            assert_eq!(out.get_pixel(x, 7)[3], 255);
            assert_eq!(out.get_pixel(x, 8)[3], 0);
        }
    }

    #[test]
    fn oversized_edge_strip_clears_everything_once() {
        let img = RgbaImage::from_pixel(4, 3, ORANGE);
        let opts = ArtifactOptions {
            edge_strip: 10,
            ..ArtifactOptions::default()
        };
        let (out, report) = clean_artifacts(&img, &opts);
        assert_eq!(report.edge, 12);
        assert_eq!(opaque(&out), 0);
    }

    #[test]
    fn faint_pixels_are_cleared() {
        let mut img = block(10, 2, 2, 6, ORANGE);
        img.put_pixel(0, 0, Rgba([230, 120, 20, 9]));
        img.put_pixel(9, 9, Rgba([230, 120, 20, 10]));

        let (out, report) = clean_artifacts(&img, &ArtifactOptions::default());
        assert_eq!(report.low_alpha, 1);
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(9, 9)[3], 10);
    }

    #[test]
    fn dark_fringe_is_peeled_one_layer_per_pass() {
        // orange core wrapped in a two-pixel dark outline
        let mut img = block(20, 4, 4, 12, DARK);
        for y in 6..14 {
            for x in 6..14 {
                img.put_pixel(x, y, ORANGE);
            }
        }

        let (out, report) = clean_artifacts(&img, &ArtifactOptions::default());
        assert_eq!(report.eroded, 12 * 12 - 8 * 8);
        assert_eq!(opaque(&out), 64);
        assert_eq!(out.get_pixel(6, 6), &ORANGE);
    }

    #[test]
    fn erosion_stops_at_pass_limit() {
        // 10x10 dark square: three passes remove rings of 36, 28 and 20 pixels
        let img = block(14, 2, 2, 10, DARK);
        let (out, report) = clean_artifacts(&img, &ArtifactOptions::default());
        assert_eq!(report.eroded, 36 + 28 + 20);
        assert_eq!(opaque(&out), 16);

        let once = ArtifactOptions {
            max_erosion_passes: 1,
            ..ArtifactOptions::default()
        };
        let (_, report) = clean_artifacts(&img, &once);
        assert_eq!(report.eroded, 36);
    }

    #[test]
    fn frame_filling_dark_art_is_not_eroded() {
        // no transparent neighbour anywhere
        let img = RgbaImage::from_pixel(8, 8, DARK);
        let (out, report) = clean_artifacts(&img, &ArtifactOptions::default());
        assert_eq!(report.eroded, 0);
        assert_eq!(out, img);
    }

    #[test]
    fn coloured_or_bright_edges_survive() {
        let img = block(12, 2, 2, 8, ORANGE);
        let (out, report) = clean_artifacts(&img, &ArtifactOptions::default());
        assert_eq!(report, ArtifactReport::default());
        assert_eq!(out, img);
    }

    #[test]
    fn zero_gray_threshold_disables_erosion() {
        let img = block(12, 2, 2, 8, DARK);
        let opts = ArtifactOptions {
            gray_threshold: 0,
            ..ArtifactOptions::default()
        };
        let (out, _) = clean_artifacts(&img, &opts);
        assert_eq!(out, img);
    }
}
