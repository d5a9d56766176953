//! Guide-line removal by horizontal inpainting.
//!
//! Marker lines are vertical, so the closest undamaged context for any marker
//! pixel lies on the same row. Each marker pixel is replaced by:
//!
//! - the average of the nearest clean pixels to its left and right, when both exist;
//! - the one clean neighbour, when only one side has content;
//! - transparency, when neither side does (the line ran through empty space).
//!
//! A scan stops at the first fully transparent pixel, so a marker sitting at the
//! edge of the art is never coloured from content on the far side of a gap.
//! Wide lines need several passes: pixels filled in one pass are valid
//! neighbours in the next.

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::color::{is_magenta_tinted, GuideMask};

/// Default pass limit for [`inpaint_guide_lines`].
pub const MAX_INPAINT_PASSES: u32 = 10;

/// What an inpainting run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InpaintReport {
    /// Marker pixels replaced with neighbour colour.
    pub filled: usize,
    /// Marker pixels made transparent.
    pub cleared: usize,
    /// Passes that changed at least one pixel.
    pub passes: u32,
}

impl InpaintReport {
    /// Total pixels touched.
    #[must_use]
    pub fn total(&self) -> usize {
        self.filled + self.cleared
    }
}

/// Replace marker-coloured pixels in `frame` with inferred colour or transparency.
///
/// Runs until a pass changes nothing or `max_passes` is reached; hitting the
/// limit is not an error, the frame simply keeps whatever marker remains.
/// A frame without marker pixels is returned unchanged.
#[must_use]
pub fn inpaint_guide_lines(frame: &RgbaImage, max_passes: u32) -> (RgbaImage, InpaintReport) {
    let mut current = frame.clone();
    let mut report = InpaintReport::default();

    for _ in 0..max_passes {
        let (next, filled, cleared) = inpaint_pass(&current);
        if filled + cleared == 0 {
            break;
        }
        report.filled += filled;
        report.cleared += cleared;
        report.passes += 1;
        current = next;
    }

    if report.total() > 0 {
        debug!(
            filled = report.filled,
            cleared = report.cleared,
            passes = report.passes,
            "inpainted guide lines"
        );
    }
    (current, report)
}

/// One pass over a committed snapshot; writes go to a fresh copy.
fn inpaint_pass(snapshot: &RgbaImage) -> (RgbaImage, usize, usize) {
    let (width, height) = snapshot.dimensions();
    let mask = GuideMask::new(snapshot, false);
    let mut out = snapshot.clone();
    let mut filled = 0;
    let mut cleared = 0;

    let is_source = |x: u32, y: u32| -> bool {
        !mask.get(x, y) && !is_magenta_tinted(*snapshot.get_pixel(x, y))
    };

    for y in 0..height {
        for x in 0..width {
            if !mask.get(x, y) || snapshot.get_pixel(x, y)[3] == 0 {
                continue;
            }

            let left = scan(snapshot, (0..x).rev(), y, &is_source);
            let right = scan(snapshot, x + 1..width, y, &is_source);

            let replacement = match (left, right) {
                (Some(l), Some(r)) => Some(average(l, r)),
                (Some(c), None) | (None, Some(c)) => Some(c),
                (None, None) => None,
            };

            match replacement {
                Some(Rgba([r, g, b, _])) => {
                    out.put_pixel(x, y, Rgba([r, g, b, 255]));
                    filled += 1;
                }
                None => {
                    out.get_pixel_mut(x, y)[3] = 0;
                    cleared += 1;
                }
            }
        }
    }

    (out, filled, cleared)
}

/// Walk `xs` along row `y`, returning the first usable source pixel.
///
/// Gives up at the first fully transparent pixel.
fn scan(
    img: &RgbaImage,
    xs: impl Iterator<Item = u32>,
    y: u32,
    is_source: &impl Fn(u32, u32) -> bool,
) -> Option<Rgba<u8>> {
    for x in xs {
        let px = *img.get_pixel(x, y);
        if px[3] == 0 {
            return None;
        }
        if is_source(x, y) {
            return Some(px);
        }
    }
    None
}

fn average(a: Rgba<u8>, b: Rgba<u8>) -> Rgba<u8> {
    let mean = |ch: usize| {
        let sum = u16::from(a[ch]) + u16::from(b[ch]);
        // sum / 2 <= 255
        u8::try_from(sum / 2).unwrap_or(u8::MAX)
    };
    Rgba([mean(0), mean(1), mean(2), 255])
}
