//! Splitting a strip into frames, and a grid into strips.

use image::{imageops, RgbaImage};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::guides::GuideLines;

/// Guide lines closer than this fraction of the width to either edge are ignored.
const EDGE_MARGIN_FRACTION: f32 = 0.05;

/// Compute the column boundaries `[0, d1, .., d(n-1), width]` for `frame_count` frames.
///
/// Interior guide lines (those not within 5% of either edge) are used as
/// dividers when at least `frame_count - 1` of them exist; otherwise the width
/// is divided equally, rounding down, so the last frame may lose a few columns.
///
/// # Errors
///
/// Returns [`Error::InvalidFrameCount`] for zero frames and
/// [`Error::StripTooNarrow`] when the strip has fewer columns than frames.
pub fn frame_boundaries(width: u32, guides: &GuideLines, frame_count: u32) -> Result<Vec<u32>> {
    check_frame_count(width, frame_count)?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let margin = (width as f32 * EDGE_MARGIN_FRACTION) as u32;
    let interior: Vec<u32> = guides
        .positions()
        .iter()
        .copied()
        .filter(|&x| x > margin && x < width - margin)
        .collect();

    let needed = (frame_count - 1) as usize;
    if interior.len() >= needed {
        let mut bounds = Vec::with_capacity(needed + 2);
        bounds.push(0);
        bounds.extend_from_slice(&interior[..needed]);
        bounds.push(width);
        debug!(?bounds, "splitting on guide lines");
        return Ok(bounds);
    }

    if !guides.is_empty() {
        warn!(
            found = interior.len(),
            needed, "not enough interior guide lines, falling back to equal division"
        );
    }
    Ok(equal_boundaries(width, frame_count))
}

fn equal_boundaries(width: u32, frame_count: u32) -> Vec<u32> {
    let frame_width = width / frame_count;
    (0..=frame_count).map(|i| i * frame_width).collect()
}

fn check_frame_count(width: u32, frame_count: u32) -> Result<()> {
    if frame_count == 0 {
        return Err(Error::InvalidFrameCount(frame_count));
    }
    if width < frame_count {
        return Err(Error::StripTooNarrow {
            width,
            frames: frame_count,
        });
    }
    Ok(())
}

/// Split a strip into `frame_count` full-height frames, left to right.
///
/// See [`frame_boundaries`] for how guide lines are used. Never fails because
/// of missing guides; the equal-division fallback always applies.
///
/// # Errors
///
/// Returns an error only for an invalid frame count (see [`frame_boundaries`]).
pub fn split_strip(
    strip: &RgbaImage,
    guides: &GuideLines,
    frame_count: u32,
) -> Result<Vec<RgbaImage>> {
    let bounds = frame_boundaries(strip.width(), guides, frame_count)?;
    Ok(crop_columns(strip, &bounds))
}

/// Split a strip into `frame_count` equal-width frames, ignoring guides.
///
/// # Errors
///
/// Returns an error only for an invalid frame count (see [`frame_boundaries`]).
pub fn split_equal(strip: &RgbaImage, frame_count: u32) -> Result<Vec<RgbaImage>> {
    check_frame_count(strip.width(), frame_count)?;
    Ok(crop_columns(strip, &equal_boundaries(strip.width(), frame_count)))
}

fn crop_columns(strip: &RgbaImage, bounds: &[u32]) -> Vec<RgbaImage> {
    let height = strip.height();
    bounds
        .windows(2)
        .map(|w| imageops::crop_imm(strip, w[0], 0, w[1] - w[0], height).to_image())
        .collect()
}

/// Split a grid of stacked strips into `rows` equal-height strips, top to bottom.
///
/// Row height rounds down; leftover rows of pixels at the bottom are dropped.
///
/// # Errors
///
/// Returns [`Error::InvalidRowCount`] for zero rows or more rows than pixels.
pub fn split_rows(image: &RgbaImage, rows: u32) -> Result<Vec<RgbaImage>> {
    let (width, height) = image.dimensions();
    if rows == 0 || rows > height {
        return Err(Error::InvalidRowCount { rows, height });
    }

    let row_height = height / rows;
    Ok((0..rows)
        .map(|i| imageops::crop_imm(image, 0, i * row_height, width, row_height).to_image())
        .collect())
}
