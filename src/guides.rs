//! Vertical guide-line detection.
//!
//! Generators are asked to draw a full-height marker line between frames.
//! A column counts as marker when more than half of its rows match the guide
//! colour, which tolerates art overlapping the line. Adjacent marker columns
//! are then merged into one line each.

use image::{Rgb, RgbaImage};
use tracing::debug;

use crate::color::is_guide_color;

/// Columns within this distance of the previous marker column join its cluster.
const CLUSTER_DISTANCE: u32 = 3;

/// A column is a dark grid line when more than this share of its opaque pixels are dark.
const GRID_DARK_RATIO: f32 = 0.8;

/// Channel value below which a pixel counts as dark for grid-line clearing.
const GRID_DARK_LEVEL: u8 = 50;

/// Ordered x-coordinates of detected vertical guide lines.
///
/// Positions are strictly increasing and more than three pixels apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuideLines(Vec<u32>);

impl GuideLines {
    /// Build from already clustered positions.
    ///
    /// Positions are sorted and deduplicated.
    #[must_use]
    pub fn from_positions(mut positions: Vec<u32>) -> Self {
        positions.sort_unstable();
        positions.dedup();
        Self(positions)
    }

    /// Line centres, ascending.
    #[must_use]
    pub fn positions(&self) -> &[u32] {
        &self.0
    }

    /// Number of detected lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no line was detected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Find full-height vertical lines drawn in `guide` colour.
///
/// `tolerance` is the per-channel tolerance passed to
/// [`is_guide_color`](crate::color::is_guide_color).
#[must_use]
pub fn detect_guide_lines(image: &RgbaImage, guide: Rgb<u8>, tolerance: u8) -> GuideLines {
    let (width, height) = image.dimensions();

    let columns: Vec<u32> = (0..width)
        .filter(|&x| {
            let hits = (0..height)
                .filter(|&y| is_guide_color(*image.get_pixel(x, y), guide, tolerance))
                .count();
            hits * 2 > height as usize
        })
        .collect();

    let lines = GuideLines(cluster_columns(&columns));
    debug!(columns = columns.len(), lines = ?lines.positions(), "guide line scan");
    lines
}

/// Merge ascending column indices into clusters and return each cluster's rounded mean.
fn cluster_columns(columns: &[u32]) -> Vec<u32> {
    let mut centres = Vec::new();
    let Some((&first, rest)) = columns.split_first() else {
        return centres;
    };

    let mut cluster = vec![first];
    for &x in rest {
        // cluster is never empty here
        let last = cluster[cluster.len() - 1];
        if x - last <= CLUSTER_DISTANCE {
            cluster.push(x);
        } else {
            centres.push(rounded_mean(&cluster));
            cluster.clear();
            cluster.push(x);
        }
    }
    centres.push(rounded_mean(&cluster));
    centres
}

#[allow(clippy::cast_possible_truncation)]
fn rounded_mean(values: &[u32]) -> u32 {
    let n = values.len() as u64;
    let sum: u64 = values.iter().map(|&v| u64::from(v)).sum();
    ((sum + n / 2) / n) as u32
}

/// Erase dark separator columns some generators draw instead of coloured guides.
///
/// A column is cleared (made fully transparent) when more than half of its rows
/// are opaque and more than 80% of those opaque pixels have every channel below
/// 50. Returns the cleaned strip and the number of cleared columns.
#[must_use]
pub fn clear_dark_grid_lines(strip: &RgbaImage) -> (RgbaImage, u32) {
    let (width, height) = strip.dimensions();
    let mut out = strip.clone();
    let mut cleared = 0u32;

    for x in 0..width {
        let mut opaque = 0u32;
        let mut dark = 0u32;
        for y in 0..height {
            let px = strip.get_pixel(x, y);
            if px[3] == 0 {
                continue;
            }
            opaque += 1;
            if px[0] < GRID_DARK_LEVEL && px[1] < GRID_DARK_LEVEL && px[2] < GRID_DARK_LEVEL {
                dark += 1;
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let is_grid = opaque * 2 > height && dark as f32 > opaque as f32 * GRID_DARK_RATIO;
        if is_grid {
            for y in 0..height {
                out.put_pixel(x, y, image::Rgba([0, 0, 0, 0]));
            }
            cleared += 1;
        }
    }

    if cleared > 0 {
        debug!(cleared, "cleared dark grid columns");
    }
    (out, cleared)
}
