//! Background matting: turning the flat generator background transparent.
//!
//! Two strategies are available:
//!
//! - **Flood fill** from the four corners, followed by a sweep for light pixels
//!   the fill could not reach (background trapped between limbs, etc).
//! - **Sampled colour**: the dominant colour of the four corner patches is taken
//!   as the background and every pixel close to it is cleared, wherever it is.
//!
//! Pixels that are already transparent are never looked at again, so matting an
//! already-matted frame is a no-op.

use std::str::FromStr;

use image::{Rgb, Rgba, RgbaImage};
use tracing::debug;

use crate::color::{
    is_background_color, is_white_or_light, BACKGROUND_TOLERANCE, LIGHT_THRESHOLD,
};

/// Maximum summed RGBA difference from the seed for the corner flood fill.
pub const FLOOD_THRESHOLD: u32 = 50;

/// Brightness threshold for the light fallback of sampled-colour matting.
///
/// Stricter than [`LIGHT_THRESHOLD`] since the sampled pass already clears the
/// background colour itself.
pub const SAMPLED_LIGHT_THRESHOLD: u8 = 200;

/// Side length of the square patch sampled at each corner.
pub const CORNER_SAMPLE_SIZE: u32 = 15;

/// Backgrounds whose channel sum is below this are treated as dark.
const DARK_BACKGROUND_SUM: u32 = 400;

/// Only corner pixels more opaque than this are sampled.
const SAMPLE_MIN_ALPHA: u8 = 128;

/// Quantization bucket width for background sampling.
const QUANT_STEP: u8 = 8;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// How the background colour is found and removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MattingStrategy {
    /// Flood fill from the corners, then sweep remaining light pixels.
    #[default]
    FloodFill,
    /// Sample the dominant corner colour and clear everything close to it.
    SampledColor,
}

impl FromStr for MattingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flood" | "flood-fill" => Ok(Self::FloodFill),
            "sampled" | "sampled-color" => Ok(Self::SampledColor),
            other => Err(format!(
                "unknown matting strategy {other:?} (expected flood or sampled)"
            )),
        }
    }
}

/// Knobs for [`remove_background`].
#[derive(Debug, Clone)]
pub struct MattingOptions {
    /// Which strategy to run.
    pub strategy: MattingStrategy,
    /// Brightness threshold for the flood fill's light-pixel sweep.
    pub light_threshold: u8,
    /// Brightness threshold for the sampled strategy's light fallback.
    pub sampled_light_threshold: u8,
    /// Flood fill similarity threshold (summed absolute RGBA difference).
    pub flood_threshold: u32,
    /// Euclidean RGB tolerance around the sampled background colour.
    pub color_tolerance: f32,
    /// Corner patch size for background sampling.
    pub sample_size: u32,
}

impl Default for MattingOptions {
    fn default() -> Self {
        Self {
            strategy: MattingStrategy::default(),
            light_threshold: LIGHT_THRESHOLD,
            sampled_light_threshold: SAMPLED_LIGHT_THRESHOLD,
            flood_threshold: FLOOD_THRESHOLD,
            color_tolerance: BACKGROUND_TOLERANCE,
            sample_size: CORNER_SAMPLE_SIZE,
        }
    }
}

/// Make the background of `frame` transparent.
///
/// Returns the matted frame and the number of pixels cleared.
#[must_use]
pub fn remove_background(frame: &RgbaImage, opts: &MattingOptions) -> (RgbaImage, usize) {
    let mut out = frame.clone();
    let cleared = match opts.strategy {
        MattingStrategy::FloodFill => matte_flood_fill(&mut out, opts),
        MattingStrategy::SampledColor => matte_sampled(&mut out, opts),
    };
    debug!(strategy = ?opts.strategy, cleared, "background removed");
    (out, cleared)
}

fn matte_flood_fill(img: &mut RgbaImage, opts: &MattingOptions) -> usize {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return 0;
    }

    let corners = [
        (0, 0),
        (width - 1, 0),
        (0, height - 1),
        (width - 1, height - 1),
    ];
    let mut cleared: usize = corners
        .iter()
        .map(|&seed| flood_clear(img, seed, opts.flood_threshold))
        .sum();

    // islands of background the fill could not reach
    for px in img.pixels_mut() {
        if px[3] > 0 && is_white_or_light(*px, opts.light_threshold) {
            *px = TRANSPARENT;
            cleared += 1;
        }
    }
    cleared
}

/// Clear the 4-connected region around `seed` that stays within `threshold` of the seed colour.
fn flood_clear(img: &mut RgbaImage, seed: (u32, u32), threshold: u32) -> usize {
    let reference = *img.get_pixel(seed.0, seed.1);
    if reference[3] == 0 {
        return 0;
    }

    let (width, height) = img.dimensions();
    let similar = |px: &Rgba<u8>| -> bool {
        let diff: u32 = (0..4)
            .map(|ch| u32::from(px[ch].abs_diff(reference[ch])))
            .sum();
        px[3] > 0 && diff <= threshold
    };

    let mut cleared = 0;
    let mut stack = vec![seed];
    img.put_pixel(seed.0, seed.1, TRANSPARENT);
    cleared += 1;

    while let Some((x, y)) = stack.pop() {
        let neighbors = [
            (x.checked_sub(1), Some(y)),
            ((x + 1 < width).then_some(x + 1), Some(y)),
            (Some(x), y.checked_sub(1)),
            (Some(x), (y + 1 < height).then_some(y + 1)),
        ];
        for (nx, ny) in neighbors {
            let (Some(nx), Some(ny)) = (nx, ny) else {
                continue;
            };
            if similar(img.get_pixel(nx, ny)) {
                img.put_pixel(nx, ny, TRANSPARENT);
                cleared += 1;
                stack.push((nx, ny));
            }
        }
    }
    cleared
}

fn matte_sampled(img: &mut RgbaImage, opts: &MattingOptions) -> usize {
    let background = sample_background_color(img, opts.sample_size);
    let channel_sum: u32 = background.0.iter().map(|&c| u32::from(c)).sum();
    let dark_background = channel_sum < DARK_BACKGROUND_SUM;
    debug!(?background, dark_background, "sampled background colour");

    let mut cleared = 0;
    for px in img.pixels_mut() {
        if px[3] == 0 {
            continue;
        }
        let is_background = is_background_color(*px, background, opts.color_tolerance)
            || (!dark_background && is_white_or_light(*px, opts.sampled_light_threshold));
        if is_background {
            *px = TRANSPARENT;
            cleared += 1;
        }
    }
    cleared
}

/// Estimate the background colour from square patches at the four corners.
///
/// Only pixels with alpha above 128 are counted. Colours are quantized down to
/// multiples of 8 and the most frequent bucket wins, ties going to the bucket
/// seen first. Falls back to white when no opaque pixel was sampled.
#[must_use]
pub fn sample_background_color(frame: &RgbaImage, sample_size: u32) -> Rgb<u8> {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return Rgb([255, 255, 255]);
    }

    let w = i64::from(width);
    let h = i64::from(height);
    let s = i64::from(sample_size);
    let corners = [(0, 0), (w - s, 0), (0, h - s), (w - s, h - s)];

    // insertion-ordered tally keeps tie-breaking deterministic
    let mut tally: Vec<([u8; 3], u32)> = Vec::new();
    for (cx, cy) in corners {
        for dx in 0..s {
            for dy in 0..s {
                #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                let (x, y) = (
                    (cx + dx).clamp(0, w - 1) as u32,
                    (cy + dy).clamp(0, h - 1) as u32,
                );
                let px = frame.get_pixel(x, y);
                if px[3] <= SAMPLE_MIN_ALPHA {
                    continue;
                }
                let key = [quantize(px[0]), quantize(px[1]), quantize(px[2])];
                match tally.iter_mut().find(|(color, _)| *color == key) {
                    Some((_, count)) => *count += 1,
                    None => tally.push((key, 1)),
                }
            }
        }
    }

    let mut best: Option<([u8; 3], u32)> = None;
    for &(color, count) in &tally {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((color, count));
        }
    }
    best.map_or(Rgb([255, 255, 255]), |(color, _)| Rgb(color))
}

fn quantize(c: u8) -> u8 {
    (c / QUANT_STEP) * QUANT_STEP
}
