//! Cross-frame geometric standardization.
//!
//! Every frame of an animation is resized onto a square canvas of the same
//! size with one shared scale factor, so the subject does not grow or shrink
//! between frames. How the content is cropped before scaling is what the
//! strategies differ in:
//!
//! - [`ScaleMode::Canvas`] ignores content bounds and scales whole frames.
//! - [`AlignmentStrategy::Unified`] crops every frame to the union of all
//!   content boxes, preserving each frame's offset relative to the others
//!   (a torch flame flickers in place instead of jittering around).
//! - [`AlignmentStrategy::Independent`] crops each frame to its own content
//!   and centres it, but still shares the scale derived from the largest
//!   content box (walk cycles, where centring matters more than drift).
//!
//! The geometry is computed from all frames before any frame is written.

use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{Rgba, Rgba32FImage, RgbaImage};
use tracing::debug;

use crate::error::{Error, Result};

/// Fraction of the canvas the content may occupy in content mode.
///
/// Overridable per run through [`StandardizeOptions::margin`].
pub const CONTENT_MARGIN: f32 = 0.90;

/// Default per-frame canvas size.
pub const DEFAULT_TARGET_SIZE: u32 = 64;

/// Minimal half-open rectangle `[x1, x2) x [y1, y2)` around all pixels with alpha > 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// Left edge, inclusive.
    pub x1: u32,
    /// Top edge, inclusive.
    pub y1: u32,
    /// Right edge, exclusive.
    pub x2: u32,
    /// Bottom edge, exclusive.
    pub y2: u32,
}

impl BoundingBox {
    /// Content box of `image`, or `None` when it is fully transparent.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Option<Self> {
        let mut bbox: Option<Self> = None;
        for (x, y, px) in image.enumerate_pixels() {
            if px[3] == 0 {
                continue;
            }
            bbox = Some(match bbox {
                None => Self {
                    x1: x,
                    y1: y,
                    x2: x + 1,
                    y2: y + 1,
                },
                Some(b) => Self {
                    x1: b.x1.min(x),
                    y1: b.y1.min(y),
                    x2: b.x2.max(x + 1),
                    y2: b.y2.max(y + 1),
                },
            });
        }
        bbox
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Copy this rectangle out of `image`; parts outside the image stay transparent.
    fn crop(&self, image: &RgbaImage) -> RgbaImage {
        let mut out = RgbaImage::new(self.width(), self.height());
        imageops::replace(&mut out, image, -i64::from(self.x1), -i64::from(self.y1));
        out
    }
}

/// What gets scaled onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleMode {
    /// Crop to content, then fit the content to the canvas.
    #[default]
    Content,
    /// Fit the whole original frame to the canvas.
    Canvas,
}

impl FromStr for ScaleMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "content" => Ok(Self::Content),
            "canvas" => Ok(Self::Canvas),
            other => Err(format!(
                "unknown scale mode {other:?} (expected content or canvas)"
            )),
        }
    }
}

/// Vertical placement on the canvas. Horizontal placement is always centred.
///
/// Applies in canvas mode and to the unified strategy; independently
/// cropped frames are always centred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Vertically centred.
    #[default]
    Center,
    /// Resting on the bottom edge.
    Bottom,
    /// Hanging from the top edge.
    Top,
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "center" | "centre" => Ok(Self::Center),
            "bottom" => Ok(Self::Bottom),
            "top" => Ok(Self::Top),
            other => Err(format!(
                "unknown alignment {other:?} (expected center, bottom or top)"
            )),
        }
    }
}

/// How content boxes are combined across frames in content mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignmentStrategy {
    /// Each frame cropped to its own content and centred; shared scale.
    #[default]
    Independent,
    /// Every frame cropped to the union box; relative offsets preserved.
    Unified,
}

impl FromStr for AlignmentStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "independent" => Ok(Self::Independent),
            "unified" => Ok(Self::Unified),
            other => Err(format!(
                "unknown alignment strategy {other:?} (expected independent or unified)"
            )),
        }
    }
}

/// Options for [`standardize_frames`].
#[derive(Debug, Clone)]
pub struct StandardizeOptions {
    /// Canvas side length in pixels.
    pub target_size: u32,
    /// Content or whole-frame scaling.
    pub mode: ScaleMode,
    /// Vertical placement, ignored by [`AlignmentStrategy::Independent`].
    pub alignment: Alignment,
    /// Cross-frame strategy for content mode.
    pub strategy: AlignmentStrategy,
    /// Share of the canvas content may fill in content mode.
    pub margin: f32,
}

impl Default for StandardizeOptions {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            mode: ScaleMode::default(),
            alignment: Alignment::default(),
            strategy: AlignmentStrategy::default(),
            margin: CONTENT_MARGIN,
        }
    }
}

impl StandardizeOptions {
    /// Check the options describe a usable canvas.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTargetSize`] for a zero target size and
    /// [`Error::InvalidMargin`] for a margin outside `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if self.target_size == 0 {
            return Err(Error::InvalidTargetSize(self.target_size));
        }
        if !(self.margin > 0.0 && self.margin <= 1.0) {
            return Err(Error::InvalidMargin(self.margin));
        }
        Ok(())
    }
}

/// Batch-scope geometry shared by every frame of a set.
#[derive(Debug, Clone, PartialEq)]
pub enum UnifiedGeometry {
    /// Whole frames scaled by one factor.
    Canvas {
        /// Shared scale factor.
        scale: f64,
    },
    /// Every frame cropped to the same union box.
    Shared {
        /// Union of all content boxes.
        bbox: BoundingBox,
        /// Shared scale factor.
        scale: f64,
    },
    /// Every frame cropped to its own box.
    PerFrame {
        /// Content box per frame, `None` for empty frames.
        boxes: Vec<Option<BoundingBox>>,
        /// Shared scale factor, from the largest content extent.
        scale: f64,
    },
}

impl UnifiedGeometry {
    /// Compute the geometry for `frames`.
    ///
    /// Returns `None` when every frame is fully transparent (or there are no frames).
    #[must_use]
    pub fn compute(frames: &[RgbaImage], opts: &StandardizeOptions) -> Option<Self> {
        let boxes: Vec<Option<BoundingBox>> = frames.iter().map(BoundingBox::of).collect();
        let union = boxes.iter().flatten().copied().reduce(|a, b| a.union(&b))?;
        let target = f64::from(opts.target_size);
        let margin = f64::from(opts.margin);

        let geometry = match (opts.mode, opts.strategy) {
            (ScaleMode::Canvas, _) => {
                let first = frames.first()?;
                if first.width() == 0 || first.height() == 0 {
                    debug!(size = ?first.dimensions(), "first frame is empty, nothing to scale by");
                    return None;
                }
                Self::Canvas {
                    scale: fit_scale(target, first.width(), first.height()),
                }
            }
            (ScaleMode::Content, AlignmentStrategy::Unified) => {
                let scale = fit_scale(target, union.width(), union.height()) * margin;
                Self::Shared { bbox: union, scale }
            }
            (ScaleMode::Content, AlignmentStrategy::Independent) => {
                let (max_w, max_h) = boxes
                    .iter()
                    .flatten()
                    .fold((0, 0), |(w, h), b| (w.max(b.width()), h.max(b.height())));
                let scale = fit_scale(target, max_w, max_h) * margin;
                Self::PerFrame { boxes, scale }
            }
        };
        Some(geometry)
    }

    /// The shared scale factor.
    #[must_use]
    pub fn scale(&self) -> f64 {
        match self {
            Self::Canvas { scale } | Self::Shared { scale, .. } | Self::PerFrame { scale, .. } => {
                *scale
            }
        }
    }
}

fn fit_scale(target: f64, width: u32, height: u32) -> f64 {
    (target / f64::from(width)).min(target / f64::from(height))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled(len: u32, scale: f64) -> u32 {
    (f64::from(len) * scale) as u32
}

/// Resize every frame onto a `target_size` square canvas with shared geometry.
///
/// Output order matches input order. A frame without content (or whose
/// content scales to nothing) becomes a fully transparent canvas.
///
/// # Errors
///
/// Returns an error if `opts` fails [`StandardizeOptions::validate`].
pub fn standardize_frames(
    frames: &[RgbaImage],
    opts: &StandardizeOptions,
) -> Result<Vec<RgbaImage>> {
    opts.validate()?;
    let size = opts.target_size;

    let Some(geometry) = UnifiedGeometry::compute(frames, opts) else {
        debug!(frames = frames.len(), "no content in any frame");
        return Ok(frames.iter().map(|_| RgbaImage::new(size, size)).collect());
    };
    debug!(?geometry, "standardization geometry");

    // independent frames are always centred on both axes
    let alignment = match geometry {
        UnifiedGeometry::PerFrame { .. } => Alignment::Center,
        UnifiedGeometry::Canvas { .. } | UnifiedGeometry::Shared { .. } => opts.alignment,
    };

    let out = frames
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            let content = match &geometry {
                UnifiedGeometry::Canvas { .. } => BoundingBox::of(frame).map(|_| frame.clone()),
                UnifiedGeometry::Shared { bbox, .. } => {
                    BoundingBox::of(frame).map(|_| bbox.crop(frame))
                }
                UnifiedGeometry::PerFrame { boxes, .. } => boxes[i].map(|b| b.crop(frame)),
            };
            content.map_or_else(
                || RgbaImage::new(size, size),
                |c| place(&c, geometry.scale(), size, alignment),
            )
        })
        .collect();
    Ok(out)
}

/// Scale `content` by `scale` and paste it onto a transparent canvas.
///
/// Resampling runs on premultiplied colour so transparent pixels do not
/// bleed dark fringes into the edges.
fn place(content: &RgbaImage, scale: f64, size: u32, alignment: Alignment) -> RgbaImage {
    let mut canvas = RgbaImage::new(size, size);
    if !scale.is_finite() {
        return canvas;
    }
    let w = scaled(content.width(), scale);
    let h = scaled(content.height(), scale);
    if w == 0 || h == 0 {
        return canvas;
    }

    let resized = unpremultiply(&imageops::resize(
        &premultiply(content),
        w,
        h,
        FilterType::Lanczos3,
    ));
    let x = (i64::from(size) - i64::from(w)) / 2;
    let y = match alignment {
        Alignment::Center => (i64::from(size) - i64::from(h)) / 2,
        Alignment::Bottom => i64::from(size) - i64::from(h),
        Alignment::Top => 0,
    };
    imageops::replace(&mut canvas, &resized, x, y);
    canvas
}

/// The resampler clamps float channels to `[0, 1]`; storing at half scale
/// keeps Lanczos overshoot from being clipped unevenly across channels.
const PREMULTIPLIED_SCALE: f32 = 0.5;

fn premultiply(image: &RgbaImage) -> Rgba32FImage {
    Rgba32FImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0.map(|c| f32::from(c) / 255.0);
        let a = a * PREMULTIPLIED_SCALE;
        Rgba([r * a, g * a, b * a, a])
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unpremultiply(image: &Rgba32FImage) -> RgbaImage {
    let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = to_u8(a / PREMULTIPLIED_SCALE);
        if alpha == 0 {
            return Rgba([0, 0, 0, 0]);
        }
        Rgba([to_u8(r / a), to_u8(g / a), to_u8(b / a), alpha])
    })
}

/// Blocky pixel-art look: nearest-neighbour down by `factor`, then back up.
///
/// A factor of 1 returns the frame unchanged.
///
/// # Errors
///
/// Returns [`Error::InvalidPixelateFactor`] for a factor of zero.
pub fn pixelate(frame: &RgbaImage, factor: u32) -> Result<RgbaImage> {
    if factor == 0 {
        return Err(Error::InvalidPixelateFactor(factor));
    }
    if factor == 1 {
        return Ok(frame.clone());
    }

    let (w, h) = frame.dimensions();
    let small = imageops::resize(
        frame,
        (w / factor).max(1),
        (h / factor).max(1),
        FilterType::Nearest,
    );
    Ok(imageops::resize(&small, w, h, FilterType::Nearest))
}

/// Share of the frame area covered by its content box, in `[0, 1]`.
#[must_use]
pub fn content_coverage(frame: &RgbaImage) -> f32 {
    let area = u64::from(frame.width()) * u64::from(frame.height());
    match BoundingBox::of(frame) {
        #[allow(clippy::cast_precision_loss)]
        Some(b) if area > 0 => (u64::from(b.width()) * u64::from(b.height())) as f32 / area as f32,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const INK: Rgba<u8> = Rgba([200, 40, 40, 255]);

    fn with_rect(w: u32, h: u32, x0: u32, y0: u32, rw: u32, rh: u32) -> RgbaImage {
        let mut img = RgbaImage::new(w, h);
        for y in y0..y0 + rh {
            for x in x0..x0 + rw {
                img.put_pixel(x, y, INK);
            }
        }
        img
    }

    /// Box of clearly opaque pixels, ignoring faint resampling ripples.
    fn solid_box(img: &RgbaImage) -> Option<BoundingBox> {
        let mut solid = img.clone();
        for px in solid.pixels_mut() {
            if px[3] < 128 {
                px[3] = 0;
            }
        }
        BoundingBox::of(&solid)
    }

    #[test]
    fn bounding_box_is_half_open() {
        let img = with_rect(10, 10, 2, 3, 4, 5);
        let b = BoundingBox::of(&img).unwrap();
        assert_eq!(
            b,
            BoundingBox {
                x1: 2,
                y1: 3,
                x2: 6,
                y2: 8
            }
        );
        assert_eq!((b.width(), b.height()), (4, 5));
        assert!(BoundingBox::of(&RgbaImage::new(5, 5)).is_none());
    }

    #[test]
    fn independent_scale_comes_from_largest_content() {
        let frames = vec![with_rect(50, 50, 0, 0, 20, 10), with_rect(50, 50, 5, 5, 10, 40)];
        let opts = StandardizeOptions::default();
        let geometry = UnifiedGeometry::compute(&frames, &opts).unwrap();
        // max extents 20 x 40: min(64/20, 64/40) * 0.9
        assert!((geometry.scale() - 1.6 * 0.9).abs() < 1e-6);
    }

    #[test]
    fn independent_frames_are_centred_identically() {
        let frames = vec![
            with_rect(64, 64, 0, 0, 20, 20),
            with_rect(64, 64, 40, 10, 20, 20),
            with_rect(64, 64, 22, 44, 20, 20),
        ];
        let out = standardize_frames(&frames, &StandardizeOptions::default()).unwrap();

        assert_eq!(out.len(), 3);
        let first = solid_box(&out[0]).unwrap();
        for frame in &out {
            assert_eq!(frame.dimensions(), (64, 64));
            assert_eq!(solid_box(frame).unwrap(), first);
        }
        // 20 * (64 / 20 * 0.9) = 57.6 -> 57, centred at (64 - 57) / 2 = 3
        assert_eq!(first.x1, 3);
        assert_eq!(first.width(), 57);
    }

    #[test]
    fn unified_preserves_relative_offsets() {
        let (dx, dy) = (12, 6);
        let frames = vec![
            with_rect(80, 80, 10, 20, 16, 16),
            with_rect(80, 80, 10 + dx, 20 + dy, 16, 16),
        ];
        let opts = StandardizeOptions {
            strategy: AlignmentStrategy::Unified,
            ..StandardizeOptions::default()
        };
        let geometry = UnifiedGeometry::compute(&frames, &opts).unwrap();
        let scale = geometry.scale();
        let out = standardize_frames(&frames, &opts).unwrap();

        let a = solid_box(&out[0]).unwrap();
        let b = solid_box(&out[1]).unwrap();
        let shift_x = i64::from(b.x1) - i64::from(a.x1);
        let shift_y = i64::from(b.y1) - i64::from(a.y1);
        #[allow(clippy::cast_possible_truncation)]
        let (expect_x, expect_y) = (
            (f64::from(dx) * scale).round() as i64,
            (f64::from(dy) * scale).round() as i64,
        );
        assert!((shift_x - expect_x).abs() <= 1, "x shift {shift_x} vs {expect_x}");
        assert!((shift_y - expect_y).abs() <= 1, "y shift {shift_y} vs {expect_y}");
        assert!(shift_x > 0 && shift_y > 0);
    }

    #[test]
    fn unified_union_box_spans_all_frames() {
        let frames = vec![with_rect(40, 40, 2, 5, 4, 4), with_rect(40, 40, 30, 20, 6, 6)];
        let opts = StandardizeOptions {
            strategy: AlignmentStrategy::Unified,
            ..StandardizeOptions::default()
        };
        match UnifiedGeometry::compute(&frames, &opts).unwrap() {
            UnifiedGeometry::Shared { bbox, .. } => assert_eq!(
                bbox,
                BoundingBox {
                    x1: 2,
                    y1: 5,
                    x2: 36,
                    y2: 26
                }
            ),
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn bottom_and_top_alignment() {
        let frames = vec![with_rect(40, 40, 0, 0, 20, 10)];
        let bottom = StandardizeOptions {
            alignment: Alignment::Bottom,
            strategy: AlignmentStrategy::Unified,
            ..StandardizeOptions::default()
        };
        let out = standardize_frames(&frames, &bottom).unwrap();
        let b = solid_box(&out[0]).unwrap();
        assert_eq!(b.y2, 64);

        let top = StandardizeOptions {
            alignment: Alignment::Top,
            strategy: AlignmentStrategy::Unified,
            ..StandardizeOptions::default()
        };
        let out = standardize_frames(&frames, &top).unwrap();
        assert_eq!(solid_box(&out[0]).unwrap().y1, 0);
    }

    #[test]
    fn independent_frames_stay_centred_whatever_the_alignment() {
        let frames = vec![with_rect(40, 40, 5, 5, 20, 20), with_rect(40, 40, 5, 5, 20, 10)];
        for alignment in [Alignment::Bottom, Alignment::Top] {
            let opts = StandardizeOptions {
                alignment,
                ..StandardizeOptions::default()
            };
            let out = standardize_frames(&frames, &opts).unwrap();
            for (i, frame) in out.iter().enumerate() {
                let b = solid_box(frame).unwrap();
                let (top, bottom) = (b.y1, 64 - b.y2);
                assert!(
                    top.abs_diff(bottom) <= 2,
                    "{alignment:?} frame {i}: {top} above vs {bottom} below"
                );
            }
        }
    }

    #[test]
    fn soft_edges_keep_the_sprite_colour() {
        const ORANGE: [u8; 3] = [230, 120, 20];
        let mut disc = RgbaImage::new(40, 40);
        for (x, y, px) in disc.enumerate_pixels_mut() {
            let (dx, dy) = (f64::from(x) - 19.5, f64::from(y) - 19.5);
            if dx * dx + dy * dy <= 15.0 * 15.0 {
                *px = Rgba([ORANGE[0], ORANGE[1], ORANGE[2], 255]);
            }
        }

        let out = standardize_frames(&[disc], &StandardizeOptions::default()).unwrap();
        let soft: Vec<&Rgba<u8>> = out[0]
            .pixels()
            .filter(|p| p[3] > 0 && p[3] < 255)
            .collect();
        assert!(!soft.is_empty());
        for px in soft {
            for c in 0..3 {
                assert!(
                    px[c].abs_diff(ORANGE[c]) <= 3,
                    "edge pixel {px:?} lost the sprite colour"
                );
            }
        }
        assert_eq!(out[0].get_pixel(32, 32), &Rgba([230, 120, 20, 255]));
    }

    #[test]
    fn canvas_mode_with_empty_first_frame_is_transparent() {
        let frames = vec![RgbaImage::new(0, 30), with_rect(30, 30, 5, 5, 10, 10)];
        let opts = StandardizeOptions {
            mode: ScaleMode::Canvas,
            ..StandardizeOptions::default()
        };
        assert!(UnifiedGeometry::compute(&frames, &opts).is_none());

        let out = standardize_frames(&frames, &opts).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out
            .iter()
            .all(|f| f.dimensions() == (64, 64) && BoundingBox::of(f).is_none()));
    }

    #[test]
    fn canvas_mode_scales_whole_frame() {
        // 32x16 frame into 64: scale 2, content ignored for sizing
        let frames = vec![with_rect(32, 16, 0, 0, 4, 4)];
        let opts = StandardizeOptions {
            mode: ScaleMode::Canvas,
            ..StandardizeOptions::default()
        };
        let geometry = UnifiedGeometry::compute(&frames, &opts).unwrap();
        assert!((geometry.scale() - 2.0).abs() < 1e-9);

        let out = standardize_frames(&frames, &opts).unwrap();
        let b = solid_box(&out[0]).unwrap();
        // frame scaled to 64x32 centred vertically at y = 16; content in its top-left
        assert_eq!((b.x1, b.y1), (0, 16));
        assert_eq!((b.width(), b.height()), (8, 8));
    }

    #[test]
    fn empty_frames_become_transparent_canvases() {
        let frames = vec![RgbaImage::new(30, 30), with_rect(30, 30, 5, 5, 10, 10)];
        for strategy in [AlignmentStrategy::Independent, AlignmentStrategy::Unified] {
            let opts = StandardizeOptions {
                strategy,
                ..StandardizeOptions::default()
            };
            let out = standardize_frames(&frames, &opts).unwrap();
            assert!(out[0].pixels().all(|p| p[3] == 0));
            assert!(BoundingBox::of(&out[1]).is_some());
        }

        let all_empty = vec![RgbaImage::new(30, 30); 3];
        let out = standardize_frames(&all_empty, &StandardizeOptions::default()).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|f| f.dimensions() == (64, 64) && BoundingBox::of(f).is_none()));
    }

    #[test]
    fn invalid_options_fail_fast() {
        let frames = vec![with_rect(10, 10, 0, 0, 5, 5)];
        let zero = StandardizeOptions {
            target_size: 0,
            ..StandardizeOptions::default()
        };
        assert!(matches!(
            standardize_frames(&frames, &zero),
            Err(Error::InvalidTargetSize(0))
        ));

        let margin = StandardizeOptions {
            margin: 1.5,
            ..StandardizeOptions::default()
        };
        assert!(matches!(
            standardize_frames(&frames, &margin),
            Err(Error::InvalidMargin(_))
        ));
    }

    #[test]
    fn pixelate_makes_uniform_blocks() {
        let img = RgbaImage::from_fn(16, 16, |x, y| {
            Rgba([u8::try_from(x * 16).unwrap(), u8::try_from(y * 16).unwrap(), 0, 255])
        });
        let out = pixelate(&img, 4).unwrap();
        assert_eq!(out.dimensions(), (16, 16));
        for by in 0..4 {
            for bx in 0..4 {
                let reference = out.get_pixel(bx * 4, by * 4);
                for y in by * 4..by * 4 + 4 {
                    for x in bx * 4..bx * 4 + 4 {
                        assert_eq!(out.get_pixel(x, y), reference);
                    }
                }
            }
        }
        assert_eq!(pixelate(&img, 1).unwrap(), img);
        assert!(matches!(pixelate(&img, 0), Err(Error::InvalidPixelateFactor(0))));
    }

    #[test]
    fn coverage_reports_content_share() {
        let img = with_rect(10, 10, 0, 0, 5, 4);
        assert!((content_coverage(&img) - 0.2).abs() < 1e-6);
        assert!(content_coverage(&RgbaImage::new(4, 4)).abs() < f32::EPSILON);
    }

    #[test]
    fn mode_names_parse() {
        assert_eq!("canvas".parse::<ScaleMode>(), Ok(ScaleMode::Canvas));
        assert_eq!("BOTTOM".parse::<Alignment>(), Ok(Alignment::Bottom));
        assert_eq!(
            "unified".parse::<AlignmentStrategy>(),
            Ok(AlignmentStrategy::Unified)
        );
        assert!("sideways".parse::<Alignment>().is_err());
    }
}
