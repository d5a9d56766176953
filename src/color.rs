//! Pixel-level colour predicates.
//!
//! Everything here is a pure function of one pixel (or one image, for
//! [`GuideMask`]). The thresholds are tuned for flat-colour generated art on a
//! single dominant background, with magenta (`#FF00FF`) frame markers.

use image::{Rgb, Rgba, RgbaImage};

use crate::error::{Error, Result};

/// Default per-channel tolerance for [`is_guide_color`].
///
/// Deliberately loose so anti-aliased marker edges still register.
pub const GUIDE_COLOR_TOLERANCE: u8 = 60;

/// Default brightness threshold for [`is_white_or_light`].
pub const LIGHT_THRESHOLD: u8 = 180;

/// Default Euclidean RGB tolerance for [`is_background_color`].
pub const BACKGROUND_TOLERANCE: f32 = 35.0;

/// Channel spread below which a pixel reads as neutral gray.
const NEUTRAL_SPREAD: u8 = 30;

/// Saturation below which a bright pixel counts as white/light.
const LIGHT_MAX_SATURATION: f32 = 0.15;

/// Checkerboard-gray detection: saturation ceiling and max-channel band.
const CHECKER_MAX_SATURATION: f32 = 0.10;
const CHECKER_MIN: u8 = 180;
const CHECKER_MAX: u8 = 230;
const CHECKER_SPREAD: u8 = 15;

/// Parse a `#RRGGBB` (or `RRGGBB`) hex string into a colour.
///
/// # Errors
///
/// Returns [`Error::InvalidColor`] if the string is not six hex digits.
pub fn parse_hex_color(hex: &str) -> Result<Rgb<u8>> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(Error::InvalidColor(hex.to_string()));
    }

    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| Error::InvalidColor(hex.to_string()))
    };

    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

/// True if the pixel is within `tolerance` (Euclidean RGB distance) of `reference`.
#[must_use]
pub fn is_background_color(px: Rgba<u8>, reference: Rgb<u8>, tolerance: f32) -> bool {
    let dist_sq: f32 = (0..3)
        .map(|ch| {
            let d = f32::from(px[ch]) - f32::from(reference[ch]);
            d * d
        })
        .sum();
    dist_sq.sqrt() < tolerance
}

/// True for low-saturation bright pixels and checkerboard-style mid grays.
///
/// A pixel is "light" when its saturation `(max - min) / max` is below 0.15 and
/// its brightest channel exceeds `threshold`. Transparency checkerboards baked
/// into generated images (grays around 180..230) are caught by a second,
/// stricter branch.
#[must_use]
pub fn is_white_or_light(px: Rgba<u8>, threshold: u8) -> bool {
    let [r, g, b, _] = px.0;
    let c_max = r.max(g).max(b);
    let c_min = r.min(g).min(b);

    let saturation = if c_max > 0 {
        f32::from(c_max - c_min) / f32::from(c_max)
    } else {
        0.0
    };

    let grey_white = saturation < LIGHT_MAX_SATURATION && c_max > threshold;
    let checkerboard = saturation < CHECKER_MAX_SATURATION
        && c_max > CHECKER_MIN
        && c_max < CHECKER_MAX
        && r.abs_diff(g) < CHECKER_SPREAD
        && g.abs_diff(b) < CHECKER_SPREAD;

    grey_white || checkerboard
}

/// True if every channel is within `tolerance` of the guide colour.
#[must_use]
pub fn is_guide_color(px: Rgba<u8>, guide: Rgb<u8>, tolerance: u8) -> bool {
    (0..3).all(|ch| px[ch].abs_diff(guide[ch]) < tolerance)
}

/// True if the pixel is darker than `gray_threshold` and looks neutral.
///
/// Brightness is the mean of R, G and B; neutral means every pair of channels
/// is within 30 of each other.
#[must_use]
pub fn is_dark_neutral(px: Rgba<u8>, gray_threshold: u8) -> bool {
    let [r, g, b, _] = px.0;
    let brightness = (u16::from(r) + u16::from(g) + u16::from(b)) / 3;
    let neutral = r.abs_diff(g) < NEUTRAL_SPREAD
        && g.abs_diff(b) < NEUTRAL_SPREAD
        && r.abs_diff(b) < NEUTRAL_SPREAD;
    brightness < u16::from(gray_threshold) && neutral
}

/// True if the pixel still carries a visible magenta tint.
///
/// Used by the inpainter to refuse marker-contaminated pixels as fill sources
/// even when they fell outside the [`GuideMask`] bands.
#[must_use]
pub fn is_magenta_tinted(px: Rgba<u8>) -> bool {
    let [r, g, b, _] = px.0;
    r > 150 && b > 150 && g < 100 && r.abs_diff(b) < 50
}

/// Classification bands for marker-coloured pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideBand {
    /// Solid marker colour.
    Pure,
    /// Anti-aliased blend of marker and artwork.
    Halo,
    /// Darkened marker remnants, still red/blue dominant.
    Dark,
}

impl GuideBand {
    /// Classify a pixel into one of the marker bands, if any.
    ///
    /// The bands are checked tightest first. Halo and dark remnants require red
    /// and blue to track each other and jointly dominate green, which keeps
    /// legitimate red or purple art out of the mask.
    #[must_use]
    pub fn classify(px: Rgba<u8>) -> Option<Self> {
        let r = f32::from(px[0]);
        let g = f32::from(px[1]);
        let b = f32::from(px[2]);

        if r > 200.0 && b > 200.0 && g < 50.0 {
            return Some(Self::Pure);
        }

        let halo = r > 150.0
            && b > 150.0
            && g < 120.0
            && (r - b).abs() < 40.0
            && (r + b) / 2.0 > g * 1.5;
        if halo {
            return Some(Self::Halo);
        }

        let dark = r > 80.0
            && b > 80.0
            && g < 60.0
            && (r - b).abs() < 30.0
            && r > g * 1.3
            && b > g * 1.3;
        if dark {
            return Some(Self::Dark);
        }

        None
    }
}

/// True if guide lines drawn in `colour` fall inside the [`GuideBand`]s, so
/// inpainting can find them.
#[must_use]
pub fn is_marker_color(colour: Rgb<u8>) -> bool {
    let [r, g, b] = colour.0;
    GuideBand::classify(Rgba([r, g, b, 255])).is_some()
}

/// True only for near-exact `#FF00FF`.
#[must_use]
pub fn is_pure_magenta(px: Rgba<u8>) -> bool {
    px[0] > 250 && px[2] > 250 && px[1] < 5
}

/// Whole-image marker classification, one flag per pixel.
///
/// With `strict` set only near-exact marker colour is flagged; otherwise the
/// pure, halo and dark bands of [`GuideBand`] are all included. Alpha is not
/// consulted; callers combine the mask with their own opacity checks.
#[derive(Debug, Clone)]
pub struct GuideMask {
    width: u32,
    height: u32,
    flags: Vec<bool>,
}

impl GuideMask {
    /// Build the mask for `image`.
    #[must_use]
    pub fn new(image: &RgbaImage, strict: bool) -> Self {
        let flags = image
            .pixels()
            .map(|&px| {
                if strict {
                    is_pure_magenta(px)
                } else {
                    GuideBand::classify(px).is_some()
                }
            })
            .collect();

        Self {
            width: image.width(),
            height: image.height(),
            flags,
        }
    }

    /// Whether the pixel at `(x, y)` is marker-coloured.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the mask.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        assert!(x < self.width && y < self.height, "mask index out of bounds");
        self.flags[(y * self.width + x) as usize]
    }

    /// Number of flagged pixels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    /// Mask dimensions as `(width, height)`.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(r: u8, g: u8, b: u8) -> Rgba<u8> {
        Rgba([r, g, b, 255])
    }

    #[test]
    fn only_magenta_family_counts_as_marker_colour() {
        assert!(is_marker_color(Rgb([255, 0, 255])));
        assert!(is_marker_color(Rgb([230, 40, 220])));
        assert!(!is_marker_color(Rgb([0, 255, 0])));
        assert!(!is_marker_color(Rgb([0, 255, 255])));
        assert!(!is_marker_color(Rgb([220, 30, 30])));
    }

    #[test]
    fn parse_hex_color_accepts_hash_and_bare_forms() {
        assert_eq!(parse_hex_color("#FF00FF").unwrap(), Rgb([255, 0, 255]));
        assert_eq!(parse_hex_color("00ff7f").unwrap(), Rgb([0, 255, 127]));
        assert_eq!(parse_hex_color("  #102030 ").unwrap(), Rgb([16, 32, 48]));
    }

    #[test]
    fn parse_hex_color_rejects_garbage() {
        assert!(matches!(parse_hex_color("#FF00F"), Err(Error::InvalidColor(_))));
        assert!(matches!(parse_hex_color("#GG00FF"), Err(Error::InvalidColor(_))));
        assert!(matches!(parse_hex_color(""), Err(Error::InvalidColor(_))));
        assert!(matches!(parse_hex_color("#FF00FFé"), Err(Error::InvalidColor(_))));
    }

    #[test]
    fn background_color_uses_euclidean_distance() {
        let reference = Rgb([100, 100, 100]);
        assert!(is_background_color(px(100, 100, 100), reference, 35.0));
        // distance sqrt(3 * 20^2) ~= 34.6
        assert!(is_background_color(px(120, 120, 120), reference, 35.0));
        // distance sqrt(3 * 21^2) ~= 36.4
        assert!(!is_background_color(px(121, 121, 121), reference, 35.0));
    }

    #[test]
    fn white_and_light_grays_are_light() {
        assert!(is_white_or_light(px(255, 255, 255), LIGHT_THRESHOLD));
        assert!(is_white_or_light(px(240, 238, 235), LIGHT_THRESHOLD));
        // checkerboard gray
        assert!(is_white_or_light(px(204, 204, 204), 240));
    }

    #[test]
    fn saturated_or_dark_pixels_are_not_light() {
        assert!(!is_white_or_light(px(255, 200, 0), LIGHT_THRESHOLD));
        assert!(!is_white_or_light(px(120, 120, 120), LIGHT_THRESHOLD));
        assert!(!is_white_or_light(px(0, 0, 0), LIGHT_THRESHOLD));
    }

    #[test]
    fn guide_color_tolerance_is_per_channel() {
        let guide = Rgb([255, 0, 255]);
        assert!(is_guide_color(px(255, 0, 255), guide, GUIDE_COLOR_TOLERANCE));
        assert!(is_guide_color(px(200, 59, 220), guide, GUIDE_COLOR_TOLERANCE));
        assert!(!is_guide_color(px(200, 60, 220), guide, GUIDE_COLOR_TOLERANCE));
        assert!(!is_guide_color(px(255, 255, 255), guide, GUIDE_COLOR_TOLERANCE));
    }

    #[test]
    fn dark_neutral_requires_both_dark_and_gray() {
        assert!(is_dark_neutral(px(20, 25, 30), 50));
        assert!(!is_dark_neutral(px(80, 80, 80), 50));
        // dark but clearly coloured
        assert!(!is_dark_neutral(px(60, 10, 0), 50));
        assert!(!is_dark_neutral(px(0, 0, 0), 0));
    }

    #[test]
    fn guide_bands_classify_marker_variants() {
        assert_eq!(GuideBand::classify(px(255, 0, 255)), Some(GuideBand::Pure));
        assert_eq!(GuideBand::classify(px(180, 90, 190)), Some(GuideBand::Halo));
        assert_eq!(GuideBand::classify(px(110, 40, 100)), Some(GuideBand::Dark));
    }

    #[test]
    fn guide_bands_leave_ordinary_art_alone() {
        // red, purple-ish blue, white, skin tone
        assert_eq!(GuideBand::classify(px(220, 30, 30)), None);
        assert_eq!(GuideBand::classify(px(90, 40, 200)), None);
        assert_eq!(GuideBand::classify(px(255, 255, 255)), None);
        assert_eq!(GuideBand::classify(px(230, 180, 150)), None);
    }

    #[test]
    fn strict_mask_only_flags_pure_marker() {
        let mut img = RgbaImage::new(3, 1);
        img.put_pixel(0, 0, px(255, 0, 255));
        img.put_pixel(1, 0, px(180, 90, 190));
        img.put_pixel(2, 0, px(10, 200, 10));

        let strict = GuideMask::new(&img, true);
        assert!(strict.get(0, 0));
        assert!(!strict.get(1, 0));
        assert_eq!(strict.count(), 1);

        let loose = GuideMask::new(&img, false);
        assert!(loose.get(0, 0));
        assert!(loose.get(1, 0));
        assert!(!loose.get(2, 0));
        assert_eq!(loose.count(), 2);
        assert_eq!(loose.dimensions(), (3, 1));
    }

    #[test]
    fn magenta_tint_check() {
        assert!(is_magenta_tinted(px(200, 50, 210)));
        assert!(!is_magenta_tinted(px(200, 50, 100)));
    }
}
