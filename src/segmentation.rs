//! Red-pixel segmentation in HSV space.
//!
//! Hue is reported on the 0-180 scale with saturation and value on 0-255,
//! the layout 8-bit HSV images conventionally use. Red straddles the hue
//! wraparound, so it is matched with two bands (see [`DetectorConfig`]).

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::map::map_colors;

use crate::config::DetectorConfig;

/// Mask value for pixels classified as watermark red.
pub const HOT: u8 = 255;
/// Mask value for every other pixel.
pub const COLD: u8 = 0;

/// An 8-bit HSV triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    /// Hue in `0..180`.
    pub h: u8,
    /// Saturation in `0..=255`.
    pub s: u8,
    /// Value in `0..=255`.
    pub v: u8,
}

/// Fractional bits of the fixed-point divisors.
const HSV_SHIFT: u32 = 12;
const HSV_HALF: i32 = 1 << (HSV_SHIFT - 1);

/// `round((255 << 12) / v)`, or 0 for `v == 0`.
fn saturation_divisor(v: i32) -> i32 {
    if v == 0 {
        0
    } else {
        ((255 << HSV_SHIFT) * 2 + v) / (2 * v)
    }
}

/// `round((180 << 12) / (6 * diff))`, or 0 for `diff == 0`.
fn hue_divisor(diff: i32) -> i32 {
    if diff == 0 {
        0
    } else {
        ((180 << HSV_SHIFT) * 2 + 6 * diff) / (12 * diff)
    }
}

/// Convert one RGB pixel to 8-bit HSV.
///
/// Saturation and hue are scaled with rounded 12-bit fixed-point divisors,
/// then rounded by shifting. Negative hues wrap by 180.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rgb_to_hsv(px: Rgb<u8>) -> Hsv {
    let [r, g, b] = px.0.map(i32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = (diff * saturation_divisor(v) + HSV_HALF) >> HSV_SHIFT;

    let sector = if v == r {
        g - b
    } else if v == g {
        b - r + 2 * diff
    } else {
        r - g + 4 * diff
    };
    let h = (sector * hue_divisor(diff) + HSV_HALF) >> HSV_SHIFT;
    let h = if h < 0 { h + 180 } else { h };

    Hsv {
        h: h as u8,
        s: s as u8,
        v: v as u8,
    }
}

/// Whether a pixel falls inside any configured red band.
#[must_use]
pub fn is_red(px: Rgb<u8>, cfg: &DetectorConfig) -> bool {
    let hsv = rgb_to_hsv(px);
    hsv.s >= cfg.min_saturation
        && hsv.v >= cfg.min_value
        && cfg.hue_bands.iter().any(|band| band.contains(hsv.h))
}

/// Classify every pixel of `image`, producing a mask of the same size.
#[must_use]
pub fn segment_red(image: &RgbImage, cfg: &DetectorConfig) -> GrayImage {
    map_colors(image, |px| {
        Luma([if is_red(px, cfg) { HOT } else { COLD }])
    })
}

/// Number of hot pixels in a mask.
#[must_use]
pub fn count_hot(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] != COLD).count()
}
