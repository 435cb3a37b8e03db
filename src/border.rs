//! Side-border detection and trimming.
//!
//! A border watermark runs nearly the full image height at the left and/or
//! right edge. The outer `border_width` columns decide whether to trim; a
//! per-column scan inward then finds where the red border ends.

use image::imageops::crop_imm;
use image::{GrayImage, RgbImage};

use crate::config::DetectorConfig;
use crate::segmentation::COLD;

/// Columns `left..=right` of the image to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRectangle {
    /// First retained column.
    pub left: u32,
    /// Last retained column, inclusive.
    pub right: u32,
}

impl CropRectangle {
    /// Number of retained columns.
    #[must_use]
    pub fn width(self) -> u32 {
        self.right - self.left + 1
    }
}

/// Hot-pixel ratios of the outer border columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderRatios {
    /// Ratio over the leftmost `border_width` columns.
    pub left: f64,
    /// Ratio over the rightmost `border_width` columns.
    pub right: f64,
}

fn hot_in_columns(mask: &GrayImage, columns: std::ops::Range<u32>) -> u64 {
    let mut count = 0u64;
    for y in 0..mask.height() {
        for x in columns.clone() {
            if mask.get_pixel(x, y)[0] != COLD {
                count += 1;
            }
        }
    }
    count
}

#[allow(clippy::cast_precision_loss)]
fn ratio(hot: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        hot as f64 / total as f64
    }
}

/// Hot-pixel ratios of the leftmost and rightmost `border_width` columns.
///
/// The denominator is always `height * border_width`, even when the image is
/// narrower than the border; a zero denominator yields zero ratios.
#[must_use]
pub fn border_ratios(mask: &GrayImage, border_width: u32) -> BorderRatios {
    let (w, h) = mask.dimensions();
    let span = border_width.min(w);
    let total = u64::from(h) * u64::from(border_width);
    BorderRatios {
        left: ratio(hot_in_columns(mask, 0..span), total),
        right: ratio(hot_in_columns(mask, w - span..w), total),
    }
}

/// Fraction of hot pixels in column `x`.
#[must_use]
pub fn column_ratio(mask: &GrayImage, x: u32) -> f64 {
    ratio(
        hot_in_columns(mask, x..x + 1),
        u64::from(mask.height()),
    )
}

/// Find the columns to keep when the mask shows a red side border.
///
/// Returns `None` when neither border ratio strictly exceeds the trigger
/// ratio, or when the inward scans find no column to cut at.
///
/// The left scan walks `0..width / divisor` and stops at the first column
/// whose ratio falls below the stop ratio. The right scan walks from
/// `width - 1` down to, but not including, `width - width / divisor`.
#[must_use]
pub fn detect_border_trim(mask: &GrayImage, cfg: &DetectorConfig) -> Option<CropRectangle> {
    let w = mask.width();
    let ratios = border_ratios(mask, cfg.border_width);
    log::debug!(
        "Border red ratios: left={:.4}, right={:.4}",
        ratios.left,
        ratios.right
    );

    let left_triggered = ratios.left > cfg.border_trigger_ratio;
    let right_triggered = ratios.right > cfg.border_trigger_ratio;
    if !left_triggered && !right_triggered {
        return None;
    }

    let scan = w / cfg.border_scan_divisor;
    let below_stop = |x: u32| column_ratio(mask, x) < cfg.border_stop_ratio;

    let left = if left_triggered {
        (0..scan).find(|&x| below_stop(x)).unwrap_or(0)
    } else {
        0
    };
    let right = if right_triggered {
        (w - scan + 1..w).rev().find(|&x| below_stop(x)).unwrap_or(w - 1)
    } else {
        w - 1
    };
    log::debug!("Red border edges: left={left}, right={right}");

    (left > 0 || right < w - 1).then_some(CropRectangle { left, right })
}

/// Slice columns `crop.left..=crop.right` out of `image`, keeping full height.
#[must_use]
pub fn crop_columns(image: &RgbImage, crop: CropRectangle) -> RgbImage {
    crop_imm(image, crop.left, 0, crop.width(), image.height()).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::HOT;
    use image::{Luma, Rgb};

    fn mask_with_columns(w: u32, h: u32, hot_columns: impl Fn(u32) -> bool) -> GrayImage {
        GrayImage::from_fn(w, h, |x, _| {
            if hot_columns(x) {
                Luma([HOT])
            } else {
                Luma([COLD])
            }
        })
    }

    #[test]
    fn clean_mask_is_not_trimmed() {
        let mask = GrayImage::new(200, 100);
        assert_eq!(detect_border_trim(&mask, &DetectorConfig::default()), None);
    }

    #[test]
    fn both_borders_are_trimmed() {
        let mask = mask_with_columns(200, 100, |x| !(16..184).contains(&x));
        let crop = detect_border_trim(&mask, &DetectorConfig::default()).unwrap();
        assert_eq!(crop, CropRectangle { left: 16, right: 183 });
        assert_eq!(crop.width(), 168);
        assert!(column_ratio(&mask, crop.left) < 0.1);
        assert!(column_ratio(&mask, crop.right) < 0.1);
    }

    #[test]
    fn only_the_triggered_side_is_scanned() {
        let mask = mask_with_columns(200, 100, |x| x < 12);
        let crop = detect_border_trim(&mask, &DetectorConfig::default()).unwrap();
        assert_eq!(crop, CropRectangle { left: 12, right: 199 });
    }

    #[test]
    fn trigger_ratio_is_strict() {
        // 3 of 10 border columns fully hot: exactly 0.30.
        let mask = mask_with_columns(200, 100, |x| x < 3);
        let ratios = border_ratios(&mask, 10);
        assert!((ratios.left - 0.3).abs() < 1e-12);
        assert_eq!(detect_border_trim(&mask, &DetectorConfig::default()), None);

        // 10 extra hot pixels in column 3: 0.31.
        let mut mask = mask;
        for y in 0..10 {
            mask.put_pixel(3, y, Luma([HOT]));
        }
        let ratios = border_ratios(&mask, 10);
        assert!((ratios.left - 0.31).abs() < 1e-12);
        let crop = detect_border_trim(&mask, &DetectorConfig::default()).unwrap();
        // Column 3 sits exactly on the stop ratio, so the cut lands one further in.
        assert_eq!(crop.left, 4);
    }

    #[test]
    fn border_beyond_scan_range_leaves_edge_untouched() {
        // Fully red image: no column in range drops below the stop ratio.
        let mask = mask_with_columns(80, 40, |_| true);
        assert_eq!(detect_border_trim(&mask, &DetectorConfig::default()), None);
    }

    #[test]
    fn right_scan_excludes_its_last_column() {
        // width 80, scan 10: right scan covers 79 down to 71 only.
        let mask = mask_with_columns(80, 40, |x| x >= 71);
        assert_eq!(detect_border_trim(&mask, &DetectorConfig::default()), None);

        let mask = mask_with_columns(80, 40, |x| x >= 72);
        let crop = detect_border_trim(&mask, &DetectorConfig::default()).unwrap();
        assert_eq!(crop.right, 71);
    }

    #[test]
    fn narrow_mask_uses_full_border_denominator() {
        let mask = mask_with_columns(4, 10, |_| true);
        let ratios = border_ratios(&mask, 10);
        assert!((ratios.left - 0.4).abs() < 1e-12);
        assert!((ratios.right - 0.4).abs() < 1e-12);
        // Scan range is empty at this width.
        assert_eq!(detect_border_trim(&mask, &DetectorConfig::default()), None);
    }

    #[test]
    fn zero_height_ratios_are_zero() {
        let mask = GrayImage::new(10, 0);
        let ratios = border_ratios(&mask, 10);
        assert!(ratios.left.abs() < f64::EPSILON);
        assert!(ratios.right.abs() < f64::EPSILON);
    }

    #[test]
    fn crop_keeps_inclusive_columns() {
        let img = RgbImage::from_fn(10, 3, |x, _| Rgb([u8::try_from(x).unwrap(), 0, 0]));
        let cropped = crop_columns(&img, CropRectangle { left: 2, right: 6 });
        assert_eq!(cropped.dimensions(), (5, 3));
        assert_eq!(cropped.get_pixel(0, 0)[0], 2);
        assert_eq!(cropped.get_pixel(4, 2)[0], 6);
    }
}
