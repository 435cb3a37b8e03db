//! Property-based tests for the detection pipeline.

use image::{Rgb, RgbImage};
use proptest::prelude::*;
use red_watermark_removal::segmentation::is_red;
use red_watermark_removal::{DetectorConfig, WatermarkEngine};

const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
const RED: Rgb<u8> = Rgb([220, 20, 20]);

/// Strategy for RGB pixels outside every red band.
fn non_red_pixel() -> impl Strategy<Value = Rgb<u8>> {
    (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(r, g, b)| {
        let px = Rgb([r, g, b]);
        if is_red(px, &DetectorConfig::default()) {
            Rgb([g, g, g])
        } else {
            px
        }
    })
}

fn non_red_image() -> impl Strategy<Value = RgbImage> {
    (1u32..=24, 1u32..=24).prop_flat_map(|(w, h)| {
        prop::collection::vec(non_red_pixel(), (w * h) as usize).prop_map(move |pixels| {
            RgbImage::from_fn(w, h, |x, y| pixels[(y * w + x) as usize])
        })
    })
}

proptest! {
    #[test]
    fn images_without_red_are_untouched(img in non_red_image()) {
        let result = WatermarkEngine::new().remove(&img).unwrap();
        prop_assert!(!result.watermark_found);
        prop_assert_eq!(result.image, img);
    }

    #[test]
    fn red_squares_are_never_filled(side in 5u32..40, dx in 0u32..20, dy in 0u32..20) {
        let mut img = RgbImage::from_pixel(120, 120, GRAY);
        let (x0, y0) = (30 + dx, 20 + dy);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                img.put_pixel(x, y, RED);
            }
        }
        let result = WatermarkEngine::new().remove(&img).unwrap();
        prop_assert!(!result.watermark_found);
        prop_assert_eq!(result.image, img);
    }

    #[test]
    fn height_is_preserved_and_width_never_grows(
        rects in prop::collection::vec((0u32..80, 0u32..60, 1u32..40, 1u32..20), 0..4)
    ) {
        let mut img = RgbImage::from_pixel(80, 60, GRAY);
        for (x, y, w, h) in rects {
            for yy in y..(y + h).min(60) {
                for xx in x..(x + w).min(80) {
                    img.put_pixel(xx, yy, RED);
                }
            }
        }
        let result = WatermarkEngine::new().remove(&img).unwrap();
        prop_assert_eq!(result.image.height(), 60);
        prop_assert!(result.image.width() <= 80);
        prop_assert_eq!(result.watermark_found, result.crop.is_some() || result.bar_filled);
    }
}
