//! Horizontal bar detection and fill.
//!
//! A bar watermark is a thin band of red text spanning most of the image
//! width. Among the largest contours, the first one whose bounding box is
//! long, wide and short enough is painted over with the fill colour.

use image::RgbImage;

use crate::config::DetectorConfig;
use crate::contours::Contour;
use crate::segmentation::COLD;

/// Whether `contour` is shaped like a bar on a `width` x `height` image.
///
/// All three comparisons are strict.
#[must_use]
pub fn is_bar_shaped(contour: &Contour, width: u32, height: u32, cfg: &DetectorConfig) -> bool {
    let rect = contour.bounding_rect();
    contour.aspect_ratio() > cfg.bar_min_aspect_ratio
        && f64::from(rect.width()) > f64::from(width) * cfg.bar_min_width_fraction
        && f64::from(rect.height()) < f64::from(height) * cfg.bar_max_height_fraction
}

/// Index of the first bar-shaped contour among the leading candidates.
///
/// `contours` is expected largest first; only the first
/// `max_bar_candidates` are looked at.
#[must_use]
pub fn find_bar(
    contours: &[Contour],
    width: u32,
    height: u32,
    cfg: &DetectorConfig,
) -> Option<usize> {
    for (i, contour) in contours.iter().take(cfg.max_bar_candidates).enumerate() {
        let rect = contour.bounding_rect();
        if is_bar_shaped(contour, width, height, cfg) {
            log::info!(
                "Contour {} is a horizontal bar: x={}, y={}, w={}, h={}, aspect_ratio={:.2}",
                i + 1,
                rect.left(),
                rect.top(),
                rect.width(),
                rect.height(),
                contour.aspect_ratio()
            );
            return Some(i);
        }
        log::debug!(
            "Contour {} is not a horizontal bar: x={}, y={}, w={}, h={}, aspect_ratio={:.2}",
            i + 1,
            rect.left(),
            rect.top(),
            rect.width(),
            rect.height(),
            contour.aspect_ratio()
        );
    }
    None
}

/// Paint the interior of `contour` onto `image` with the configured fill colour.
///
/// The contour keeps the coordinates of the mask it came from. Anything
/// beyond the image's current bounds is clipped, without shifting.
pub fn fill_region(image: &mut RgbImage, contour: &Contour, cfg: &DetectorConfig) {
    let region = contour.region_mask(image.width(), image.height());
    for (x, y, px) in region.enumerate_pixels() {
        if px[0] != COLD {
            image.put_pixel(x, y, cfg.fill_color);
        }
    }
}

/// Fill the first bar-shaped contour, if any. Returns whether one was filled.
pub fn fill_bar(image: &mut RgbImage, contours: &[Contour], cfg: &DetectorConfig) -> bool {
    match find_bar(contours, image.width(), image.height(), cfg) {
        Some(i) => {
            fill_region(image, &contours[i], cfg);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    #[test]
    fn wide_thin_contour_qualifies() {
        let cfg = DetectorConfig::default();
        let bar = Contour::rectangle(20, 60, 220, 10);
        assert!(is_bar_shaped(&bar, 300, 150, &cfg));
    }

    #[test]
    fn thresholds_are_strict() {
        let cfg = DetectorConfig::default();
        // Aspect ratio exactly 5.
        assert!(!is_bar_shaped(&Contour::rectangle(0, 0, 200, 40), 300, 400, &cfg));
        // Width exactly half the image.
        assert!(!is_bar_shaped(&Contour::rectangle(0, 0, 150, 10), 300, 150, &cfg));
        // Height exactly a fifth of the image.
        assert!(!is_bar_shaped(&Contour::rectangle(0, 0, 280, 30), 300, 150, &cfg));
    }

    #[test]
    fn square_never_qualifies() {
        let cfg = DetectorConfig::default();
        for side in [5, 50, 140] {
            let square = Contour::rectangle(0, 0, side, side);
            assert!(!is_bar_shaped(&square, 150, 150, &cfg));
        }
    }

    #[test]
    fn only_leading_candidates_are_examined() {
        let cfg = DetectorConfig::default();
        let mut contours: Vec<Contour> =
            (0..5).map(|i| Contour::rectangle(i * 20, 0, 15, 15)).collect();
        contours.push(Contour::rectangle(0, 100, 280, 10));
        assert_eq!(find_bar(&contours, 300, 150, &cfg), None);

        contours.remove(0);
        assert_eq!(find_bar(&contours, 300, 150, &cfg), Some(4));
    }

    #[test]
    fn first_qualifying_contour_wins() {
        let cfg = DetectorConfig::default();
        let contours = vec![
            Contour::rectangle(0, 10, 280, 12),
            Contour::rectangle(0, 100, 270, 10),
        ];
        let mut img = RgbImage::from_pixel(300, 150, GRAY);
        assert!(fill_bar(&mut img, &contours, &cfg));
        assert_eq!(*img.get_pixel(5, 15), WHITE);
        assert_eq!(*img.get_pixel(5, 105), GRAY);
    }

    #[test]
    fn fill_paints_exactly_the_region() {
        let cfg = DetectorConfig::default();
        let mut img = RgbImage::from_pixel(300, 150, GRAY);
        let bar = Contour::rectangle(20, 60, 220, 10);
        fill_region(&mut img, &bar, &cfg);
        for (x, y, px) in img.enumerate_pixels() {
            let inside = (20..240).contains(&x) && (60..70).contains(&y);
            assert_eq!(*px, if inside { WHITE } else { GRAY }, "pixel ({x},{y})");
        }
    }

    #[test]
    fn fill_clips_contours_beyond_a_cropped_image() {
        let cfg = DetectorConfig::default();
        // Contour from a 300-wide mask painted onto a 200-wide crop.
        let mut img = RgbImage::from_pixel(200, 150, GRAY);
        let bar = Contour::rectangle(20, 60, 260, 10);
        fill_region(&mut img, &bar, &cfg);
        assert_eq!(*img.get_pixel(20, 60), WHITE);
        assert_eq!(*img.get_pixel(199, 69), WHITE);
        assert_eq!(*img.get_pixel(19, 60), GRAY);
        assert_eq!(*img.get_pixel(100, 70), GRAY);
    }

    #[test]
    fn custom_fill_colour_is_used() {
        let cfg = DetectorConfig {
            fill_color: Rgb([0, 0, 0]),
            ..DetectorConfig::default()
        };
        let mut img = RgbImage::from_pixel(300, 150, GRAY);
        assert!(fill_bar(&mut img, &[Contour::rectangle(20, 60, 220, 10)], &cfg));
        assert_eq!(*img.get_pixel(100, 65), Rgb([0, 0, 0]));
    }

    #[test]
    fn no_candidates_leaves_image_alone() {
        let cfg = DetectorConfig::default();
        let mut img = RgbImage::from_pixel(30, 30, GRAY);
        let before = img.clone();
        assert!(!fill_bar(&mut img, &[], &cfg));
        assert_eq!(img, before);
    }
}
