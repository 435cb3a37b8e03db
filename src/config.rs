//! Tunable thresholds for every detection stage.
//!
//! The defaults reproduce the calibrated values the detector was built around.
//! Tests and callers with unusual material can override any of them.

use image::Rgb;

use crate::error::{Error, Result};

/// An inclusive hue interval on the 0-180 hue scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HueBand {
    /// Lowest accepted hue.
    pub min: u8,
    /// Highest accepted hue.
    pub max: u8,
}

impl HueBand {
    /// Create a band covering `min..=max`.
    #[must_use]
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    /// Whether `hue` lies inside the band.
    #[must_use]
    pub fn contains(self, hue: u8) -> bool {
        (self.min..=self.max).contains(&hue)
    }
}

/// Thresholds for segmentation, refinement, border trimming and bar filling.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Hue bands classified as red. A pixel is hot if it falls in any band.
    pub hue_bands: Vec<HueBand>,
    /// Minimum saturation (0-255) for a hot pixel.
    pub min_saturation: u8,
    /// Minimum value (0-255) for a hot pixel.
    pub min_value: u8,
    /// Side of the square dilation kernel. Must be odd.
    pub dilation_kernel: u32,
    /// Number of dilation passes.
    pub dilation_iterations: u32,
    /// Number of columns inspected at each side for the border ratio.
    pub border_width: u32,
    /// Border ratio that must be strictly exceeded to trigger trimming.
    pub border_trigger_ratio: f64,
    /// Per-column ratio below which the border is considered finished.
    pub border_stop_ratio: f64,
    /// Edge scans cover `width / border_scan_divisor` columns.
    pub border_scan_divisor: u32,
    /// How many of the largest contours are considered for the bar.
    pub max_bar_candidates: usize,
    /// Bounding box `w / h` must exceed this.
    pub bar_min_aspect_ratio: f64,
    /// Bounding box width must exceed this fraction of the image width.
    pub bar_min_width_fraction: f64,
    /// Bounding box height must stay below this fraction of the image height.
    pub bar_max_height_fraction: f64,
    /// Colour painted over the bar.
    pub fill_color: Rgb<u8>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            hue_bands: vec![HueBand::new(0, 15), HueBand::new(160, 180)],
            min_saturation: 30,
            min_value: 30,
            dilation_kernel: 5,
            dilation_iterations: 2,
            border_width: 10,
            border_trigger_ratio: 0.3,
            border_stop_ratio: 0.1,
            border_scan_divisor: 8,
            max_bar_candidates: 5,
            bar_min_aspect_ratio: 5.0,
            bar_min_width_fraction: 0.5,
            bar_max_height_fraction: 0.2,
            fill_color: Rgb([255, 255, 255]),
        }
    }
}

impl DetectorConfig {
    /// Radius of the dilation kernel in Chebyshev distance.
    #[must_use]
    pub fn dilation_radius(&self) -> u32 {
        self.dilation_kernel / 2
    }

    /// Check that the configuration can drive the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.hue_bands.is_empty() {
            return Err(Error::InvalidConfig("at least one hue band is required".into()));
        }
        if let Some(band) = self.hue_bands.iter().find(|b| b.min > b.max) {
            return Err(Error::InvalidConfig(format!(
                "hue band {}..={} is inverted",
                band.min, band.max
            )));
        }
        if self.dilation_kernel == 0 || self.dilation_kernel % 2 == 0 {
            return Err(Error::InvalidConfig(format!(
                "dilation kernel must be a positive odd size, got {}",
                self.dilation_kernel
            )));
        }
        if self.dilation_radius() > u32::from(u8::MAX) {
            return Err(Error::InvalidConfig(format!(
                "dilation kernel {} is too large",
                self.dilation_kernel
            )));
        }
        if self.border_width == 0 {
            return Err(Error::InvalidConfig("border width must be non-zero".into()));
        }
        if self.border_scan_divisor == 0 {
            return Err(Error::InvalidConfig(
                "border scan divisor must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = DetectorConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.dilation_radius(), 2);
        assert_eq!(cfg.hue_bands.len(), 2);
    }

    #[test]
    fn hue_band_bounds_are_inclusive() {
        let band = HueBand::new(160, 180);
        assert!(band.contains(160));
        assert!(band.contains(180));
        assert!(!band.contains(159));
    }

    #[test]
    fn even_kernel_is_rejected() {
        let cfg = DetectorConfig {
            dilation_kernel: 4,
            ..DetectorConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn inverted_band_is_rejected() {
        let cfg = DetectorConfig {
            hue_bands: vec![HueBand::new(20, 10)],
            ..DetectorConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn zero_border_width_is_rejected() {
        let cfg = DetectorConfig {
            border_width: 0,
            ..DetectorConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = DetectorConfig {
            border_scan_divisor: 0,
            ..DetectorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
