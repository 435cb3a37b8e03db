//! Mask refinement by dilation.

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;

use crate::config::DetectorConfig;

/// Dilate `mask` with a square kernel, repeated `dilation_iterations` times.
///
/// A square kernel of side `2r + 1` is a Chebyshev ball of radius `r`, so each
/// pass grows every hot pixel by `r` in all eight directions. Pixels outside
/// the image never contribute. The result always has the mask's dimensions.
#[must_use]
pub fn refine_mask(mask: &GrayImage, cfg: &DetectorConfig) -> GrayImage {
    let radius = u8::try_from(cfg.dilation_radius()).unwrap_or(u8::MAX);
    if radius == 0 {
        return mask.clone();
    }

    let mut refined = mask.clone();
    for _ in 0..cfg.dilation_iterations {
        refined = dilate(&refined, Norm::LInf, radius);
    }
    refined
}
