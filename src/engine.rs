//! Watermark detection pipeline and file processing.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat, RgbImage};

use crate::bar;
use crate::border::{self, CropRectangle};
use crate::config::DetectorConfig;
use crate::contours::{self, Contour};
use crate::error::{Error, Result};
use crate::morphology;
use crate::segmentation;

/// Pipeline stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Input validated.
    Start,
    /// Red mask computed.
    Segmented,
    /// Mask dilated and contours extracted.
    Refined,
    /// Side borders inspected.
    BorderChecked,
    /// Bar candidates inspected.
    BarChecked,
    /// Result assembled.
    Done,
}

/// Everything the detection stages found, before the image is touched.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Dilated red mask, same size as the input image.
    pub mask: GrayImage,
    /// External contours of `mask`, largest first.
    pub contours: Vec<Contour>,
    /// Columns to keep if a side border was found.
    pub crop: Option<CropRectangle>,
    /// Index into `contours` of the bar to fill, judged against the
    /// post-crop image size.
    pub bar: Option<usize>,
}

impl Analysis {
    /// Whether either stage found a watermark.
    #[must_use]
    pub fn watermark_found(&self) -> bool {
        self.crop.is_some() || self.bar.is_some()
    }
}

/// Output of a full pipeline run.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// The processed image. Height always matches the input; width shrinks
    /// when a border was trimmed.
    pub image: RgbImage,
    /// Whether a border was trimmed or a bar filled.
    pub watermark_found: bool,
    /// Columns kept by the border trim, if one happened.
    pub crop: Option<CropRectangle>,
    /// Whether a bar was painted over.
    pub bar_filled: bool,
}

/// Options controlling file processing behavior.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Do not write an output file when no watermark is found.
    pub skip_clean: bool,
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was skipped (no watermark found, nothing written).
    pub skipped: bool,
    /// Whether a watermark was found.
    pub watermark_found: bool,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            skipped: false,
            watermark_found: false,
            message: String::new(),
        }
    }
}

/// The watermark engine holding the detector configuration.
///
/// The engine is immutable and keeps no per-image state, so one instance can
/// serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct WatermarkEngine {
    config: DetectorConfig,
}

impl WatermarkEngine {
    /// Create an engine with the default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration cannot run.
    pub fn with_config(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Run the detection stages without modifying the image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImage`] for an empty image and
    /// [`Error::Processing`] if contour extraction fails.
    pub fn analyze(&self, image: &RgbImage) -> Result<Analysis> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 || image.as_raw().is_empty() {
            return Err(Error::InvalidImage { width, height });
        }
        log::info!("Starting watermark detection on {width}x{height} image");
        log::trace!("stage: {:?}", Stage::Start);

        let raw = segmentation::segment_red(image, &self.config);
        log::trace!("stage: {:?}", Stage::Segmented);

        let mask = morphology::refine_mask(&raw, &self.config);
        let contours = contours::extract_contours(&mask)?;
        log::info!("Found {} contours in the image", contours.len());
        log::trace!("stage: {:?}", Stage::Refined);

        let crop = border::detect_border_trim(&mask, &self.config);
        if let Some(c) = crop {
            log::info!(
                "Red side borders detected: keeping columns {}..={} (new width {})",
                c.left,
                c.right,
                c.width()
            );
        }
        log::trace!("stage: {:?}", Stage::BorderChecked);

        // The bar is judged against the working image, which the crop narrows,
        // while its contour stays in pre-crop coordinates.
        let working_width = crop.map_or(width, CropRectangle::width);
        let bar = bar::find_bar(&contours, working_width, height, &self.config);
        log::trace!("stage: {:?}", Stage::BarChecked);

        Ok(Analysis {
            mask,
            contours,
            crop,
            bar,
        })
    }

    /// Apply a previous [`Analysis`] to a copy of `image`: crop, then paint.
    #[must_use]
    pub fn apply(&self, image: &RgbImage, analysis: &Analysis) -> DetectionResult {
        let mut working = match analysis.crop {
            Some(crop) => border::crop_columns(image, crop),
            None => image.clone(),
        };

        let bar_filled = match analysis.bar.and_then(|i| analysis.contours.get(i)) {
            Some(contour) => {
                bar::fill_region(&mut working, contour, &self.config);
                log::info!("Horizontal bar painted over");
                true
            }
            None => false,
        };

        let watermark_found = analysis.crop.is_some() || bar_filled;
        if !watermark_found {
            log::warn!("No watermark detected in the image");
        }
        log::trace!("stage: {:?}", Stage::Done);

        DetectionResult {
            image: working,
            watermark_found,
            crop: analysis.crop,
            bar_filled,
        }
    }

    /// Detect and remove the watermark, returning a new image.
    ///
    /// The input is never modified.
    ///
    /// # Errors
    ///
    /// See [`WatermarkEngine::analyze`].
    pub fn remove(&self, image: &RgbImage) -> Result<DetectionResult> {
        let analysis = self.analyze(image)?;
        Ok(self.apply(image, &analysis))
    }

    /// Process a single image file: load, detect, remove, save.
    ///
    /// Returns a [`ProcessResult`] indicating success, skip, or failure.
    #[must_use]
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        opts: &ProcessOptions,
    ) -> ProcessResult {
        let mut result = ProcessResult::new(input);

        let rgb_img = match image::open(input) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                result.message = format!("Failed to load: {e}");
                return result;
            }
        };

        let detection = match self.remove(&rgb_img) {
            Ok(d) => d,
            Err(e) => {
                result.message = format!("Failed to process: {e}");
                return result;
            }
        };
        result.watermark_found = detection.watermark_found;

        if !detection.watermark_found && opts.skip_clean {
            result.skipped = true;
            result.success = true;
            result.message = "No watermark detected".to_string();
            return result;
        }

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        match save_image(&detection.image, output) {
            Ok(()) => {
                result.success = true;
                result.message = describe(&detection);
            }
            Err(e) => {
                result.message = format!("Failed to save: {e}");
            }
        }

        result
    }

    /// Process all supported images in a directory.
    ///
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    /// Returns a [`ProcessResult`] for each image found.
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        opts: &ProcessOptions,
    ) -> Vec<ProcessResult> {
        let entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => {
                let mut result = ProcessResult::new(input_dir);
                result.message = format!("Failed to read directory: {e}");
                return vec![result];
            }
        };

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                let mut result = ProcessResult::new(output_dir);
                result.message = format!("Failed to create output directory: {e}");
                return vec![result];
            }
        }

        let process = |input_path: &PathBuf| {
            let output_path = match input_path.file_name() {
                Some(name) => output_dir.join(name),
                None => output_dir.join("processed_image.png"),
            };
            self.process_file(input_path, &output_path, opts)
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            entries.par_iter().map(process).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            entries.iter().map(process).collect()
        }
    }
}

fn describe(detection: &DetectionResult) -> String {
    match (detection.crop, detection.bar_filled) {
        (Some(c), true) => format!(
            "Border trimmed to columns {}..={} and bar filled",
            c.left, c.right
        ),
        (Some(c), false) => format!("Border trimmed to columns {}..={}", c.left, c.right),
        (None, true) => "Bar filled".to_string(),
        (None, false) => "No watermark detected, image written unchanged".to_string(),
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an RGB image with format-specific quality settings.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(img)?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            img.save_with_format(path, format)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Encode an RGB image as PNG bytes.
///
/// # Errors
///
/// Returns [`Error::Image`] if encoding fails.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_cleaned.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_cleaned.{ext}"))
}
