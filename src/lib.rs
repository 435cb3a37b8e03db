//! Detect and remove red text watermarks from raster images.
//!
//! The watermark is a semi-transparent red overlay placed either as two
//! vertical stripes along the side borders or as a single horizontal bar.
//! Red pixels are segmented in HSV space, merged by dilation and traced into
//! contours. Side borders are cropped away; a bar is painted white.
//!
//! # Quick Start
//!
//! ```no_run
//! use red_watermark_removal::WatermarkEngine;
//!
//! let engine = WatermarkEngine::new();
//! let img = image::open("photo.jpg").unwrap().to_rgb8();
//! let result = engine.remove(&img).unwrap();
//! println!("watermark found: {}", result.watermark_found);
//! result.image.save("cleaned.png").unwrap();
//! ```
//!
//! # Custom thresholds
//!
//! Every threshold lives in [`DetectorConfig`]. Detection can also be run on
//! its own to inspect what would be changed:
//!
//! ```no_run
//! use red_watermark_removal::{DetectorConfig, WatermarkEngine};
//!
//! let config = DetectorConfig {
//!     border_trigger_ratio: 0.4,
//!     ..DetectorConfig::default()
//! };
//! let engine = WatermarkEngine::with_config(config).expect("valid config");
//! let img = image::open("photo.jpg").unwrap().to_rgb8();
//! let analysis = engine.analyze(&img).unwrap();
//! println!("crop: {:?}, bar: {:?}", analysis.crop, analysis.bar);
//! ```

#![deny(missing_docs)]

pub mod bar;
pub mod border;
pub mod config;
pub mod contours;
mod engine;
pub mod error;
pub mod morphology;
pub mod segmentation;

pub use border::CropRectangle;
pub use config::{DetectorConfig, HueBand};
pub use contours::Contour;
pub use engine::{
    default_output_path, encode_png, is_supported_image, save_image, Analysis, DetectionResult,
    ProcessOptions, ProcessResult, Stage, WatermarkEngine,
};
pub use error::{Error, Result};
