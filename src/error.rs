//! Error types for the red-watermark-removal crate.

/// Errors that can occur during watermark detection and removal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input image has no pixels to analyze.
    #[error("invalid image ({width}x{height}): width and height must be non-zero")]
    InvalidImage {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// An unexpected failure inside segmentation, morphology or contour extraction.
    #[error("processing failed: {0}")]
    Processing(String),

    /// The detector configuration cannot be used.
    #[error("invalid detector configuration: {0}")]
    InvalidConfig(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred while loading, saving or encoding an image.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
