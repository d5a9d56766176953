//! Error types for the sprite-strip crate.

/// Errors that can occur while configuring or running the sprite pipeline.
///
/// Pixel stages themselves never fail; everything here is either a caller
/// contract violation caught during validation or a file-level I/O problem.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The per-frame target size was zero.
    #[error("target size must be at least 1px (got {0})")]
    InvalidTargetSize(u32),

    /// The frame count was zero.
    #[error("frame count must be at least 1 (got {0})")]
    InvalidFrameCount(u32),

    /// The strip is narrower than the number of frames it should hold.
    #[error("strip of width {width}px cannot hold {frames} frames")]
    StripTooNarrow {
        /// Strip width in pixels.
        width: u32,
        /// Requested frame count.
        frames: u32,
    },

    /// The row count was zero or exceeds the image height.
    #[error("cannot split image of height {height}px into {rows} rows")]
    InvalidRowCount {
        /// Requested row count.
        rows: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// A guide colour could not be parsed as `#RRGGBB`.
    #[error("invalid hex colour: {0:?}")]
    InvalidColor(String),

    /// The pixelation factor was zero.
    #[error("pixelation factor must be at least 1 (got {0})")]
    InvalidPixelateFactor(u32),

    /// The content margin was outside `(0, 1]`.
    #[error("content margin must be in (0, 1] (got {0})")]
    InvalidMargin(f32),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image decoding or encoding.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let unsupported = Error::UnsupportedFormat("jpeg".to_string());
        assert!(unsupported.to_string().contains("jpeg"));

        let narrow = Error::StripTooNarrow {
            width: 3,
            frames: 4,
        };
        let msg = narrow.to_string();
        assert!(msg.contains("3px"));
        assert!(msg.contains("4 frames"));

        let color = Error::InvalidColor("#GG00FF".to_string());
        assert!(color.to_string().contains("#GG00FF"));

        assert!(Error::InvalidTargetSize(0).to_string().contains("got 0"));
    }
}
