use std::num::ParseIntError;

use thiserror::Error;

/// Failure to parse a `#RRGGBB` color string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseColorError {
    #[error("invalid hex color length (expected 6 characters, got {0})")]
    InvalidLength(usize),

    #[error("invalid hex character in {0:?}")]
    InvalidCharacter(String),

    #[error("invalid hex character: {0}")]
    InvalidHex(#[from] ParseIntError),
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Template {template:?} has no canvas size")]
    MissingSize { template: String },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Poster has no canvas size")]
    MissingSize,

    #[error("Unsupported dimensions: {width}x{height}")]
    UnsupportedDimensions { width: u32, height: u32 },

    #[error("Invalid color {value:?}: {source}")]
    InvalidColor {
        value: String,
        #[source]
        source: ParseColorError,
    },

    #[error("Failed to allocate pixmap")]
    PixmapAllocation,

    #[error("PNG encode error: {0}")]
    PngEncode(String),

    #[error("JPEG encode error: {0}")]
    JpegEncode(String),

    #[error("PDF encode error: {0}")]
    PdfEncode(String),

    #[error("PDF output is not available in this build")]
    PdfUnsupported,
}

impl RenderError {
    /// True when the document itself is malformed, as opposed to an
    /// encoder or allocation failure.
    pub fn is_invalid_document(&self) -> bool {
        matches!(
            self,
            RenderError::MissingSize
                | RenderError::UnsupportedDimensions { .. }
                | RenderError::InvalidColor { .. }
        )
    }
}

/// Failures while fetching or decoding an image element's source.
///
/// These never abort a render; the element is skipped with a warning.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Upstream returned HTTP {0}")]
    Status(u16),

    #[error("Malformed data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Unsupported image URL: {0}")]
    UnsupportedUrl(String),

    #[error("Image not found: {0}")]
    NotFound(String),

    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image has zero area")]
    Empty,
}
