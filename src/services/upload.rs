use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use thiserror::Error;

use crate::services::poster_store::{StoredImage, UploadFormat};

pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_DIMENSION: u32 = 1920;
pub const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file provided")]
    MissingFile,

    #[error("Unsupported file type: {0:?}")]
    UnsupportedExtension(String),

    #[error("File too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Cannot decode image: {0}")]
    Decode(String),

    #[error("Cannot encode image: {0}")]
    Encode(String),
}

/// Validates and normalizes uploaded images
///
/// Uploads are decoded, flattened onto white, shrunk to fit the maximum box
/// (never enlarged) and re-encoded: PNG for `.png` files, JPEG otherwise.
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    max_bytes: usize,
    max_dimension: u32,
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            max_dimension: MAX_DIMENSION,
        }
    }
}

impl ImageProcessor {
    /// Lowercase extension of `filename` if it is an accepted image type
    pub fn allowed_extension(filename: &str) -> Result<String, UploadError> {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            Ok(ext)
        } else {
            Err(UploadError::UnsupportedExtension(filename.to_string()))
        }
    }

    /// CPU-bound; call from a blocking context.
    pub fn process(&self, data: &[u8], filename: &str) -> Result<StoredImage, UploadError> {
        let ext = Self::allowed_extension(filename)?;
        if data.is_empty() {
            return Err(UploadError::MissingFile);
        }
        if data.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                size: data.len(),
                max: self.max_bytes,
            });
        }

        let decoded = image::load_from_memory(data).map_err(|e| UploadError::Decode(e.to_string()))?;
        let mut rgb = flatten_onto_white(&decoded);

        if rgb.width() > self.max_dimension || rgb.height() > self.max_dimension {
            let (w, h) = fit_within(rgb.width(), rgb.height(), self.max_dimension);
            rgb = image::imageops::resize(&rgb, w, h, FilterType::Lanczos3);
        }

        let format = if ext == "png" {
            UploadFormat::Png
        } else {
            UploadFormat::Jpeg
        };
        let bytes = encode(&rgb, format)?;

        tracing::debug!(
            filename,
            width = rgb.width(),
            height = rgb.height(),
            bytes = bytes.len(),
            "Processed upload"
        );

        Ok(StoredImage { format, bytes })
    }
}

/// Largest size with the same aspect ratio that fits in `max` x `max`
fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    let scale = (max as f64 / width as f64).min(max as f64 / height as f64);
    let w = ((width as f64 * scale).round() as u32).clamp(1, max);
    let h = ((height as f64 * scale).round() as u32).clamp(1, max);
    (w, h)
}

fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u16;
        let over = |v: u8| ((v as u16 * a + 255 * (255 - a)) / 255) as u8;
        image::Rgb([over(r), over(g), over(b)])
    })
}

fn encode(image: &RgbImage, format: UploadFormat) -> Result<Vec<u8>, UploadError> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        UploadFormat::Png => image
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| UploadError::Encode(e.to_string()))?,
        UploadFormat::Jpeg => JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
            .encode_image(image)
            .map_err(|e| UploadError::Encode(e.to_string()))?,
    }
    Ok(buf.into_inner())
}
