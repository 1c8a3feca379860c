//! Image fetch and resize
//!
//! Image elements reference pixels by URL. An [`ImageSource`] turns the URL
//! into bytes; [`load_image`] decodes them and resizes to the element's
//! target box.

use std::time::Duration;

use base64::Engine;
use image::imageops::FilterType;
use image::RgbaImage;

use crate::error::ImageError;
use crate::model::Size;

/// Bound on a single remote image fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves an image URL to encoded bytes.
///
/// Implementations are called from blocking render threads, never from
/// inside an async runtime.
pub trait ImageSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError>;
}

/// Fetches `http(s)://` URLs with a bounded timeout and decodes `data:` URLs
/// inline.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    timeout: Duration,
}

impl HttpImageSource {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpImageSource {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_TIMEOUT)
    }
}

impl ImageSource for HttpImageSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        let url = url.trim();
        if url.starts_with("data:") {
            return decode_data_url(url);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ImageError::UnsupportedUrl(url.to_string()));
        }

        tracing::debug!(url = %url, "Fetching image");

        // Per fetch: the client's internal runtime must be created and dropped
        // on this blocking thread.
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ImageError::Fetch(e.to_string()))?;
        let response = client
            .get(url)
            .send()
            .map_err(|e| ImageError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Status(status.as_u16()));
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| ImageError::Fetch(e.to_string()))
    }
}

/// Decode a base64 `data:` URL. Non-base64 payloads are rejected.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, ImageError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ImageError::InvalidDataUrl("missing data: prefix".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::InvalidDataUrl("missing ',' separator".into()))?;
    if !meta.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        return Err(ImageError::InvalidDataUrl("only base64 payloads are supported".into()));
    }

    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| ImageError::InvalidDataUrl(e.to_string()))
}

/// Fetch, decode and (when `target` is given) resize with Lanczos3.
pub fn load_image(
    source: &dyn ImageSource,
    url: &str,
    target: Option<Size>,
) -> Result<RgbaImage, ImageError> {
    let bytes = source.fetch(url)?;
    let decoded = image::load_from_memory(&bytes)?.to_rgba8();
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(ImageError::Empty);
    }

    match target {
        Some(size) if (size.width, size.height) != decoded.dimensions() => Ok(
            image::imageops::resize(&decoded, size.width, size.height, FilterType::Lanczos3),
        ),
        _ => Ok(decoded),
    }
}
