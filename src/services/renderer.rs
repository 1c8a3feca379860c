use poster_core::{
    render_to_pdf, FontLibrary, HttpImageSource, ImageError, ImageSource, PosterDocument,
    RasterFormat, RasterRenderer, RenderError,
};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{AppConfig, ImageId};
use crate::services::poster_store::UploadFormat;

/// Resolves `/api/image/<id>` and `/image/<id>` from the upload directory,
/// everything else over HTTP.
pub struct StoreImageSource {
    images_dir: PathBuf,
    fallback: HttpImageSource,
}

impl StoreImageSource {
    pub fn new(images_dir: impl Into<PathBuf>, fallback: HttpImageSource) -> Self {
        Self {
            images_dir: images_dir.into(),
            fallback,
        }
    }

    fn local_id(url: &str) -> Option<&str> {
        let path = url.trim();
        let path = path
            .strip_prefix("/api/image/")
            .or_else(|| path.strip_prefix("/image/"))?;
        Some(path.split(['?', '#']).next().unwrap_or(path))
    }
}

impl ImageSource for StoreImageSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        let Some(raw_id) = Self::local_id(url) else {
            return self.fallback.fetch(url);
        };
        let id = ImageId::parse(raw_id).map_err(|_| ImageError::NotFound(url.to_string()))?;

        for format in [UploadFormat::Jpeg, UploadFormat::Png] {
            let path = self.images_dir.join(format!("{id}.{}", format.extension()));
            match std::fs::read(&path) {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(ImageError::Fetch(e.to_string())),
            }
        }
        Err(ImageError::NotFound(url.to_string()))
    }
}

/// Async front of the raster and PDF renderers
///
/// Rendering is CPU-bound and may block on image fetches, so every call runs
/// on tokio's blocking pool.
pub struct RenderService {
    raster: Arc<RasterRenderer>,
}

impl RenderService {
    pub fn new(fonts: Arc<FontLibrary>, images: Arc<dyn ImageSource>) -> Self {
        Self {
            raster: Arc::new(RasterRenderer::new(fonts, images)),
        }
    }

    /// Resolve fonts from the config and read uploads from the data directory
    pub fn from_config(config: &AppConfig) -> Self {
        let fonts = FontLibrary::resolve(&config.font_sources());
        let images = StoreImageSource::new(
            config.images_dir(),
            HttpImageSource::new(config.image_timeout()),
        );
        Self::new(Arc::new(fonts), Arc::new(images))
    }

    pub fn font_count(&self) -> usize {
        self.raster.fonts().len()
    }

    pub async fn render(
        &self,
        document: PosterDocument,
        format: RasterFormat,
    ) -> Result<Vec<u8>, ApiError> {
        let raster = self.raster.clone();
        run_blocking(move || raster.render(&document, format)).await
    }

    pub async fn render_pdf(&self, document: PosterDocument) -> Result<Vec<u8>, ApiError> {
        run_blocking(move || render_to_pdf(&document)).await
    }
}

async fn run_blocking<F>(job: F) -> Result<Vec<u8>, ApiError>
where
    F: FnOnce() -> Result<Vec<u8>, RenderError> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| ApiError::Internal(format!("Render task failed: {e}")))?
        .map_err(ApiError::from)
}
