use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poster_core::PosterDocument;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::{ImageId, PosterId};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt record at {path}: {message}")]
    Corrupt { path: PathBuf, message: String },
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Persisted poster metadata (the JSON sidecar next to the PNG)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosterRecord {
    pub poster_id: PosterId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub poster_data: PosterDocument,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Encoding of a stored upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Png,
    Jpeg,
}

impl UploadFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            UploadFormat::Png => "png",
            UploadFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            UploadFormat::Png => "image/png",
            UploadFormat::Jpeg => "image/jpeg",
        }
    }

    const ALL: [UploadFormat; 2] = [UploadFormat::Png, UploadFormat::Jpeg];
}

#[derive(Debug, Clone)]
pub struct StoredImage {
    pub format: UploadFormat,
    pub bytes: Vec<u8>,
}

/// Trait for poster and upload persistence
#[async_trait]
pub trait PosterStore: Send + Sync {
    /// Store or replace a poster record together with its rendered PNG
    async fn put(&self, record: &PosterRecord, png: &[u8]) -> Result<(), StorageError>;

    /// Find a poster record by id
    async fn get(&self, id: &PosterId) -> Result<Option<PosterRecord>, StorageError>;

    /// Rendered PNG of a stored poster
    async fn get_png(&self, id: &PosterId) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store an uploaded image
    async fn put_image(&self, id: &ImageId, image: &StoredImage) -> Result<(), StorageError>;

    /// Find an uploaded image by id
    async fn get_image(&self, id: &ImageId) -> Result<Option<StoredImage>, StorageError>;
}

/// Disk-backed store: `posters/<id>.json` + `posters/<id>.png`, `images/<id>.<ext>`
///
/// Every write goes to a temporary file that is renamed into place, and
/// writes for the same id are serialized, so readers never see a torn file.
/// A per-id lock lives only while some write for that id is in flight.
pub struct FilePosterStore {
    posters_dir: PathBuf,
    images_dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FilePosterStore {
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let data_dir = data_dir.as_ref();
        let posters_dir = data_dir.join("posters");
        let images_dir = data_dir.join("images");
        for dir in [&posters_dir, &images_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| StorageError::io(dir, e))?;
        }
        tracing::info!(path = %data_dir.display(), "Poster store opened");

        Ok(Self {
            posters_dir,
            images_dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    async fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(key.to_string()).or_default().clone()
    }

    /// Drop the map entry for `key` once no other writer holds it.
    async fn release(&self, key: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // One reference in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }

    async fn write_poster(&self, record: &PosterRecord, png: &[u8]) -> Result<(), StorageError> {
        let id = &record.poster_id;
        let json_path = self.poster_json_path(id);
        let json = serde_json::to_vec_pretty(record).map_err(|e| StorageError::Corrupt {
            path: json_path.clone(),
            message: e.to_string(),
        })?;
        let png_path = self.poster_png_path(id);

        // Stage both files before touching the stored pair.
        let png_tmp = stage(&png_path, png).await?;
        let json_tmp = match stage(&json_path, &json).await {
            Ok(tmp) => tmp,
            Err(e) => {
                let _ = tokio::fs::remove_file(&png_tmp).await;
                return Err(e);
            }
        };

        commit(&png_tmp, &png_path).await?;
        commit(&json_tmp, &json_path).await
    }

    fn poster_json_path(&self, id: &PosterId) -> PathBuf {
        self.posters_dir.join(format!("{id}.json"))
    }

    fn poster_png_path(&self, id: &PosterId) -> PathBuf {
        self.posters_dir.join(format!("{id}.png"))
    }

    fn image_path(&self, id: &ImageId, format: UploadFormat) -> PathBuf {
        self.images_dir.join(format!("{id}.{}", format.extension()))
    }
}

fn temp_path(path: &Path) -> PathBuf {
    path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|e| e.to_str()).unwrap_or("")
    ))
}

/// Write `bytes` next to `path` under a temporary name.
async fn stage(path: &Path, bytes: &[u8]) -> Result<PathBuf, StorageError> {
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| StorageError::io(&tmp, e))?;
    Ok(tmp)
}

async fn commit(tmp: &Path, path: &Path) -> Result<(), StorageError> {
    tokio::fs::rename(tmp, path)
        .await
        .map_err(|e| StorageError::io(path, e))
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let tmp = stage(path, bytes).await?;
    commit(&tmp, path).await
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

#[async_trait]
impl PosterStore for FilePosterStore {
    async fn put(&self, record: &PosterRecord, png: &[u8]) -> Result<(), StorageError> {
        let id = &record.poster_id;
        let lock = self.lock_for(id.as_str()).await;
        let result = {
            let _guard = lock.lock().await;
            self.write_poster(record, png).await
        };
        self.release(id.as_str(), lock).await;

        result?;
        tracing::debug!(poster_id = %id, png_bytes = png.len(), "Stored poster");
        Ok(())
    }

    async fn get(&self, id: &PosterId) -> Result<Option<PosterRecord>, StorageError> {
        let path = self.poster_json_path(id);
        let Some(bytes) = read_optional(&path).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                path,
                message: e.to_string(),
            })
    }

    async fn get_png(&self, id: &PosterId) -> Result<Option<Vec<u8>>, StorageError> {
        read_optional(&self.poster_png_path(id)).await
    }

    async fn put_image(&self, id: &ImageId, image: &StoredImage) -> Result<(), StorageError> {
        let lock = self.lock_for(id.as_str()).await;
        let result = {
            let _guard = lock.lock().await;
            write_atomic(&self.image_path(id, image.format), &image.bytes).await
        };
        self.release(id.as_str(), lock).await;

        result?;
        tracing::debug!(image_id = %id, bytes = image.bytes.len(), "Stored image");
        Ok(())
    }

    async fn get_image(&self, id: &ImageId) -> Result<Option<StoredImage>, StorageError> {
        for format in UploadFormat::ALL {
            if let Some(bytes) = read_optional(&self.image_path(id, format)).await? {
                return Ok(Some(StoredImage { format, bytes }));
            }
        }
        Ok(None)
    }
}
