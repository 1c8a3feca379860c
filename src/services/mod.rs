pub mod generator;
pub mod llm;
pub mod poster_store;
pub mod renderer;
pub mod upload;

pub use generator::{DesignSource, GeneratedPoster, PosterGenerator};
pub use llm::{LlmError, LlmService, Provider};
pub use poster_store::{
    FilePosterStore, PosterRecord, PosterStore, StorageError, StoredImage, UploadFormat,
};
pub use renderer::{RenderService, StoreImageSource};
pub use upload::{ImageProcessor, UploadError};
