pub mod config;
pub mod ids;

pub use config::{AppConfig, LlmConfig};
pub use ids::{ImageId, PosterId};
