use poster_core::FontSource;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration: optional YAML file plus environment overrides
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// Listen address for `serve`
    pub bind_addr: String,

    /// Root of the poster and upload store
    pub data_dir: PathBuf,

    /// Extra template files (json/yaml) loaded next to the built-ins
    pub templates_dir: Option<PathBuf>,

    /// Font candidates, file paths or family names, highest priority first.
    /// Empty means the built-in candidate list.
    pub fonts: Vec<String>,

    /// Titles that mean "the model did not pick a real title"
    pub placeholder_titles: Vec<String>,

    /// Timeout for fetching remote images during rendering
    pub image_timeout_secs: u64,

    pub llm: LlmConfig,
}

/// Language model provider settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    /// `dashscope`, `zhipu`, `baidu` or `openai`
    pub provider: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
    /// Overrides the provider's endpoint (any OpenAI-compatible API)
    pub base_url: Option<String>,
    /// Baidu only: secret paired with `api_key` for the token exchange
    pub secret_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "dashscope".to_string(),
            api_key: None,
            model: None,
            base_url: None,
            secret_key: None,
            timeout_secs: 30,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            data_dir: PathBuf::from("./data"),
            templates_dir: None,
            fonts: Vec::new(),
            placeholder_titles: default_placeholder_titles(),
            image_timeout_secs: 10,
            llm: LlmConfig::default(),
        }
    }
}

fn default_placeholder_titles() -> Vec<String> {
    [
        "标题内容",
        "海报主标题",
        "海报标题",
        "根据用户需求写的标题",
        "Poster Title",
        "Title",
    ]
        .into_iter()
        .map(String::from)
        .collect()
}

impl AppConfig {
    /// Load from `CONFIG_FILE` (if set) and apply environment overrides
    pub fn load() -> Self {
        let mut config = match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::load_from_file(&path),
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Read a YAML config file, falling back to defaults on any error
    pub fn load_from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<Self>(&content) {
                Ok(config) => {
                    tracing::info!(
                        path = %path.display(),
                        provider = %config.llm.provider,
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, path = %path.display(), "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, path = %path.display(), "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Apply environment overrides; `lookup` is `std::env::var` outside tests.
    /// Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = get("DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get("TEMPLATES_DIR") {
            self.templates_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get("POSTER_FONT") {
            self.fonts.insert(0, v);
        }
        if let Some(v) = get("LLM_PROVIDER") {
            self.llm.provider = v.to_lowercase();
        }
        if let Some(v) = get("LLM_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = get("LLM_MODEL") {
            self.llm.model = Some(v);
        }
        if let Some(v) = get("LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Some(v) = get("BAIDU_SECRET_KEY") {
            self.llm.secret_key = Some(v);
        }
    }

    pub fn posters_dir(&self) -> PathBuf {
        self.data_dir.join("posters")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs.max(1))
    }

    /// Configured font candidates followed by the built-in list
    pub fn font_sources(&self) -> Vec<FontSource> {
        self.fonts
            .iter()
            .map(|f| FontSource::parse(f))
            .chain(poster_core::default_font_sources())
            .collect()
    }

    /// Whether `title` is missing in substance: blank or a known placeholder
    pub fn is_placeholder_title(&self, title: &str) -> bool {
        let title = title.trim();
        title.is_empty() || self.placeholder_titles.iter().any(|p| p.trim() == title)
    }
}
