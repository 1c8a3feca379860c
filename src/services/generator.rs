use poster_core::{merge, Design, MergeError, PosterDocument, Template, TemplateCatalog};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::models::AppConfig;
use crate::services::llm::{LlmError, LlmService};

/// Longest prompt prefix used as a substitute title
pub const MAX_PROMPT_TITLE_CHARS: usize = 40;

/// Where the design of a generated poster came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesignSource {
    Llm,
    Fallback,
}

impl DesignSource {
    /// Value of the `status` field in generate responses
    pub fn status(&self) -> &'static str {
        match self {
            DesignSource::Llm => "success",
            DesignSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedPoster {
    pub document: PosterDocument,
    pub source: DesignSource,
}

/// Turns a prompt into a merged poster document.
///
/// Owns the policy around the model's answer: placeholder titles are replaced
/// by the prompt, and a design without a known template gets one picked by
/// hashing the prompt so the same prompt always lands on the same layout.
pub struct PosterGenerator {
    catalog: Arc<TemplateCatalog>,
    llm: Arc<LlmService>,
    config: Arc<AppConfig>,
}

impl PosterGenerator {
    pub fn new(catalog: Arc<TemplateCatalog>, llm: Arc<LlmService>, config: Arc<AppConfig>) -> Self {
        Self {
            catalog,
            llm,
            config,
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<GeneratedPoster, MergeError> {
        let (design, source) = match self.llm.generate_design(prompt).await {
            Ok(design) => (design, DesignSource::Llm),
            Err(LlmError::Disabled) => {
                tracing::debug!("Language model disabled, using fallback design");
                (Design::default(), DesignSource::Fallback)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Language model call failed, using fallback design");
                (Design::default(), DesignSource::Fallback)
            }
        };

        let document = self.build(prompt, design)?;
        tracing::info!(
            template = %document.id,
            source = source.status(),
            "Generated poster document"
        );
        Ok(GeneratedPoster { document, source })
    }

    /// Apply title and template policy to `design`, then merge
    pub fn build(&self, prompt: &str, design: Design) -> Result<PosterDocument, MergeError> {
        let design = self.prepare(prompt, design);
        let template = self.template_for(prompt, &design);
        merge(template, &design)
    }

    fn prepare(&self, prompt: &str, mut design: Design) -> Design {
        let title = match design.title.as_deref() {
            Some(t) if !self.config.is_placeholder_title(t) => t.to_string(),
            _ => prompt_title(prompt),
        };

        // A title override carrying placeholder text would otherwise win over
        // the substituted title.
        if let Some(overrides) = design.elements.as_mut() {
            for o in overrides.iter_mut().filter(|o| o.id.as_deref() == Some("title")) {
                if o
                    .content
                    .as_deref()
                    .is_some_and(|c| self.config.is_placeholder_title(c))
                {
                    o.content = Some(title.clone());
                }
            }
        }

        design.title = Some(title);
        design
    }

    fn template_for(&self, prompt: &str, design: &Design) -> &Template {
        design
            .template_id
            .as_deref()
            .and_then(|id| self.catalog.get(id))
            .unwrap_or_else(|| {
                let id = self.hashed_template_id(prompt);
                self.catalog.get_or_default(id)
            })
    }

    /// Catalog id chosen deterministically from the prompt
    pub fn hashed_template_id(&self, prompt: &str) -> Option<&str> {
        let ids = self.catalog.ids();
        if ids.is_empty() {
            return None;
        }
        let digest = Sha256::digest(prompt.trim().as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        let index = (u64::from_be_bytes(prefix) % ids.len() as u64) as usize;

        tracing::trace!(hash = %hex::encode(prefix), index, "Hashed prompt to template");
        ids.get(index).copied()
    }
}

/// Trimmed prompt, cut to [`MAX_PROMPT_TITLE_CHARS`] characters
pub fn prompt_title(prompt: &str) -> String {
    prompt.trim().chars().take(MAX_PROMPT_TITLE_CHARS).collect()
}
