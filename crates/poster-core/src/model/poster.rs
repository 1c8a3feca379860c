use serde::{Deserialize, Serialize};

use super::design::ColorScheme;
use super::element::{Background, Element, Size};
use super::lenient;
use super::template::Template;

/// A fully resolved poster: template shape plus the applied color scheme.
///
/// This is what gets persisted, re-rendered and exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosterDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(
        default,
        deserialize_with = "lenient::object",
        skip_serializing_if = "Option::is_none"
    )]
    pub size: Option<Size>,
    #[serde(default)]
    pub background: Background,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(
        default,
        deserialize_with = "lenient::object",
        skip_serializing_if = "Option::is_none"
    )]
    pub color_scheme: Option<ColorScheme>,
}

impl PosterDocument {
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    /// Resolved text of the text element with `id`.
    pub fn text(&self, id: &str) -> Option<&str> {
        self.element(id)
            .and_then(Element::as_text)
            .map(|t| t.resolved_content())
    }
}

impl From<Template> for PosterDocument {
    fn from(template: Template) -> Self {
        Self {
            id: template.id,
            name: template.name,
            category: template.category,
            size: template.size,
            background: template.background,
            elements: template.elements,
            color_scheme: None,
        }
    }
}
