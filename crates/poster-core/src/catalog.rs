//! Template catalog
//!
//! Three built-in layouts are always present. Extra templates can be loaded
//! from a directory at startup; after that the catalog is read-only.

use std::collections::BTreeMap;
use std::path::Path;

use crate::model::{
    Background, Element, Position, Size, Style, Template, TemplateSummary, TextAlign, TextElement,
};

/// Id returned by [`TemplateCatalog::get_or_default`] for unknown ids.
pub const DEFAULT_TEMPLATE_ID: &str = "template_001";

pub struct TemplateCatalog {
    templates: BTreeMap<String, Template>,
    fallback: Template,
}

impl TemplateCatalog {
    /// Catalog containing only the built-in templates.
    pub fn builtin() -> Self {
        let templates: BTreeMap<_, _> = builtin_templates()
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();
        let fallback = templates
            .get(DEFAULT_TEMPLATE_ID)
            .cloned()
            .unwrap_or_else(|| builtin_templates().swap_remove(0));
        Self {
            templates,
            fallback,
        }
    }

    /// Built-ins plus every `*.json` / `*.yaml` / `*.yml` template in `dir`.
    ///
    /// Files that fail to parse, lack an id, or reuse a built-in id are
    /// logged and skipped.
    pub fn with_directory(dir: impl AsRef<Path>) -> Self {
        let mut catalog = Self::builtin();
        let dir = dir.as_ref();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Cannot read templates directory");
                return catalog;
            }
        };

        let mut paths: Vec<_> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
        paths.sort();

        for path in paths {
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            let parsed = match ext {
                "json" => std::fs::read_to_string(&path)
                    .map_err(|e| e.to_string())
                    .and_then(|s| serde_json::from_str::<Template>(&s).map_err(|e| e.to_string())),
                "yaml" | "yml" => std::fs::read_to_string(&path)
                    .map_err(|e| e.to_string())
                    .and_then(|s| serde_yaml::from_str::<Template>(&s).map_err(|e| e.to_string())),
                _ => continue,
            };

            match parsed {
                Ok(template) if template.id.trim().is_empty() => {
                    tracing::warn!(path = %path.display(), "Template file has no id, skipping");
                }
                Ok(template) if catalog.templates.contains_key(&template.id) => {
                    tracing::warn!(
                        path = %path.display(),
                        template = %template.id,
                        "Template id already defined, skipping"
                    );
                }
                Ok(template) => {
                    tracing::debug!(path = %path.display(), template = %template.id, "Loaded template");
                    catalog.templates.insert(template.id.clone(), template);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Invalid template file, skipping");
                }
            }
        }

        tracing::info!(templates = catalog.templates.len(), "Template catalog initialized");
        catalog
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }

    /// Template for `id`, or the default template when `id` is absent or unknown.
    pub fn get_or_default(&self, id: Option<&str>) -> &Template {
        id.and_then(|id| self.templates.get(id))
            .unwrap_or(&self.fallback)
    }

    /// Summaries ordered by id, optionally filtered by exact category.
    pub fn list(&self, category: Option<&str>) -> Vec<TemplateSummary> {
        self.templates
            .values()
            .filter(|t| category.map_or(true, |c| t.category == c))
            .map(Template::summary)
            .collect()
    }

    /// All template ids in order.
    pub fn ids(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

struct TextSpec<'a> {
    id: &'a str,
    x: f32,
    y: f32,
    font_size: f32,
    bold: bool,
    color: &'a str,
    default: &'a str,
}

fn text(spec: TextSpec<'_>) -> Element {
    Element::Text(TextElement {
        id: spec.id.to_string(),
        position: Position::new(spec.x, spec.y),
        style: Style {
            font_size: Some(spec.font_size),
            font_weight: spec.bold.then(|| "bold".to_string()),
            color: Some(spec.color.to_string()),
            text_align: Some(TextAlign::Center),
            font_family: Some("Arial".to_string()),
            ..Style::default()
        },
        editable: true,
        default_content: Some(spec.default.to_string()),
        content: None,
    })
}

fn gradient(top: &str, bottom: &str) -> Background {
    Background::Gradient {
        colors: [top.to_string(), bottom.to_string()],
    }
}

fn builtin_templates() -> Vec<Template> {
    vec![
        Template {
            id: "template_001".into(),
            name: "活动海报-竖版".into(),
            category: "活动".into(),
            size: Some(Size::new(800, 1200)),
            background: gradient("#4A90E2", "#357ABD"),
            elements: vec![
                text(TextSpec { id: "title", x: 400.0, y: 200.0, font_size: 48.0, bold: true, color: "#FFFFFF", default: "活动标题" }),
                text(TextSpec { id: "subtitle", x: 400.0, y: 280.0, font_size: 24.0, bold: false, color: "#FFFFFF", default: "副标题" }),
                text(TextSpec { id: "description", x: 400.0, y: 800.0, font_size: 18.0, bold: false, color: "#FFFFFF", default: "活动描述" }),
            ],
        },
        Template {
            id: "template_002".into(),
            name: "产品海报-横版".into(),
            category: "产品".into(),
            size: Some(Size::new(1200, 800)),
            background: Background::Solid {
                color: "#F5F5F5".into(),
            },
            elements: vec![
                text(TextSpec { id: "title", x: 600.0, y: 200.0, font_size: 56.0, bold: true, color: "#333333", default: "产品名称" }),
                text(TextSpec { id: "description", x: 600.0, y: 300.0, font_size: 20.0, bold: false, color: "#666666", default: "产品描述" }),
            ],
        },
        Template {
            id: "template_003".into(),
            name: "节日海报-方形".into(),
            category: "节日".into(),
            size: Some(Size::new(1000, 1000)),
            background: gradient("#FF6B6B", "#FFD93D"),
            elements: vec![
                text(TextSpec { id: "title", x: 500.0, y: 400.0, font_size: 64.0, bold: true, color: "#FFFFFF", default: "节日快乐" }),
                text(TextSpec { id: "subtitle", x: 500.0, y: 500.0, font_size: 28.0, bold: false, color: "#FFFFFF", default: "祝福语" }),
            ],
        },
    ]
}
