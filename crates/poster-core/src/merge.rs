//! Design merge
//!
//! `merge` turns a template plus a sparse design into a poster document. It
//! is pure: the same inputs always produce the same document, and the set of
//! element ids never changes.

use std::collections::HashMap;

use crate::error::MergeError;
use crate::model::{Background, ColorScheme, Design, Element, ElementOverride, PosterDocument, Template};

/// Gradient stop used when a color scheme omits `primary`.
pub const DEFAULT_PRIMARY: &str = "#4A90E2";
/// Gradient stop used when a color scheme omits `secondary`.
pub const DEFAULT_SECONDARY: &str = "#FFFFFF";

pub fn merge(template: &Template, design: &Design) -> Result<PosterDocument, MergeError> {
    if !template.size.is_some_and(|s| !s.is_empty()) {
        return Err(MergeError::MissingSize {
            template: template.id.clone(),
        });
    }

    let mut document = PosterDocument::from(template.clone());

    apply_text_fields(&mut document, design);
    if let Some(overrides) = &design.elements {
        apply_overrides(&mut document, overrides);
    }
    if let Some(scheme) = &design.color_scheme {
        apply_color_scheme(&mut document, scheme);
    }

    Ok(document)
}

fn apply_text_fields(document: &mut PosterDocument, design: &Design) {
    let fields = [
        ("title", &design.title),
        ("subtitle", &design.subtitle),
        ("description", &design.description),
    ];

    for (id, value) in fields {
        let Some(value) = value else { continue };
        for element in &mut document.elements {
            if let Element::Text(text) = element {
                if text.id == id {
                    text.content = Some(value.clone());
                }
            }
        }
    }
}

fn apply_overrides(document: &mut PosterDocument, overrides: &[ElementOverride]) {
    // Later entries replace earlier ones with the same id.
    let by_id: HashMap<&str, &ElementOverride> = overrides
        .iter()
        .filter_map(|o| o.id.as_deref().map(|id| (id, o)))
        .collect();

    for element in &mut document.elements {
        let Some(patch) = by_id.get(element.id()) else {
            continue;
        };

        if let (Element::Text(text), Some(content)) = (&mut *element, &patch.content) {
            text.content = Some(content.clone());
        }

        if let Some(position) = patch.position {
            let target = element.position_mut();
            if let Some(x) = position.x {
                target.x = x;
            }
            if let Some(y) = position.y {
                target.y = y;
            }
        }

        if let Some(style) = &patch.style {
            element.style_mut().merge_from(style);
        }
    }
}

fn apply_color_scheme(document: &mut PosterDocument, scheme: &ColorScheme) {
    if let Background::Gradient { colors } = &mut document.background {
        *colors = [
            scheme
                .primary
                .clone()
                .unwrap_or_else(|| DEFAULT_PRIMARY.to_string()),
            scheme
                .secondary
                .clone()
                .unwrap_or_else(|| DEFAULT_SECONDARY.to_string()),
        ];
    }
    document.color_scheme = Some(scheme.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TemplateCatalog;
    use crate::model::{Position, TextAlign};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn catalog() -> TemplateCatalog {
        TemplateCatalog::builtin()
    }

    fn design(value: serde_json::Value) -> Design {
        Design::from_value(value)
    }

    #[test]
    fn title_fields_fill_matching_elements_only() {
        let catalog = catalog();
        let template = catalog.get("template_002").unwrap();
        let doc = merge(
            template,
            &design(json!({"title": "Widget", "subtitle": "ignored", "description": "Best"})),
        )
        .unwrap();

        assert_eq!(doc.text("title"), Some("Widget"));
        assert_eq!(doc.text("description"), Some("Best"));
        assert!(doc.element("subtitle").is_none());
        assert_eq!(doc.elements.len(), template.elements.len());
    }

    #[test]
    fn override_beats_title_field() {
        let catalog = catalog();
        let doc = merge(
            catalog.get("template_001").unwrap(),
            &design(json!({"title": "A", "elements": [{"id": "title", "content": "B"}]})),
        )
        .unwrap();
        assert_eq!(doc.text("title"), Some("B"));
    }

    #[test]
    fn duplicate_overrides_last_one_wins() {
        let catalog = catalog();
        let doc = merge(
            catalog.get("template_001").unwrap(),
            &design(json!({"elements": [
                {"id": "subtitle", "content": "first"},
                {"id": "subtitle", "content": "second"}
            ]})),
        )
        .unwrap();
        assert_eq!(doc.text("subtitle"), Some("second"));
    }

    #[test]
    fn position_and_style_are_shallow_merged() {
        let catalog = catalog();
        let doc = merge(
            catalog.get("template_001").unwrap(),
            &design(json!({"elements": [{
                "id": "title",
                "position": {"y": 320},
                "style": {"color": "#FFD700", "letterSpacing": 4}
            }]})),
        )
        .unwrap();

        let title = doc.element("title").and_then(Element::as_text).unwrap();
        assert_eq!(title.position, Position::new(400.0, 320.0));
        assert_eq!(title.style.color.as_deref(), Some("#FFD700"));
        assert_eq!(title.style.font_size, Some(48.0));
        assert_eq!(title.style.text_align, Some(TextAlign::Center));
        assert_eq!(title.style.extra.get("letterSpacing"), Some(&json!(4)));
    }

    #[test]
    fn ids_are_preserved_and_unmatched_overrides_ignored() {
        let catalog = catalog();
        for template_id in catalog.ids() {
            let template = catalog.get(template_id).unwrap();
            let doc = merge(
                template,
                &design(json!({"elements": [
                    {"id": "ghost", "content": "boo"},
                    {"content": "no id"},
                    {"id": "title", "content": "kept"}
                ]})),
            )
            .unwrap();

            let before: Vec<_> = template.elements.iter().map(Element::id).collect();
            let after: Vec<_> = doc.elements.iter().map(Element::id).collect();
            assert_eq!(before, after);
        }
    }

    #[test]
    fn unmatched_override_is_a_no_op() {
        let catalog = catalog();
        let template = catalog.get("template_003").unwrap();
        let plain = merge(template, &Design::default()).unwrap();
        let ghost = merge(
            template,
            &design(json!({"elements": [{"id": "ghost", "content": "boo", "style": {"color": "#000000"}}]})),
        )
        .unwrap();
        assert_eq!(plain, ghost);
    }

    #[test]
    fn merge_is_deterministic() {
        let catalog = catalog();
        let template = catalog.get("template_001").unwrap();
        let d = design(json!({
            "title": "Launch",
            "color_scheme": {"primary": "#101010", "accent": "#FF0000"},
            "elements": [{"id": "description", "style": {"fontSize": 30}}]
        }));

        let a = serde_json::to_string(&merge(template, &d).unwrap()).unwrap();
        let b = serde_json::to_string(&merge(template, &d).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn color_scheme_replaces_gradient_stops_with_defaults() {
        let catalog = catalog();
        let doc = merge(
            catalog.get("template_003").unwrap(),
            &design(json!({"color_scheme": {"accent": "#00FF00"}})),
        )
        .unwrap();

        assert_eq!(
            doc.background,
            Background::Gradient {
                colors: [DEFAULT_PRIMARY.to_string(), DEFAULT_SECONDARY.to_string()]
            }
        );
        assert_eq!(
            doc.color_scheme.as_ref().and_then(|s| s.accent.as_deref()),
            Some("#00FF00")
        );
    }

    #[test]
    fn color_scheme_leaves_solid_background_alone() {
        let catalog = catalog();
        let doc = merge(
            catalog.get("template_002").unwrap(),
            &design(json!({"color_scheme": {"primary": "#000000", "secondary": "#111111"}})),
        )
        .unwrap();
        assert_eq!(doc.background, Background::Solid { color: "#F5F5F5".into() });
        assert!(doc.color_scheme.is_some());
    }

    #[test]
    fn missing_size_fails_fast() {
        let mut template = catalog().get("template_001").unwrap().clone();
        template.size = None;
        let err = merge(&template, &Design::default()).unwrap_err();
        assert!(matches!(err, MergeError::MissingSize { template } if template == "template_001"));
    }

    #[test]
    fn summer_sale_keeps_other_defaults() {
        let catalog = catalog();
        let d = design(json!({"title": "Summer Sale", "template_id": "template_001"}));
        let template = catalog.get_or_default(d.template_id.as_deref());
        let doc = merge(template, &d).unwrap();

        assert_eq!(doc.text("title"), Some("Summer Sale"));
        assert_eq!(doc.text("subtitle"), Some("副标题"));
        assert_eq!(doc.text("description"), Some("活动描述"));
    }
}
