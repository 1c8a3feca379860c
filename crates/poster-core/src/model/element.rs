use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::lenient;

/// Canvas or image box dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    #[serde(deserialize_with = "lenient::dimension")]
    pub width: u32,
    #[serde(deserialize_with = "lenient::dimension")]
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Anchor point of an element. What it anchors depends on the element kind
/// and text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub x: f32,
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }

    /// Unknown alignments fall back to left.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "center" | "centre" | "middle" => TextAlign::Center,
            "right" | "end" => TextAlign::Right,
            _ => TextAlign::Left,
        }
    }
}

impl Serialize for TextAlign {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TextAlign {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => TextAlign::parse(&s),
            _ => TextAlign::Left,
        })
    }
}

/// Formatting bag attached to every element.
///
/// Known keys are typed; anything else round-trips through `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub font_size: Option<f32>,
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub font_weight: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub font_family: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::object",
        skip_serializing_if = "Option::is_none"
    )]
    pub size: Option<Size>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Style {
    /// Shallow merge: every key present in `patch` replaces the same key here.
    pub fn merge_from(&mut self, patch: &Style) {
        if patch.font_size.is_some() {
            self.font_size = patch.font_size;
        }
        if patch.font_weight.is_some() {
            self.font_weight.clone_from(&patch.font_weight);
        }
        if patch.color.is_some() {
            self.color.clone_from(&patch.color);
        }
        if patch.text_align.is_some() {
            self.text_align = patch.text_align;
        }
        if patch.font_family.is_some() {
            self.font_family.clone_from(&patch.font_family);
        }
        if patch.size.is_some() {
            self.size = patch.size;
        }
        for (key, value) in &patch.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight
            .as_deref()
            .is_some_and(|w| w.eq_ignore_ascii_case("bold") || w.parse::<u16>().is_ok_and(|n| n >= 600))
    }
}

fn white() -> String {
    "#FFFFFF".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Background {
    Solid {
        #[serde(default = "white")]
        color: String,
    },
    /// Vertical two-stop gradient, `[top, bottom]`.
    Gradient { colors: [String; 2] },
    /// Any other `type`; leaves the canvas white.
    #[serde(other)]
    Unknown,
}

impl Default for Background {
    fn default() -> Self {
        Background::Solid { color: white() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub id: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub style: Style,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub editable: bool,
    #[serde(
        rename = "defaultContent",
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_content: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<String>,
}

impl TextElement {
    /// `content` when set, otherwise the catalog default.
    pub fn resolved_content(&self) -> &str {
        self.content
            .as_deref()
            .or(self.default_content.as_deref())
            .unwrap_or("")
    }

    pub fn align(&self) -> TextAlign {
        self.style.text_align.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub id: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub style: Style,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub editable: bool,
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::object",
        skip_serializing_if = "Option::is_none"
    )]
    pub size: Option<Size>,
}

impl ImageElement {
    /// Element-level `size` wins over `style.size`.
    pub fn target_size(&self) -> Option<Size> {
        self.size.or(self.style.size).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Text(TextElement),
    Image(ImageElement),
}

impl Element {
    pub fn id(&self) -> &str {
        match self {
            Element::Text(e) => &e.id,
            Element::Image(e) => &e.id,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Element::Text(e) => e.position,
            Element::Image(e) => e.position,
        }
    }

    pub fn position_mut(&mut self) -> &mut Position {
        match self {
            Element::Text(e) => &mut e.position,
            Element::Image(e) => &mut e.position,
        }
    }

    pub fn style_mut(&mut self) -> &mut Style {
        match self {
            Element::Text(e) => &mut e.style,
            Element::Image(e) => &mut e.style,
        }
    }

    pub fn as_text(&self) -> Option<&TextElement> {
        match self {
            Element::Text(e) => Some(e),
            Element::Image(_) => None,
        }
    }
}
