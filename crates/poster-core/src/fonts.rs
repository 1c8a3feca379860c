//! Font candidate resolution
//!
//! Candidates are resolved once into a [`FontLibrary`]. At draw time the
//! library picks the first face covering every character of the text, then
//! the first loaded face, then the built-in Spleen bitmap face. Rendering
//! never fails for lack of fonts; CJK output needs a CJK face on the host.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, FontVec};

/// Where to look for one font face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    /// A font file on disk (`.ttf`, `.otf`, `.ttc`; collections use face 0).
    Path(PathBuf),
    /// A family name looked up in the system font database.
    Family(String),
}

impl FontSource {
    /// Strings that look like file paths become `Path`, anything else `Family`.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        let lower = value.to_ascii_lowercase();
        let is_path = value.contains('/')
            || value.contains('\\')
            || [".ttf", ".otf", ".ttc", ".otc"]
                .iter()
                .any(|ext| lower.ends_with(ext));
        if is_path {
            FontSource::Path(PathBuf::from(value))
        } else {
            FontSource::Family(value.to_string())
        }
    }
}

/// System font locations probed when no candidates are configured: CJK
/// capable faces first, then common Latin bold faces.
pub const DEFAULT_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Bold.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Bold.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Bold.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-zenhei.ttc",
    "C:/Windows/Fonts/msyh.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "C:/Windows/Fonts/arial.ttf",
    "Noto Sans CJK SC",
    "WenQuanYi Micro Hei",
    "DejaVu Sans",
];

pub fn default_font_sources() -> Vec<FontSource> {
    DEFAULT_FONT_CANDIDATES
        .iter()
        .map(|c| FontSource::parse(c))
        .collect()
}

struct LoadedFace {
    label: String,
    font: FontArc,
}

/// The face chosen for one run of text.
pub enum Face<'a> {
    Outline { label: &'a str, font: &'a FontArc },
    Builtin,
}

impl Face<'_> {
    pub fn label(&self) -> &str {
        match self {
            Face::Outline { label, .. } => label,
            Face::Builtin => "spleen-12x24",
        }
    }
}

#[derive(Default)]
pub struct FontLibrary {
    faces: Vec<LoadedFace>,
}

impl FontLibrary {
    /// A library with no outline faces; every run uses the bitmap face.
    pub fn builtin_only() -> Self {
        Self::default()
    }

    /// Load every candidate that can be found, in order.
    pub fn resolve(sources: &[FontSource]) -> Self {
        let mut system: Option<fontdb::Database> = None;
        let mut faces = Vec::new();

        for source in sources {
            let loaded = match source {
                FontSource::Path(path) => load_path(path),
                FontSource::Family(name) => {
                    let db = system.get_or_insert_with(|| {
                        let mut db = fontdb::Database::new();
                        db.load_system_fonts();
                        tracing::debug!(font_count = db.len(), "Loaded system font database");
                        db
                    });
                    load_family(db, name)
                }
            };

            match loaded {
                Some(face) => {
                    tracing::debug!(font = %face.label, "Loaded font candidate");
                    faces.push(face);
                }
                None => tracing::debug!(source = ?source, "Font candidate not available"),
            }
        }

        tracing::info!(
            fonts = faces.len(),
            primary = faces.first().map(|f| f.label.as_str()).unwrap_or("builtin"),
            "Font library resolved"
        );

        Self { faces }
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Labels of the loaded outline faces, in priority order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.faces.iter().map(|f| f.label.as_str())
    }

    /// First face with a glyph for every visible character of `text`.
    pub fn face_for(&self, text: &str) -> Face<'_> {
        let covering = self.faces.iter().find(|f| covers(&f.font, text));
        match covering.or(self.faces.first()) {
            Some(face) => Face::Outline {
                label: &face.label,
                font: &face.font,
            },
            None => Face::Builtin,
        }
    }
}

fn covers(font: &FontArc, text: &str) -> bool {
    text.chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .all(|c| font.glyph_id(c).0 != 0)
}

fn load_path(path: &Path) -> Option<LoadedFace> {
    let data = std::fs::read(path).ok()?;
    let font = match FontVec::try_from_vec_and_index(data, 0) {
        Ok(font) => font,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Unreadable font file");
            return None;
        }
    };
    Some(LoadedFace {
        label: path.display().to_string(),
        font: FontArc::new(font),
    })
}

fn load_family(db: &fontdb::Database, name: &str) -> Option<LoadedFace> {
    let families = [fontdb::Family::Name(name)];
    let query = fontdb::Query {
        families: &families,
        weight: fontdb::Weight::BOLD,
        ..Default::default()
    };
    let id = db.query(&query)?;
    let font = db
        .with_face_data(id, |data, index| {
            FontVec::try_from_vec_and_index(data.to_vec(), index).ok()
        })
        .flatten()?;
    Some(LoadedFace {
        label: name.to_string(),
        font: FontArc::new(font),
    })
}
