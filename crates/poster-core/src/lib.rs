//! poster-core: template merge and rendering for generated posters
//!
//! The pipeline is synchronous and side-effect free apart from fetching
//! remote images:
//!
//! ```
//! use std::sync::Arc;
//! use poster_core::{merge, Design, FontLibrary, HttpImageSource, RasterFormat, RasterRenderer, TemplateCatalog};
//!
//! let catalog = TemplateCatalog::builtin();
//! let design = Design::with_title("Summer Sale");
//! let document = merge(catalog.get_or_default(Some("template_001")), &design).unwrap();
//!
//! let renderer = RasterRenderer::new(
//!     Arc::new(FontLibrary::builtin_only()),
//!     Arc::new(HttpImageSource::default()),
//! );
//! let png = renderer.render(&document, RasterFormat::Png).unwrap();
//! assert_eq!(&png[1..4], b"PNG");
//! ```
//!
//! # Pieces
//!
//! - [`TemplateCatalog`]: the built-in layouts plus optional extras from disk
//! - [`merge`]: template + [`Design`] into a [`PosterDocument`]
//! - [`RasterRenderer`]: PNG/JPEG output via tiny-skia
//! - [`render_to_pdf`]: single-page PDF output (cargo feature `pdf`)
//! - [`ImageSource`]: how image elements get their pixels

pub mod catalog;
pub mod color;
pub mod error;
pub mod fonts;
pub mod image_source;
pub mod merge;
pub mod model;
pub mod pdf;
pub mod raster;
pub mod text;

pub use catalog::{TemplateCatalog, DEFAULT_TEMPLATE_ID};
pub use color::Rgb;
pub use error::{ImageError, MergeError, ParseColorError, RenderError};
pub use fonts::{default_font_sources, FontLibrary, FontSource};
pub use image_source::{load_image, HttpImageSource, ImageSource};
pub use merge::merge;
pub use model::{
    Background, ColorScheme, Design, Element, ElementOverride, ImageElement, Position,
    PositionPatch, PosterDocument, Size, Style, Template, TemplateSummary, TextAlign, TextElement,
};
pub use pdf::{pdf_supported, render_to_pdf};
pub use raster::{RasterFormat, RasterRenderer};
