//! Layout data model shared by templates, designs and poster documents

mod design;
mod element;
mod lenient;
mod poster;
mod template;

pub use design::{ColorScheme, Design, ElementOverride, PositionPatch};
pub use element::{
    Background, Element, ImageElement, Position, Size, Style, TextAlign, TextElement,
};
pub use poster::PosterDocument;
pub use template::{Template, TemplateSummary};
