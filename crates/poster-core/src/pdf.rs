//! Vector renderer
//!
//! Writes a one-page PDF whose media box equals the poster size. Solid
//! backgrounds and text are drawn; gradients and images are not supported
//! in this path. PDF space has its origin bottom-left, so every y is
//! flipped as `height - y`.

use crate::error::RenderError;
use crate::model::PosterDocument;

/// PostScript name of the fixed face used for all text.
pub const PDF_FONT: &str = "Helvetica-Bold";

#[cfg(feature = "pdf")]
pub fn render_to_pdf(document: &PosterDocument) -> Result<Vec<u8>, RenderError> {
    use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str};

    use crate::color::Rgb;
    use crate::model::{Background, Element};
    use crate::raster::{DEFAULT_FONT_SIZE, DEFAULT_TEXT_COLOR, MAX_CANVAS_SIDE};

    let size = document.size.ok_or(RenderError::MissingSize)?;
    if size.is_empty() || size.width > MAX_CANVAS_SIDE || size.height > MAX_CANVAS_SIDE {
        return Err(RenderError::UnsupportedDimensions {
            width: size.width,
            height: size.height,
        });
    }
    let (width, height) = (size.width as f32, size.height as f32);

    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let font_id = Ref::new(4);
    let content_id = Ref::new(5);
    let font_name = Name(b"F1");

    let mut content = Content::new();

    match &document.background {
        Background::Solid { color } => {
            let c = Rgb::parse_for_render(color)?;
            content.set_fill_rgb(unit(c.r), unit(c.g), unit(c.b));
            content.rect(0.0, 0.0, width, height);
            content.fill_nonzero();
        }
        Background::Gradient { .. } | Background::Unknown => {}
    }

    for element in &document.elements {
        let Element::Text(text) = element else {
            continue;
        };
        let body = text.resolved_content();
        if body.trim().is_empty() {
            continue;
        }

        let c = Rgb::parse_for_render(text.style.color.as_deref().unwrap_or(DEFAULT_TEXT_COLOR))?;
        let font_size = text
            .style
            .font_size
            .filter(|s| *s > 0.0)
            .unwrap_or(DEFAULT_FONT_SIZE);

        content.set_fill_rgb(unit(c.r), unit(c.g), unit(c.b));
        content.begin_text();
        content.set_font(font_name, font_size);
        content.next_line(text.position.x, height - text.position.y);
        content.show(Str(&win_ansi(body)));
        content.end_text();
    }

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, width, height));
    page.parent(page_tree_id);
    page.contents(content_id);
    page.resources().fonts().pair(font_name, font_id);
    page.finish();

    pdf.type1_font(font_id)
        .base_font(Name(PDF_FONT.as_bytes()))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    let stream = content.finish();
    pdf.stream(content_id, &stream);

    tracing::debug!(width = size.width, height = size.height, "Rendered PDF");
    Ok(pdf.finish())
}

/// Built without PDF support: reported as its own error, never downgraded.
#[cfg(not(feature = "pdf"))]
pub fn render_to_pdf(_document: &PosterDocument) -> Result<Vec<u8>, RenderError> {
    Err(RenderError::PdfUnsupported)
}

/// Whether this build can produce PDF output.
pub const fn pdf_supported() -> bool {
    cfg!(feature = "pdf")
}

#[cfg(feature = "pdf")]
fn unit(channel: u8) -> f32 {
    channel as f32 / 255.0
}

/// Encode for the standard 14 fonts. WinAnsi agrees with Latin-1 for the
/// printable ranges; anything else becomes `?`.
#[cfg(feature = "pdf")]
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}
