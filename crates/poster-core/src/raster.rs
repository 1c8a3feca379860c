//! Raster renderer
//!
//! Paints a [`PosterDocument`] onto a tiny-skia canvas and encodes it as PNG
//! or JPEG. Elements are drawn strictly in document order, so later elements
//! cover earlier ones.

use std::io::Cursor;
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, RgbaImage};
use tiny_skia::{ColorU8, Pixmap, PixmapPaint, PremultipliedColorU8, Transform};

use crate::color::Rgb;
use crate::error::RenderError;
use crate::fonts::FontLibrary;
use crate::image_source::{load_image, ImageSource};
use crate::model::{Background, Element, ImageElement, PosterDocument, Size, TextAlign, TextElement};
use crate::text::{self, TextRun};

/// Largest accepted canvas side.
pub const MAX_CANVAS_SIDE: u32 = 8192;
pub const DEFAULT_FONT_SIZE: f32 = 24.0;
pub const DEFAULT_TEXT_COLOR: &str = "#000000";
pub const JPEG_QUALITY: u8 = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    Jpeg,
}

impl RasterFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpg",
        }
    }
}

pub struct RasterRenderer {
    fonts: Arc<FontLibrary>,
    images: Arc<dyn ImageSource>,
}

impl RasterRenderer {
    pub fn new(fonts: Arc<FontLibrary>, images: Arc<dyn ImageSource>) -> Self {
        Self { fonts, images }
    }

    pub fn fonts(&self) -> &FontLibrary {
        &self.fonts
    }

    /// Render `document` and encode it.
    ///
    /// Precondition failures (size, colors) return an error and no bytes;
    /// broken images are skipped.
    pub fn render(&self, document: &PosterDocument, format: RasterFormat) -> Result<Vec<u8>, RenderError> {
        let canvas = self.rasterize(document)?;
        match format {
            RasterFormat::Png => encode_png(&canvas),
            RasterFormat::Jpeg => encode_jpeg(&canvas),
        }
    }

    /// Paint `document` onto a fresh opaque canvas.
    pub fn rasterize(&self, document: &PosterDocument) -> Result<Pixmap, RenderError> {
        let size = validate_size(document.size)?;
        let mut canvas = Pixmap::new(size.width, size.height).ok_or(RenderError::PixmapAllocation)?;
        canvas.fill(tiny_skia::Color::WHITE);

        paint_background(&mut canvas, &document.background)?;

        for element in &document.elements {
            match element {
                Element::Text(text) => self.draw_text(&mut canvas, text)?,
                Element::Image(image) => self.draw_image(&mut canvas, image),
            }
        }

        Ok(canvas)
    }

    fn draw_text(&self, canvas: &mut Pixmap, element: &TextElement) -> Result<(), RenderError> {
        let content = element.resolved_content();
        if content.trim().is_empty() {
            return Ok(());
        }
        let color = Rgb::parse_for_render(element.style.color.as_deref().unwrap_or(DEFAULT_TEXT_COLOR))?;

        let font_size = element
            .style
            .font_size
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(DEFAULT_FONT_SIZE)
            .min(MAX_CANVAS_SIDE as f32);
        let face = self.fonts.face_for(content);
        let Some(run) = text::rasterize(&face, content, font_size) else {
            return Ok(());
        };

        let x = element.position.x;
        let left = match element.align() {
            TextAlign::Left => x,
            TextAlign::Center => x - run.width as f32 / 2.0,
            TextAlign::Right => x - run.width as f32,
        };
        let top = element.position.y - run.height as f32;

        tracing::trace!(
            element = %element.id,
            font = face.label(),
            width = run.width,
            height = run.height,
            "Drawing text"
        );

        let mask = tinted_mask(&run, color)?;
        canvas.draw_pixmap(
            left.round() as i32,
            top.round() as i32,
            mask.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(())
    }

    fn draw_image(&self, canvas: &mut Pixmap, element: &ImageElement) {
        let Some(url) = element.url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return;
        };

        let image = match load_image(self.images.as_ref(), url, element.target_size()) {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(element = %element.id, url = %url, error = %e, "Skipping image element");
                return;
            }
        };

        let Some(layer) = rgba_to_pixmap(&image) else {
            tracing::warn!(element = %element.id, "Skipping empty image element");
            return;
        };

        // Position is the image center.
        let left = (element.position.x - layer.width() as f32 / 2.0).round() as i32;
        let top = (element.position.y - layer.height() as f32 / 2.0).round() as i32;
        canvas.draw_pixmap(
            left,
            top,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}

fn validate_size(size: Option<Size>) -> Result<Size, RenderError> {
    let size = size.ok_or(RenderError::MissingSize)?;
    if size.is_empty() || size.width > MAX_CANVAS_SIDE || size.height > MAX_CANVAS_SIDE {
        return Err(RenderError::UnsupportedDimensions {
            width: size.width,
            height: size.height,
        });
    }
    Ok(size)
}

fn paint_background(canvas: &mut Pixmap, background: &Background) -> Result<(), RenderError> {
    match background {
        Background::Solid { color } => {
            let c = Rgb::parse_for_render(color)?;
            canvas.fill(tiny_skia::Color::from_rgba8(c.r, c.g, c.b, 255));
        }
        Background::Gradient { colors: [top, bottom] } => {
            let top = Rgb::parse_for_render(top)?;
            let bottom = Rgb::parse_for_render(bottom)?;
            paint_vertical_gradient(canvas, top, bottom);
        }
        Background::Unknown => {}
    }
    Ok(())
}

/// One interpolation per row; each row is then filled from the 1px ramp.
fn paint_vertical_gradient(canvas: &mut Pixmap, top: Rgb, bottom: Rgb) {
    let width = canvas.width() as usize;
    let last_row = canvas.height().saturating_sub(1).max(1) as f32;

    let ramp: Vec<PremultipliedColorU8> = (0..canvas.height())
        .map(|y| top.lerp(bottom, y as f32 / last_row).to_premultiplied())
        .collect();

    for (row, color) in canvas.pixels_mut().chunks_exact_mut(width).zip(ramp) {
        row.fill(color);
    }
}

/// Solid `color` with the run's coverage as alpha, premultiplied.
fn tinted_mask(run: &TextRun, color: Rgb) -> Result<Pixmap, RenderError> {
    let mut mask = Pixmap::new(run.width, run.height).ok_or(RenderError::PixmapAllocation)?;
    for (px, &coverage) in mask.pixels_mut().iter_mut().zip(&run.coverage) {
        let alpha = (coverage * 255.0).round() as u8;
        *px = ColorU8::from_rgba(color.r, color.g, color.b, alpha).premultiply();
    }
    Ok(mask)
}

fn rgba_to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

fn encode_png(canvas: &Pixmap) -> Result<Vec<u8>, RenderError> {
    let rgba: Vec<u8> = canvas
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, canvas.width(), canvas.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
        writer
            .write_image_data(&rgba)
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
    }
    let png_bytes = buf.into_inner();

    let mut options = oxipng::Options::from_preset(1);
    options.strip = oxipng::StripChunks::Safe;
    Ok(oxipng::optimize_from_memory(&png_bytes, &options).unwrap_or(png_bytes))
}

/// Flatten onto white and encode RGB; JPEG has no alpha channel.
fn encode_jpeg(canvas: &Pixmap) -> Result<Vec<u8>, RenderError> {
    let rgb = flatten_onto_white(canvas);
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
        .encode(&rgb, canvas.width(), canvas.height(), ExtendedColorType::Rgb8)
        .map_err(|e| RenderError::JpegEncode(e.to_string()))?;
    Ok(buf)
}

fn flatten_onto_white(canvas: &Pixmap) -> Vec<u8> {
    canvas
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            let a = c.alpha() as u16;
            let over = |v: u8| ((v as u16 * a + 255 * (255 - a)) / 255) as u8;
            [over(c.red()), over(c.green()), over(c.blue())]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TemplateCatalog;
    use crate::error::ImageError;
    use crate::image_source::tests::png_data_url;
    use crate::image_source::HttpImageSource;
    use crate::merge::merge;
    use crate::model::{Design, Position, Style};
    use serde_json::json;

    fn renderer() -> RasterRenderer {
        RasterRenderer::new(
            Arc::new(FontLibrary::builtin_only()),
            Arc::new(HttpImageSource::default()),
        )
    }

    fn pixel(canvas: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let c = canvas.pixel(x, y).unwrap().demultiply();
        [c.red(), c.green(), c.blue(), c.alpha()]
    }

    fn doc(value: serde_json::Value) -> PosterDocument {
        serde_json::from_value(value).unwrap()
    }

    fn image_element(id: &str, x: f32, y: f32, url: String, size: u32) -> Element {
        Element::Image(ImageElement {
            id: id.into(),
            position: Position::new(x, y),
            style: Style::default(),
            editable: false,
            url: Some(url),
            size: Some(Size::new(size, size)),
        })
    }

    #[test]
    fn gradient_endpoints_are_exact() {
        let canvas = renderer()
            .rasterize(&doc(json!({
                "size": {"width": 5, "height": 64},
                "background": {"type": "gradient", "colors": ["#000000", "#FFFFFF"]}
            })))
            .unwrap();

        for x in 0..5 {
            assert_eq!(pixel(&canvas, x, 0), [0, 0, 0, 255]);
            assert_eq!(pixel(&canvas, x, 63), [255, 255, 255, 255]);
        }
        // Monotonic down the ramp
        let column: Vec<u8> = (0..64).map(|y| pixel(&canvas, 2, y)[0]).collect();
        assert!(column.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn single_row_gradient_uses_top_stop() {
        let canvas = renderer()
            .rasterize(&doc(json!({
                "size": {"width": 3, "height": 1},
                "background": {"type": "gradient", "colors": ["#102030", "#FFFFFF"]}
            })))
            .unwrap();
        assert_eq!(pixel(&canvas, 1, 0), [0x10, 0x20, 0x30, 255]);
    }

    #[test]
    fn unknown_background_leaves_white_canvas() {
        let canvas = renderer()
            .rasterize(&doc(json!({
                "size": {"width": 4, "height": 4},
                "background": {"type": "noise"}
            })))
            .unwrap();
        assert_eq!(pixel(&canvas, 3, 3), [255, 255, 255, 255]);
    }

    #[test]
    fn later_elements_paint_over_earlier_ones() {
        let mut document = doc(json!({
            "size": {"width": 40, "height": 40},
            "background": {"type": "solid", "color": "#FFFFFF"}
        }));
        document.elements = vec![
            image_element("a", 15.0, 20.0, png_data_url(2, 2, [255, 0, 0, 255]), 20),
            image_element("b", 25.0, 20.0, png_data_url(2, 2, [0, 0, 255, 255]), 20),
        ];

        let canvas = renderer().rasterize(&document).unwrap();
        // a covers x 5..25, b covers x 15..35; the overlap belongs to b
        assert_eq!(pixel(&canvas, 8, 20), [255, 0, 0, 255]);
        assert_eq!(pixel(&canvas, 20, 20), [0, 0, 255, 255]);
        assert_eq!(pixel(&canvas, 30, 20), [0, 0, 255, 255]);

        document.elements.reverse();
        let canvas = renderer().rasterize(&document).unwrap();
        assert_eq!(pixel(&canvas, 20, 20), [255, 0, 0, 255]);
    }

    #[test]
    fn transparent_image_pixels_keep_background() {
        let mut document = doc(json!({
            "size": {"width": 10, "height": 10},
            "background": {"type": "solid", "color": "#00FF00"}
        }));
        document.elements = vec![image_element("ghost", 5.0, 5.0, png_data_url(4, 4, [255, 0, 0, 0]), 4)];

        let canvas = renderer().rasterize(&document).unwrap();
        assert_eq!(pixel(&canvas, 5, 5), [0, 255, 0, 255]);
    }

    struct FailingSource;

    impl ImageSource for FailingSource {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError> {
            Err(ImageError::Fetch(format!("unreachable: {url}")))
        }
    }

    #[test]
    fn broken_image_is_skipped() {
        let renderer = RasterRenderer::new(Arc::new(FontLibrary::builtin_only()), Arc::new(FailingSource));
        let catalog = TemplateCatalog::builtin();
        let mut document = merge(catalog.get("template_002").unwrap(), &Design::with_title("Widget")).unwrap();
        document
            .elements
            .insert(0, image_element("logo", 600.0, 400.0, "https://example.invalid/logo.png".into(), 100));

        let canvas = renderer.rasterize(&document).unwrap();
        assert_eq!(pixel(&canvas, 600, 400), [0xF5, 0xF5, 0xF5, 255]);
        // The title still rendered: some pixel near its anchor is darker than the background
        let inked = (150..200).any(|y| (500..700).any(|x| pixel(&canvas, x, y)[0] < 0xF5));
        assert!(inked);
    }

    #[test]
    fn unreachable_host_does_not_fail_render() {
        let mut document = doc(json!({
            "size": {"width": 8, "height": 8},
            "background": {"type": "solid", "color": "#123456"}
        }));
        document.elements = vec![image_element("x", 4.0, 4.0, "http://127.0.0.1:1/nope.png".into(), 4)];

        let bytes = renderer().render(&document, RasterFormat::Png).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(4, 4).0, [0x12, 0x34, 0x56, 255]);
    }

    #[test]
    fn text_alignment_moves_the_ink_box() {
        let draw = |align: &str| {
            let canvas = renderer()
                .rasterize(&doc(json!({
                    "size": {"width": 200, "height": 60},
                    "background": {"type": "solid", "color": "#FFFFFF"},
                    "elements": [{"type": "text", "id": "t", "position": {"x": 100, "y": 40},
                                  "style": {"fontSize": 24, "color": "#000000", "textAlign": align},
                                  "content": "HHHH"}]
                })))
                .unwrap();
            let inked: Vec<u32> = (0..200)
                .filter(|&x| (0..60).any(|y| pixel(&canvas, x, y)[0] < 128))
                .collect();
            (*inked.first().unwrap(), *inked.last().unwrap())
        };

        let (left_min, _) = draw("left");
        assert!(left_min >= 100);

        let (_, right_max) = draw("right");
        assert!(right_max < 100);

        let (center_min, center_max) = draw("center");
        assert!(center_min < 100 && center_max > 100);
    }

    #[test]
    fn text_bottom_sits_on_anchor() {
        let canvas = renderer()
            .rasterize(&doc(json!({
                "size": {"width": 100, "height": 100},
                "background": {"type": "solid", "color": "#FFFFFF"},
                "elements": [{"type": "text", "id": "t", "position": {"x": 10, "y": 50},
                              "style": {"fontSize": 24}, "content": "HH"}]
            })))
            .unwrap();
        let below = (50..100).any(|y| (0..100).any(|x| pixel(&canvas, x, y)[0] < 255));
        let above = (26..50).any(|y| (0..100).any(|x| pixel(&canvas, x, y)[0] < 255));
        assert!(above);
        assert!(!below);
    }

    #[test]
    fn huge_font_size_is_skipped_not_allocated() {
        let bytes = renderer()
            .render(
                &doc(json!({
                    "size": {"width": 100, "height": 100},
                    "background": {"type": "solid", "color": "#FFFFFF"},
                    "elements": [{"type": "text", "id": "t", "position": {"x": 10, "y": 50},
                                  "style": {"fontSize": 1.0e7}, "content": "HH"}]
                })),
                RasterFormat::Png,
            )
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(10, 40).0, [255, 255, 255, 255]);
    }

    #[test]
    fn empty_content_draws_nothing() {
        let canvas = renderer()
            .rasterize(&doc(json!({
                "size": {"width": 50, "height": 50},
                "background": {"type": "solid", "color": "#FFFFFF"},
                "elements": [{"type": "text", "id": "t", "position": {"x": 25, "y": 40},
                              "defaultContent": "ignored", "content": "   "}]
            })))
            .unwrap();
        assert!(canvas.pixels().iter().all(|p| p.demultiply().red() == 255));
    }

    #[test]
    fn invalid_colors_fail_the_render() {
        let bad_background = doc(json!({
            "size": {"width": 4, "height": 4},
            "background": {"type": "solid", "color": "blue"}
        }));
        assert!(matches!(
            renderer().render(&bad_background, RasterFormat::Png),
            Err(RenderError::InvalidColor { .. })
        ));

        let bad_text = doc(json!({
            "size": {"width": 4, "height": 4},
            "elements": [{"type": "text", "id": "t", "content": "x", "style": {"color": "#12"}}]
        }));
        assert!(matches!(
            renderer().render(&bad_text, RasterFormat::Jpeg),
            Err(RenderError::InvalidColor { .. })
        ));
    }

    #[test]
    fn size_preconditions() {
        assert!(matches!(
            renderer().render(&doc(json!({})), RasterFormat::Png),
            Err(RenderError::MissingSize)
        ));
        assert!(matches!(
            renderer().render(&doc(json!({"size": {"width": 0, "height": 10}})), RasterFormat::Png),
            Err(RenderError::UnsupportedDimensions { .. })
        ));
        assert!(matches!(
            renderer().render(&doc(json!({"size": {"width": 9000, "height": 10}})), RasterFormat::Png),
            Err(RenderError::UnsupportedDimensions { width: 9000, .. })
        ));
    }

    #[test]
    fn jpeg_has_no_alpha_channel() {
        let mut document = doc(json!({
            "size": {"width": 16, "height": 16},
            "background": {"type": "solid", "color": "#336699"}
        }));
        document.elements = vec![image_element("half", 8.0, 8.0, png_data_url(4, 4, [255, 0, 0, 128]), 8)];

        let bytes = renderer().render(&document, RasterFormat::Jpeg).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert!(!decoded.color().has_alpha());
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }

    #[test]
    fn flatten_composites_against_white() {
        let mut canvas = Pixmap::new(2, 1).unwrap();
        canvas.pixels_mut()[0] = ColorU8::from_rgba(0, 0, 0, 0).premultiply();
        canvas.pixels_mut()[1] = ColorU8::from_rgba(0, 0, 0, 255).premultiply();
        assert_eq!(flatten_onto_white(&canvas), vec![255, 255, 255, 0, 0, 0]);
    }

    #[test]
    fn summer_sale_end_to_end() {
        let catalog = TemplateCatalog::builtin();
        let design = Design::from_value(json!({"title": "Summer Sale", "template_id": "template_001"}));
        let document = merge(catalog.get_or_default(design.template_id.as_deref()), &design).unwrap();

        let bytes = renderer().render(&document, RasterFormat::Png).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (800, 1200));
        assert_eq!(decoded.get_pixel(0, 0).0, [74, 144, 226]);
        assert_eq!(decoded.get_pixel(799, 1199).0, [53, 122, 189]);
    }
}
