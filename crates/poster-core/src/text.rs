//! Text rasterization to coverage masks
//!
//! A [`TextRun`] is the ink of one line of text, cropped to its bounding
//! box. The raster renderer aligns it using the box size, then tints and
//! composites it.

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use spleen_font::{PSF2Font, FONT_12X24};

use crate::fonts::Face;

const BUILTIN_CELL_WIDTH: usize = 12;
const BUILTIN_CELL_HEIGHT: usize = 24;

/// Largest coverage buffer one run may allocate.
pub const MAX_RUN_PIXELS: usize = 4096 * 4096;

/// Anti-aliased coverage of one line of text, cropped to its ink box.
#[derive(Debug, Clone)]
pub struct TextRun {
    pub width: u32,
    pub height: u32,
    /// Row-major coverage, 0.0 = empty, 1.0 = full ink.
    pub coverage: Vec<f32>,
}

impl TextRun {
    /// `None` when the box is larger than [`MAX_RUN_PIXELS`].
    fn blank(width: usize, height: usize) -> Option<Self> {
        match width.checked_mul(height) {
            Some(len) if len <= MAX_RUN_PIXELS => Some(Self {
                width: width as u32,
                height: height as u32,
                coverage: vec![0.0; len],
            }),
            _ => {
                tracing::warn!(width, height, "Text run too large, skipping");
                None
            }
        }
    }

    fn add(&mut self, x: usize, y: usize, value: f32) {
        if x < self.width as usize && y < self.height as usize {
            let idx = y * self.width as usize + x;
            self.coverage[idx] = (self.coverage[idx] + value).min(1.0);
        }
    }
}

/// Rasterize `text` with `face` at `pixel_height`.
///
/// Returns `None` when the text produces no ink (whitespace, or glyphs
/// without outlines) or its ink box exceeds [`MAX_RUN_PIXELS`].
pub fn rasterize(face: &Face<'_>, text: &str, pixel_height: f32) -> Option<TextRun> {
    match face {
        Face::Outline { font, .. } => rasterize_outline(font, text, pixel_height),
        Face::Builtin => rasterize_builtin(text, pixel_height),
    }
}

fn rasterize_outline(font: &FontArc, text: &str, pixel_height: f32) -> Option<TextRun> {
    let scale = PxScale::from(pixel_height);
    let scaled = font.as_scaled(scale);

    let mut outlined = Vec::new();
    let mut caret_x = 0.0f32;
    let mut previous: Option<GlyphId> = None;

    for ch in text.chars().filter(|c| !c.is_control()) {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = previous {
            caret_x += scaled.kern(prev, glyph_id);
        }
        let glyph = glyph_id.with_scale_and_position(scale, point(caret_x, scaled.ascent()));
        caret_x += scaled.h_advance(glyph_id);
        previous = Some(glyph_id);

        if let Some(glyph) = font.outline_glyph(glyph) {
            outlined.push(glyph);
        }
    }

    // Union of the per-glyph pixel bounds is the ink box.
    let (min_x, min_y, max_x, max_y) = outlined.iter().fold(
        (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
        |(x0, y0, x1, y1), g| {
            let b = g.px_bounds();
            (x0.min(b.min.x), y0.min(b.min.y), x1.max(b.max.x), y1.max(b.max.y))
        },
    );
    if outlined.is_empty() || max_x <= min_x || max_y <= min_y {
        return None;
    }

    let mut run = TextRun::blank((max_x - min_x).ceil() as usize, (max_y - min_y).ceil() as usize)?;
    for glyph in &outlined {
        let bounds = glyph.px_bounds();
        let offset_x = (bounds.min.x - min_x) as usize;
        let offset_y = (bounds.min.y - min_y) as usize;
        glyph.draw(|x, y, c| run.add(offset_x + x as usize, offset_y + y as usize, c));
    }

    Some(run)
}

/// Spleen 12x24 cells scaled with nearest-neighbour to the requested height.
fn rasterize_builtin(text: &str, pixel_height: f32) -> Option<TextRun> {
    let mut font = match PSF2Font::new(FONT_12X24) {
        Ok(font) => font,
        Err(e) => {
            tracing::warn!(error = ?e, "Built-in font unavailable");
            return None;
        }
    };

    let chars: Vec<char> = text.chars().filter(|c| !c.is_control()).collect();
    if chars.iter().all(|c| c.is_whitespace()) {
        return None;
    }

    let scale = pixel_height / BUILTIN_CELL_HEIGHT as f32;
    let cell_w = ((BUILTIN_CELL_WIDTH as f32 * scale).round() as usize).max(1);
    let cell_h = ((BUILTIN_CELL_HEIGHT as f32 * scale).round() as usize).max(1);
    let mut run = TextRun::blank(cell_w.saturating_mul(chars.len()), cell_h)?;

    for (i, ch) in chars.iter().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        let mut cell = [[false; BUILTIN_CELL_WIDTH]; BUILTIN_CELL_HEIGHT];
        let utf8 = ch.to_string();
        match font.glyph_for_utf8(utf8.as_bytes()) {
            Some(glyph) => {
                for (row_y, row) in glyph.enumerate().take(BUILTIN_CELL_HEIGHT) {
                    for (col_x, on) in row.enumerate().take(BUILTIN_CELL_WIDTH) {
                        cell[row_y][col_x] = on;
                    }
                }
            }
            None => draw_box(&mut cell),
        }

        let origin = i * cell_w;
        for dy in 0..cell_h {
            for dx in 0..cell_w {
                let sx = dx * BUILTIN_CELL_WIDTH / cell_w;
                let sy = dy * BUILTIN_CELL_HEIGHT / cell_h;
                if cell[sy][sx] {
                    run.add(origin + dx, dy, 1.0);
                }
            }
        }
    }

    Some(run)
}

/// Hollow box for characters the bitmap face lacks (most CJK).
fn draw_box(cell: &mut [[bool; BUILTIN_CELL_WIDTH]; BUILTIN_CELL_HEIGHT]) {
    for (y, row) in cell.iter_mut().enumerate().take(BUILTIN_CELL_HEIGHT - 3).skip(4) {
        for (x, px) in row.iter_mut().enumerate().take(BUILTIN_CELL_WIDTH - 1).skip(1) {
            *px = y == 4 || y == BUILTIN_CELL_HEIGHT - 4 || x == 1 || x == BUILTIN_CELL_WIDTH - 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_run_scales_with_pixel_height() {
        let small = rasterize(&Face::Builtin, "Hi", 24.0).unwrap();
        assert_eq!((small.width, small.height), (24, 24));
        assert!(small.coverage.iter().any(|&c| c > 0.0));

        let large = rasterize(&Face::Builtin, "Hi", 48.0).unwrap();
        assert_eq!((large.width, large.height), (48, 48));
    }

    #[test]
    fn whitespace_has_no_ink() {
        assert!(rasterize(&Face::Builtin, "   ", 24.0).is_none());
        assert!(rasterize(&Face::Builtin, "", 24.0).is_none());
    }

    #[test]
    fn unknown_glyphs_draw_a_box() {
        let run = rasterize(&Face::Builtin, "海", 24.0).unwrap();
        let inked = run.coverage.iter().filter(|&&c| c > 0.0).count();
        assert!(inked > 20, "expected a visible box, got {inked} pixels");
    }

    #[test]
    fn oversized_runs_are_refused() {
        assert!(rasterize(&Face::Builtin, "HH", 1.0e7).is_none());
        assert!(TextRun::blank(usize::MAX, 2).is_none());
        assert!(TextRun::blank(64, 64).is_some());
    }

    #[test]
    fn coverage_is_clamped() {
        let mut run = TextRun::blank(2, 1).unwrap();
        run.add(0, 0, 0.8);
        run.add(0, 0, 0.8);
        run.add(5, 5, 1.0);
        assert_eq!(run.coverage, vec![1.0, 0.0]);
    }
}
