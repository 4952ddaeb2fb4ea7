use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::render::types::UiFont;

/// Vertical metrics of a font at a given size, in pixels. `descent` is positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_height: f32,
}

/// An 8-bit coverage bitmap for one glyph.
///
/// `left`/`top` place the mask relative to the pen position on the baseline;
/// `top` is negative for glyphs that rise above the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphMask {
    pub width: u32,
    pub height: u32,
    pub left: i32,
    pub top: i32,
    pub coverage: Vec<u8>,
}

/// Glyph source behind `measure_string`/`draw_string` and rich text.
pub trait TextBackend {
    fn line_metrics(&mut self, font: &UiFont) -> LineMetrics;
    fn advance(&mut self, font: &UiFont, ch: char) -> f32;
    /// Coverage mask for `ch`, `None` for blank glyphs.
    fn glyph(&mut self, font: &UiFont, ch: char) -> Option<Arc<GlyphMask>>;
}

/// Text backend shared between a factory and the surfaces it creates.
pub type SharedTextBackend = Rc<RefCell<dyn TextBackend>>;

pub fn shared(backend: impl TextBackend + 'static) -> SharedTextBackend {
    Rc::new(RefCell::new(backend))
}

/// Deterministic metrics without any font files: every visible character is a
/// solid box half as wide as the font size.
#[derive(Debug, Default, Clone)]
pub struct FixedMetricsTextBackend;

impl FixedMetricsTextBackend {
    pub fn new() -> Self {
        Self
    }

    fn size(font: &UiFont) -> f32 {
        font.font_size.max(1) as f32
    }

    fn cell_width(font: &UiFont) -> f32 {
        let w = (Self::size(font) / 2.0).ceil().max(1.0);
        if font.bold {
            w + 1.0
        } else {
            w
        }
    }
}

impl TextBackend for FixedMetricsTextBackend {
    fn line_metrics(&mut self, font: &UiFont) -> LineMetrics {
        let size = Self::size(font);
        let ascent = (size * 0.8).round();
        LineMetrics {
            ascent,
            descent: size - ascent,
            line_height: size,
        }
    }

    fn advance(&mut self, font: &UiFont, ch: char) -> f32 {
        match ch {
            '\r' | '\n' => 0.0,
            '\t' => Self::cell_width(font) * 4.0,
            _ => Self::cell_width(font),
        }
    }

    fn glyph(&mut self, font: &UiFont, ch: char) -> Option<Arc<GlyphMask>> {
        if ch.is_whitespace() || ch.is_control() {
            return None;
        }
        let ascent = self.line_metrics(font).ascent as i32;
        let width = (Self::cell_width(font) as i32 - 2).max(1) as u32;
        let height = (ascent - 1).max(1) as u32;
        Some(Arc::new(GlyphMask {
            width,
            height,
            left: 1,
            top: -(height as i32),
            coverage: vec![255; (width * height) as usize],
        }))
    }
}
