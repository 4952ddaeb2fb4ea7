//! Installed system fonts.
//!
//! Faces are resolved by [`FontManager`] and memoized in a [`FontCache`]. Metrics,
//! advances and outlines come from skrifa; outlines are flattened and filled by the
//! raster backend's scanline filler. Bold and italic are synthesized.

use std::collections::HashSet;
use std::sync::Arc;

use hashbrown::HashMap;
use log::{debug, warn};
use parley::Font;
use skrifa::instance::Size;
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::MetadataProvider;

use crate::config::RenderConfig;
use crate::geometry::{UiPointF, UiRect};
use crate::render::backends::raster::outline::{flatten_cubic, flatten_quad};
use crate::render::backends::raster::scan::{rasterize, Contour};
use crate::render::types::{FillType, UiFont};

use super::backend::{FixedMetricsTextBackend, GlyphMask, LineMetrics, TextBackend};
use super::font_cache::FontCache;
use super::font_manager::FontManager;

const ITALIC_SHEAR: f32 = 0.2;
const GLYPH_CLIP: UiRect = UiRect::new(-4096, -4096, 4096, 4096);

#[derive(Clone, PartialEq, Eq, Hash)]
struct GlyphKey {
    family: String,
    size: i32,
    bold: bool,
    italic: bool,
    ch: char,
}

impl GlyphKey {
    fn new(font: &UiFont, ch: char) -> Self {
        Self {
            family: font.font_name.clone(),
            size: font.font_size,
            bold: font.bold,
            italic: font.italic,
            ch,
        }
    }
}

pub struct SystemTextBackend {
    fonts: FontManager,
    cache: FontCache,
    fallback_family: String,
    unresolved: HashSet<String>,
    glyphs: HashMap<GlyphKey, Option<Arc<GlyphMask>>>,
    glyph_capacity: usize,
    fixed: FixedMetricsTextBackend,
}

impl SystemTextBackend {
    pub fn new(fallback_family: impl Into<String>, glyph_capacity: usize) -> Self {
        Self {
            fonts: FontManager::new(),
            cache: FontCache::new(),
            fallback_family: fallback_family.into(),
            unresolved: HashSet::new(),
            glyphs: HashMap::new(),
            glyph_capacity: glyph_capacity.max(1),
            fixed: FixedMetricsTextBackend::new(),
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.default_font_family.clone(), config.glyph_cache_capacity)
    }

    /// The face for `name`; `None` once resolution has failed for it.
    fn face(&mut self, name: &str) -> Option<Font> {
        if let Some((font, _)) = self.cache.fetch(name) {
            return Some(font.clone());
        }
        if self.unresolved.contains(name) {
            return None;
        }
        match self.fonts.resolve(name, &self.fallback_family) {
            Ok((font, resolved)) => {
                self.cache.insert(name, &resolved, font.clone());
                Some(font)
            }
            Err(e) => {
                warn!("Font '{}' unavailable, falling back to fixed metrics: {}", name, e);
                self.unresolved.insert(name.to_string());
                None
            }
        }
    }
}

fn to_font_ref(font: &Font) -> Option<skrifa::raw::FontRef<'_>> {
    use skrifa::raw::FileRef;
    let file_ref = FileRef::new(font.data.as_ref()).ok()?;
    match file_ref {
        FileRef::Font(font) => Some(font),
        FileRef::Collection(collection) => collection.get(font.index).ok(),
    }
}

fn size_of(font: &UiFont) -> Size {
    Size::new(font.font_size.max(1) as f32)
}

impl TextBackend for SystemTextBackend {
    fn line_metrics(&mut self, font: &UiFont) -> LineMetrics {
        let Some(face) = self.face(&font.font_name) else {
            return self.fixed.line_metrics(font);
        };
        let Some(font_ref) = to_font_ref(&face) else {
            return self.fixed.line_metrics(font);
        };
        let var_loc = font_ref.axes().location(std::iter::empty::<(&str, f32)>());
        let metrics = font_ref.metrics(size_of(font), &var_loc);
        LineMetrics {
            ascent: metrics.ascent,
            descent: -metrics.descent,
            line_height: (metrics.ascent - metrics.descent + metrics.leading).max(1.0),
        }
    }

    fn advance(&mut self, font: &UiFont, ch: char) -> f32 {
        if ch == '\n' || ch == '\r' {
            return 0.0;
        }
        let Some(face) = self.face(&font.font_name) else {
            return self.fixed.advance(font, ch);
        };
        let Some(font_ref) = to_font_ref(&face) else {
            return self.fixed.advance(font, ch);
        };
        let var_loc = font_ref.axes().location(std::iter::empty::<(&str, f32)>());
        let gid = font_ref.charmap().map(ch).unwrap_or_default();
        let advance = font_ref
            .glyph_metrics(size_of(font), &var_loc)
            .advance_width(gid)
            .unwrap_or_default();
        if font.bold {
            advance + 1.0
        } else {
            advance
        }
    }

    fn glyph(&mut self, font: &UiFont, ch: char) -> Option<Arc<GlyphMask>> {
        if ch.is_whitespace() || ch.is_control() {
            return None;
        }
        let key = GlyphKey::new(font, ch);
        if let Some(hit) = self.glyphs.get(&key) {
            return hit.clone();
        }
        let mask = match self.face(&font.font_name) {
            Some(face) => rasterize_glyph(&face, font, ch).map(Arc::new),
            None => self.fixed.glyph(font, ch),
        };
        if self.glyphs.len() >= self.glyph_capacity {
            debug!("Glyph cache full ({} masks), clearing", self.glyphs.len());
            self.glyphs.clear();
        }
        self.glyphs.insert(key, mask.clone());
        mask
    }
}

fn rasterize_glyph(face: &Font, font: &UiFont, ch: char) -> Option<GlyphMask> {
    let font_ref = to_font_ref(face)?;
    let gid = font_ref.charmap().map(ch).unwrap_or_default();
    let glyph = font_ref.outline_glyphs().get(gid)?;
    let var_loc = font_ref.axes().location(std::iter::empty::<(&str, f32)>());

    let mut pen = ContourPen::new(if font.italic { ITALIC_SHEAR } else { 0.0 });
    glyph
        .draw(DrawSettings::unhinted(size_of(font), &var_loc), &mut pen)
        .ok()?;
    let mask = rasterize(&pen.finish(), FillType::Winding, GLYPH_CLIP)?;
    let glyph = GlyphMask {
        width: mask.rect.width() as u32,
        height: mask.rect.height() as u32,
        left: mask.rect.left,
        top: mask.rect.top,
        coverage: mask.data,
    };
    Some(if font.bold { embolden(&glyph) } else { glyph })
}

/// Collects outline contours in device orientation (y down), applying a shear.
struct ContourPen {
    shear: f32,
    contours: Vec<Contour>,
    current: Contour,
}

impl ContourPen {
    fn new(shear: f32) -> Self {
        Self {
            shear,
            contours: Vec::new(),
            current: Vec::new(),
        }
    }

    fn map(&self, x: f32, y: f32) -> UiPointF {
        UiPointF::new(x + self.shear * y, -y)
    }

    fn last(&self) -> UiPointF {
        self.current.last().copied().unwrap_or_default()
    }

    fn flush(&mut self) {
        let contour = std::mem::take(&mut self.current);
        if contour.len() >= 3 {
            self.contours.push(contour);
        }
    }

    fn finish(mut self) -> Vec<Contour> {
        self.flush();
        self.contours
    }
}

impl OutlinePen for ContourPen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.flush();
        let p = self.map(x, y);
        self.current.push(p);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.map(x, y);
        self.current.push(p);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        let (p0, c, p) = (self.last(), self.map(cx0, cy0), self.map(x, y));
        flatten_quad(p0, c, p, &mut self.current);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        let (p0, c0, c1, p) = (self.last(), self.map(cx0, cy0), self.map(cx1, cy1), self.map(x, y));
        flatten_cubic(p0, c0, c1, p, &mut self.current);
    }

    fn close(&mut self) {
        self.flush();
    }
}

/// Widen every stroke of a mask by one pixel to the right.
fn embolden(glyph: &GlyphMask) -> GlyphMask {
    let (w, h) = (glyph.width as usize, glyph.height as usize);
    let out_w = w + 1;
    let mut coverage = vec![0u8; out_w * h];
    for y in 0..h {
        let src = &glyph.coverage[y * w..(y + 1) * w];
        for x in 0..out_w {
            let here = src.get(x).copied().unwrap_or(0);
            let left = if x > 0 { src[x - 1] } else { 0 };
            coverage[y * out_w + x] = here.max(left);
        }
    }
    GlyphMask {
        width: out_w as u32,
        coverage,
        ..glyph.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pen_flips_y_and_splits_contours() {
        let mut pen = ContourPen::new(0.0);
        pen.move_to(0.0, 0.0);
        pen.line_to(4.0, 0.0);
        pen.line_to(4.0, 6.0);
        pen.close();
        pen.move_to(10.0, 0.0);
        pen.line_to(11.0, 0.0);
        pen.close();
        let contours = pen.finish();
        // The two-point contour is dropped.
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0][2], UiPointF::new(4.0, -6.0));
    }

    #[test]
    fn italic_shear_leans_right() {
        let pen = ContourPen::new(ITALIC_SHEAR);
        assert_eq!(pen.map(0.0, 10.0), UiPointF::new(2.0, -10.0));
        assert_eq!(pen.map(3.0, 0.0), UiPointF::new(3.0, 0.0));
    }

    #[test]
    fn curves_are_flattened() {
        let mut pen = ContourPen::new(0.0);
        pen.move_to(0.0, 0.0);
        pen.quad_to(5.0, 10.0, 10.0, 0.0);
        pen.curve_to(10.0, -5.0, 0.0, -5.0, 0.0, 0.0);
        let contours = pen.finish();
        assert!(contours[0].len() > 4);
        assert_eq!(*contours[0].last().unwrap(), UiPointF::new(0.0, 0.0));
    }

    #[test]
    fn embolden_widens_by_one_column() {
        let glyph = GlyphMask {
            width: 2,
            height: 1,
            left: 0,
            top: -1,
            coverage: vec![255, 0],
        };
        let bold = embolden(&glyph);
        assert_eq!(bold.width, 3);
        assert_eq!(bold.coverage, vec![255, 255, 0]);
        assert_eq!(bold.top, -1);
    }
}
