//! Plain and rich text on a raster surface.

use std::rc::Rc;
use std::sync::Arc;

use log::{debug, warn};

use crate::color::UiColor;
use crate::config::FillMode;
use crate::geometry::{UiPoint, UiRect, UiSize};
use crate::render::backend::{
    downcast_ref, BackendType, Bitmap, DrawStringParam, Font, MeasureStringParam, RenderCanvas, RenderShapes, RenderText,
};
use crate::render::rich_text::{
    layout_rich_text, DrawRichTextCache, PendingText, RichTextCacheHandle, RichTextData, RichTextEdit, RichTextLayout,
    RichTextMetrics,
};
use crate::render::types::{TextFormat, UiFont};
use crate::text::{layout_text, GlyphMask, TextLayout};

use super::blend::{blend_coverage, faded_alpha};
use super::font::RasterFont;
use super::render::RasterRender;

/// The descriptor behind a font object, if it is ours and initialized.
fn font_desc(font: &dyn Font) -> Option<Arc<UiFont>> {
    match downcast_ref::<RasterFont, _>(font, BackendType::Raster) {
        Ok(font) => {
            let desc = font.descriptor().cloned();
            if desc.is_none() {
                debug!("Font used before init_font");
            }
            desc
        }
        Err(e) => {
            warn!("Font rejected: {}", e);
            None
        }
    }
}

impl RasterRender {
    fn layout(&self, font: &UiFont, text: &str, format: TextFormat, max_width: Option<f32>) -> TextLayout {
        let mut backend = self.text.borrow_mut();
        layout_text(&mut *backend, font, text, format, max_width)
    }

    fn rich_layout(&self, rc: UiRect, scroll: UiSize, runs: &[RichTextData]) -> RichTextLayout {
        let mut backend = self.text.borrow_mut();
        let mut measure = |font: &UiFont, text: &str| {
            let (w, h) = layout_text(&mut *backend, font, text, TextFormat::SINGLELINE, None).size();
            UiSize::new(w, h)
        };
        layout_rich_text(rc, scroll, runs, &mut measure)
    }

    fn blend_glyph(&mut self, glyph: &GlyphMask, origin: UiPoint, color: UiColor, alpha: u8, clip: UiRect) {
        let rc = UiRect::from_xywh(origin.x + glyph.left, origin.y + glyph.top, glyph.width as i32, glyph.height as i32);
        let Some(area) = rc.intersect(&clip) else {
            return;
        };
        let stride = self.bitmap.width() as usize;
        let bits = self.bitmap.bits_mut();
        let mask_w = glyph.width as usize;
        for y in area.top..area.bottom {
            let mask_row = (y - rc.top) as usize * mask_w;
            for x in area.left..area.right {
                let coverage = glyph.coverage[mask_row + (x - rc.left) as usize];
                if coverage != 0 {
                    let p = &mut bits[y as usize * stride + x as usize];
                    *p = blend_coverage(color, *p, alpha, coverage);
                }
            }
        }
    }

    /// Lay out and paint `text` inside the logical `rect`.
    fn draw_text_in(&mut self, font: &UiFont, text: &str, rect: UiRect, format: TextFormat, color: UiColor, fade: u8) {
        let alpha = faded_alpha(color.a(), fade);
        if alpha == 0 {
            return;
        }
        let device_rect = self.to_device(rect);
        let clip = if format.contains(TextFormat::NOCLIP) {
            self.visible()
        } else {
            self.visible_part(device_rect)
        };
        let Some(clip) = clip else {
            return;
        };

        let layout = self.layout(font, text, format, Some(rect.width() as f32));
        let origins = layout.line_origins(device_rect, format);
        let ascent = layout.metrics.ascent.round() as i32;
        let descent = layout.metrics.descent.round() as i32;
        let thickness = (font.font_size / 12).max(1);
        let backend = Rc::clone(&self.text);

        for (line, (x, top)) in layout.lines.iter().zip(origins) {
            let baseline = top as i32 + ascent;
            let mut pen_x = x;
            for ch in line.text.chars() {
                let (advance, glyph) = {
                    let mut backend = backend.borrow_mut();
                    (backend.advance(font, ch), backend.glyph(font, ch))
                };
                if let Some(glyph) = glyph {
                    self.blend_glyph(&glyph, UiPoint::new(pen_x.round() as i32, baseline), color, alpha, clip);
                }
                pen_x += advance;
            }

            let (left, right) = (x.round() as i32, (x + line.width).round() as i32);
            let mut decorations = Vec::new();
            if font.underline {
                let y = baseline + (descent / 2).max(1);
                decorations.push(UiRect::new(left, y, right, y + thickness));
            }
            if font.strikeout {
                let y = baseline - ascent / 3;
                decorations.push(UiRect::new(left, y, right, y + thickness));
            }
            for rc in decorations {
                if let Some(rc) = rc.intersect(&clip) {
                    self.fill_device_rect(rc, color, fade, FillMode::SourceOver);
                }
            }
        }
    }

    /// Background then text for one rich-text piece placed at `rc`.
    fn draw_rich_piece(&mut self, piece: &PendingText, rc: UiRect, text_rect: UiRect, fade: u8) {
        let Some(visible) = rc.intersect(&text_rect) else {
            return;
        };
        if !piece.bg_color.is_empty() {
            self.fill_rect(visible, piece.bg_color, fade);
        }
        if !piece.text.is_empty() {
            let font = Arc::clone(&piece.font);
            self.draw_text_in(&font, &piece.text, rc, TextFormat::SINGLELINE, piece.text_color, fade);
        }
    }
}

impl RenderText for RasterRender {
    fn measure_string(&mut self, text: &str, param: &MeasureStringParam<'_>) -> UiRect {
        let Some(font) = font_desc(param.font) else {
            return UiRect::default();
        };
        if text.is_empty() {
            return UiRect::default();
        }
        let max_width = param.rect_size.filter(|&w| w > 0).map(|w| w as f32);
        let (w, h) = self.layout(&font, text, param.format, max_width).size();
        UiRect::new(0, 0, w, h)
    }

    fn draw_string(&mut self, text: &str, param: &DrawStringParam<'_>) {
        if text.is_empty() || param.text_rect.is_empty() {
            return;
        }
        let Some(font) = font_desc(param.font) else {
            return;
        };
        self.draw_text_in(&font, text, param.text_rect, param.format, param.color, param.fade);
    }

    fn measure_rich_text(&mut self, rc: UiRect, scroll: UiSize, runs: &[RichTextData]) -> Vec<Vec<UiRect>> {
        self.rich_layout(rc, scroll, runs).metrics.rects
    }

    fn measure_rich_text2(&mut self, rc: UiRect, scroll: UiSize, runs: &[RichTextData]) -> RichTextMetrics {
        self.rich_layout(rc, scroll, runs).metrics
    }

    fn measure_rich_text3(
        &mut self,
        rc: UiRect,
        scroll: UiSize,
        runs: &[RichTextData],
    ) -> (RichTextMetrics, Option<RichTextCacheHandle>) {
        let layout = self.rich_layout(rc, scroll, runs);
        let metrics = layout.metrics.clone();
        if runs.is_empty() || rc.is_empty() {
            return (metrics, None);
        }
        (metrics, Some(Arc::new(DrawRichTextCache::new(rc, scroll, runs, layout))))
    }

    fn draw_rich_text(&mut self, rc: UiRect, scroll: UiSize, runs: &[RichTextData], fade: u8) -> Vec<Vec<UiRect>> {
        let layout = self.rich_layout(rc, scroll, runs);
        let token = self.save_clip();
        self.set_clip(rc, true);
        for piece in &layout.pending {
            self.draw_rich_piece(piece, piece.rect, rc, fade);
        }
        self.restore_clip(token);
        layout.metrics.rects
    }

    fn create_draw_rich_text_cache(
        &mut self,
        rc: UiRect,
        scroll: UiSize,
        runs: &[RichTextData],
    ) -> Option<RichTextCacheHandle> {
        if runs.is_empty() || rc.is_empty() {
            return None;
        }
        let layout = self.rich_layout(rc, scroll, runs);
        Some(Arc::new(DrawRichTextCache::new(rc, scroll, runs, layout)))
    }

    fn is_valid_draw_rich_text_cache(&self, rc: UiRect, runs: &[RichTextData], cache: &RichTextCacheHandle) -> bool {
        cache.is_valid_for(rc, runs)
    }

    fn update_draw_rich_text_cache(
        &mut self,
        old: &mut RichTextCacheHandle,
        update: &RichTextCacheHandle,
        runs_new: &[RichTextData],
        edit: &RichTextEdit,
    ) -> bool {
        if update.pending.is_empty() {
            return false;
        }
        if !edit.has_line_hints() {
            *old = Arc::clone(update);
            return true;
        }
        Arc::make_mut(old).apply_edit(update, runs_new, edit)
    }

    fn is_draw_rich_text_cache_equal(&self, a: &RichTextCacheHandle, b: &RichTextCacheHandle) -> bool {
        Arc::ptr_eq(a, b)
    }

    fn draw_rich_text_cache_data(
        &mut self,
        cache: &RichTextCacheHandle,
        rc: UiRect,
        scroll: UiSize,
        row_x_offsets: &[i32],
        fade: u8,
    ) -> Vec<Vec<UiRect>> {
        let mut rects = vec![Vec::new(); cache.segments.len()];
        let token = self.save_clip();
        self.set_clip(rc, true);
        for (piece, placed) in cache.replay(rc, scroll, row_x_offsets) {
            if let Some(list) = rects.get_mut(piece.data_index) {
                list.push(placed);
            }
            self.draw_rich_piece(piece, placed, rc, fade);
        }
        self.restore_clip(token);
        rects
    }
}
