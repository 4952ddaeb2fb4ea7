use std::any::Any;
use std::sync::Arc;

use log::{debug, trace};

use crate::alpha;
use crate::color::UiColor;
use crate::config::{FillMode, RenderConfig};
use crate::errors::{RenderError, Result};
use crate::geometry::{UiPadding, UiPoint, UiPointF, UiRect};
use crate::render::backend::{BackendType, Bitmap, Render, RenderCanvas, RenderObject};
use crate::render::native::NativeWindow;
use crate::render::types::{BitmapAlphaType, RenderClipType};
use crate::text::SharedTextBackend;

use super::bitmap::RasterBitmap;
use super::blend::{blend_coverage, blend_with_alpha, faded_alpha};
use super::scan::CoverageMask;

/// Software render surface.
///
/// Every coordinate passed in is logical; the window origin is added to get device
/// pixels. The clip is kept in device pixels.
pub struct RasterRender {
    pub(super) bitmap: RasterBitmap,
    pub(super) origin: UiPoint,
    /// `None` means unclipped; an empty rect means nothing is visible.
    pub(super) clip: Option<UiRect>,
    pub(super) clip_stack: Vec<Option<UiRect>>,
    pub(super) config: Arc<RenderConfig>,
    pub(super) text: SharedTextBackend,
    pub(super) window: Option<Box<dyn NativeWindow>>,
    /// Scratch pixels handed out by the render DC, created on first use.
    pub(super) dib: Option<Vec<u32>>,
}

impl RasterRender {
    pub fn new(config: Arc<RenderConfig>, text: SharedTextBackend, window: Option<Box<dyn NativeWindow>>) -> Self {
        Self {
            bitmap: RasterBitmap::new(),
            origin: UiPoint::default(),
            clip: None,
            clip_stack: Vec::new(),
            config,
            text,
            window,
            dib: None,
        }
    }

    pub fn bitmap(&self) -> &RasterBitmap {
        &self.bitmap
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub(super) fn to_device(&self, rc: UiRect) -> UiRect {
        rc.offset_point(self.origin)
    }

    pub(super) fn to_device_f(&self, pt: UiPointF) -> UiPointF {
        pt.offset(self.origin.x as f32, self.origin.y as f32)
    }

    /// Device pixels that drawing may touch.
    pub(super) fn visible(&self) -> Option<UiRect> {
        let bounds = self.bitmap.bounds();
        match self.clip {
            Some(clip) => bounds.intersect(&clip),
            None => bounds.intersect(&bounds),
        }
    }

    /// The drawable part of a device rect.
    pub(super) fn visible_part(&self, rc: UiRect) -> Option<UiRect> {
        self.visible()?.intersect(&rc)
    }

    pub(super) fn fill_device_rect(&mut self, rc: UiRect, color: UiColor, fade: u8, mode: FillMode) {
        let Some(rc) = self.visible_part(rc) else {
            trace!("fill skipped, {:?} is not visible", rc);
            return;
        };
        let alpha = faded_alpha(color.a(), fade);
        let stride = self.bitmap.width() as usize;
        let bits = self.bitmap.bits_mut();
        for y in rc.top..rc.bottom {
            let row = &mut bits[y as usize * stride + rc.left as usize..y as usize * stride + rc.right as usize];
            match mode {
                FillMode::Source => row.fill(color.with_alpha(alpha).argb()),
                FillMode::SourceOver => {
                    for p in row.iter_mut() {
                        *p = blend_with_alpha(color.argb(), *p, alpha as u32);
                    }
                }
            }
        }
    }

    /// Composite a coverage mask (device coordinates) in a solid color.
    pub(super) fn blend_mask(&mut self, mask: &CoverageMask, color: UiColor, fade: u8) {
        let alpha = faded_alpha(color.a(), fade);
        if alpha == 0 {
            return;
        }
        self.blend_mask_with(mask, |_, _| (color, alpha));
    }

    /// Composite a mask with a per-pixel color and alpha.
    pub(super) fn blend_mask_with(&mut self, mask: &CoverageMask, mut shade: impl FnMut(i32, i32) -> (UiColor, u8)) {
        let Some(visible) = self.visible_part(mask.rect) else {
            return;
        };
        let stride = self.bitmap.width() as usize;
        let bits = self.bitmap.bits_mut();
        mask.for_each(|x, y, coverage| {
            if !visible.contains(UiPoint::new(x, y)) {
                return;
            }
            let (color, alpha) = shade(x, y);
            let p = &mut bits[y as usize * stride + x as usize];
            *p = blend_coverage(color, *p, alpha, coverage);
        });
    }

    /// Byte offsets and row length of a device rect inside the surface.
    fn checked_device_rect(&self, rc: UiRect, len: usize) -> Result<UiRect> {
        if self.bitmap.is_empty() {
            return Err(RenderError::EmptySurface);
        }
        if rc.is_empty() {
            return Err(RenderError::EmptyRect);
        }
        let needed = rc.width() as usize * rc.height() as usize * 4;
        if len < needed {
            return Err(RenderError::BufferTooSmall { needed, actual: len });
        }
        let dev = self.to_device(rc);
        if !self.bitmap.bounds().contains_rect(&dev) {
            return Err(RenderError::OutOfBounds(rc));
        }
        Ok(dev)
    }
}

impl RenderObject for RasterRender {
    fn backend_type(&self) -> BackendType {
        BackendType::Raster
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl RenderCanvas for RasterRender {
    fn width(&self) -> u32 {
        self.bitmap.width()
    }

    fn height(&self) -> u32 {
        self.bitmap.height()
    }

    fn resize(&mut self, width: i32, height: i32) -> Result<()> {
        if width <= 0 || height <= 0 {
            debug!("Refusing to resize surface to {}x{}", width, height);
            return Err(RenderError::InvalidSize {
                width: width as i64,
                height: height as i64,
            });
        }
        self.bitmap
            .init(width as u32, height as u32, None, 1.0, BitmapAlphaType::Premul)?;
        self.clip = None;
        self.clip_stack.clear();
        self.dib = None;
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.bitmap.is_empty()
    }

    fn offset_window_org(&mut self, offset: UiPoint) -> UiPoint {
        let old = self.origin;
        self.origin = UiPoint::new(old.x - offset.x, old.y - offset.y);
        old
    }

    fn set_window_org(&mut self, pt: UiPoint) -> UiPoint {
        std::mem::replace(&mut self.origin, pt)
    }

    fn window_org(&self) -> UiPoint {
        self.origin
    }

    fn save_clip(&mut self) -> usize {
        self.clip_stack.push(self.clip);
        self.clip_stack.len()
    }

    fn restore_clip(&mut self, token: usize) {
        if token == 0 || token > self.clip_stack.len() {
            debug!("Ignoring unknown clip token {} (depth {})", token, self.clip_stack.len());
            return;
        }
        self.clip = self.clip_stack[token - 1];
        self.clip_stack.truncate(token - 1);
    }

    fn set_clip(&mut self, rc: UiRect, intersect: bool) {
        let dev = self.to_device(rc);
        self.clip = Some(match (intersect, self.clip) {
            (true, Some(current)) => current.intersect(&dev).unwrap_or_default(),
            _ => dev,
        });
    }

    fn set_round_clip(&mut self, rc: UiRect, _rx: i32, _ry: i32, intersect: bool) {
        self.set_clip(rc, intersect);
    }

    fn clear_clip(&mut self) {
        self.clip = None;
    }

    fn clip_info(&self) -> (RenderClipType, Vec<UiRect>) {
        match self.visible() {
            Some(rc) => (RenderClipType::Rect, vec![rc]),
            None => (RenderClipType::Empty, Vec::new()),
        }
    }

    fn is_clip_empty(&self) -> bool {
        self.visible().is_none()
    }

    fn clear(&mut self, color: UiColor) {
        self.bitmap.bits_mut().fill(color.argb());
    }

    fn clear_rect(&mut self, rc: UiRect, color: UiColor) {
        let dev = self.to_device(rc);
        self.fill_device_rect(dev, color, 255, FillMode::Source);
    }

    fn read_pixels(&self, dst: &mut [u8], rc: UiRect) -> Result<()> {
        let dev = self.checked_device_rect(rc, dst.len())?;
        let stride = self.bitmap.width() as usize;
        let row_len = dev.width() as usize;
        let bits = self.bitmap.bits();
        for (i, y) in (dev.top..dev.bottom).enumerate() {
            let src = &bits[y as usize * stride + dev.left as usize..][..row_len];
            let out = &mut dst[i * row_len * 4..(i + 1) * row_len * 4];
            for (chunk, p) in out.chunks_exact_mut(4).zip(src) {
                chunk.copy_from_slice(&p.to_le_bytes());
            }
        }
        Ok(())
    }

    fn write_pixels(&mut self, src: &[u8], rc: UiRect) -> Result<()> {
        let dev = self.checked_device_rect(rc, src.len())?;
        let stride = self.bitmap.width() as usize;
        let row_len = dev.width() as usize;
        let bits = self.bitmap.bits_mut();
        for (i, y) in (dev.top..dev.bottom).enumerate() {
            let dst = &mut bits[y as usize * stride + dev.left as usize..][..row_len];
            let input = &src[i * row_len * 4..(i + 1) * row_len * 4];
            for (p, chunk) in dst.iter_mut().zip(input.chunks_exact(4)) {
                *p = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            }
        }
        Ok(())
    }

    fn write_pixels_in(&mut self, src: &[u8], rc: UiRect, paint_rc: UiRect) -> Result<()> {
        if rc == paint_rc {
            return self.write_pixels(src, rc);
        }
        let update = rc.intersect(&paint_rc).ok_or(RenderError::EmptyRect)?;
        let src_stride = rc.width() as usize;
        let needed = src_stride * rc.height() as usize * 4;
        if src.len() < needed {
            return Err(RenderError::BufferTooSmall {
                needed,
                actual: src.len(),
            });
        }
        let dev = self.checked_device_rect(update, needed)?;
        let dx = (update.left - rc.left) as usize;
        let dy = (update.top - rc.top) as usize;
        let stride = self.bitmap.width() as usize;
        let row_len = dev.width() as usize;
        let bits = self.bitmap.bits_mut();
        for (i, y) in (dev.top..dev.bottom).enumerate() {
            let dst = &mut bits[y as usize * stride + dev.left as usize..][..row_len];
            let start = ((dy + i) * src_stride + dx) * 4;
            let input = &src[start..start + row_len * 4];
            for (p, chunk) in dst.iter_mut().zip(input.chunks_exact(4)) {
                *p = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            }
        }
        Ok(())
    }

    fn make_image_snapshot(&self) -> Option<Box<dyn Bitmap>> {
        if self.bitmap.is_empty() {
            return None;
        }
        Some(Box::new(self.bitmap.clone()))
    }

    fn clear_alpha(&mut self, rc: UiRect, alpha: u8) {
        let dev = self.to_device(rc);
        let (w, h) = (self.bitmap.width(), self.bitmap.height());
        alpha::clear_alpha(self.bitmap.bits_mut(), w, h, dev, alpha);
    }

    fn restore_alpha(&mut self, rc: UiRect, padding: UiPadding, alpha: u8) {
        let dev = self.to_device(rc);
        let (w, h) = (self.bitmap.width(), self.bitmap.height());
        alpha::restore_alpha(self.bitmap.bits_mut(), w, h, dev, &padding, alpha);
    }

    fn restore_alpha_opaque(&mut self, rc: UiRect, padding: UiPadding) {
        let dev = self.to_device(rc);
        let (w, h) = (self.bitmap.width(), self.bitmap.height());
        alpha::restore_alpha_opaque(self.bitmap.bits_mut(), w, h, dev, &padding);
    }

    fn clone_render(&self) -> Box<dyn Render> {
        Box::new(RasterRender {
            bitmap: self.bitmap.clone(),
            origin: self.origin,
            clip: self.clip,
            clip_stack: self.clip_stack.clone(),
            config: Arc::clone(&self.config),
            text: self.text.clone(),
            window: None,
            dib: None,
        })
    }
}

#[cfg(test)]
pub(crate) fn test_render(width: i32, height: i32) -> RasterRender {
    use crate::text::{shared, FixedMetricsTextBackend};

    let _ = env_logger::builder().is_test(true).try_init();
    let mut render = RasterRender::new(
        Arc::new(RenderConfig::default()),
        shared(FixedMetricsTextBackend::new()),
        None,
    );
    render.resize(width, height).unwrap();
    render
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::RenderShapes;

    #[test]
    fn resize_rejects_non_positive_sizes() {
        let mut render = test_render(4, 4);
        assert!(render.resize(0, 10).is_err());
        assert!(render.resize(10, -1).is_err());
        assert!(render.resize(8, 2).is_ok());
        assert_eq!((render.width(), render.height()), (8, 2));
        assert!(render.bitmap().bits().iter().all(|&p| p == 0));
    }

    #[test]
    fn window_org_offsets_drawing() {
        let mut render = test_render(10, 10);
        let old = render.offset_window_org(UiPoint::new(-3, -2));
        assert_eq!(old, UiPoint::new(0, 0));
        assert_eq!(render.window_org(), UiPoint::new(3, 2));
        render.fill_rect(UiRect::new(0, 0, 1, 1), UiColor::RED, 255);
        assert_eq!(render.bitmap().pixel(3, 2), Some(0xFFFF_0000));
        assert_eq!(render.set_window_org(UiPoint::default()), UiPoint::new(3, 2));
    }

    #[test]
    fn clip_save_restore_balances() {
        let mut render = test_render(20, 20);
        let initial = render.clip_info();
        let token = render.save_clip();
        render.set_clip(UiRect::new(2, 2, 10, 10), true);
        let inner = render.save_clip();
        render.set_clip(UiRect::new(5, 5, 15, 15), true);
        assert_eq!(render.clip_info(), (RenderClipType::Rect, vec![UiRect::new(5, 5, 10, 10)]));
        render.set_clip(UiRect::new(30, 30, 40, 40), true);
        assert!(render.is_clip_empty());
        render.restore_clip(inner);
        assert_eq!(render.clip_info().1, vec![UiRect::new(2, 2, 10, 10)]);
        render.restore_clip(token);
        assert_eq!(render.clip_info(), initial);
        // Stale tokens are ignored.
        render.set_clip(UiRect::new(1, 1, 2, 2), false);
        render.restore_clip(token);
        assert_eq!(render.clip_info().1, vec![UiRect::new(1, 1, 2, 2)]);
    }

    #[test]
    fn clip_limits_fills() {
        let mut render = test_render(10, 10);
        render.set_clip(UiRect::new(0, 0, 5, 10), false);
        render.fill_rect(UiRect::new(0, 0, 10, 10), UiColor::GREEN, 255);
        assert_eq!(render.bitmap().pixel(4, 4), Some(0xFF00_FF00));
        assert_eq!(render.bitmap().pixel(5, 4), Some(0));
        render.clear_clip();
        assert!(!render.is_clip_empty());
    }

    #[test]
    fn pixel_round_trip_with_origin() {
        let mut render = test_render(6, 6);
        render.set_window_org(UiPoint::new(1, 1));
        let src: Vec<u8> = (0..2 * 2).flat_map(|i| (0xFF00_0000u32 | i).to_le_bytes()).collect();
        render.write_pixels(&src, UiRect::new(0, 0, 2, 2)).unwrap();
        assert_eq!(render.bitmap().pixel(2, 2), Some(0xFF00_0003));
        let mut out = vec![0u8; 16];
        render.read_pixels(&mut out, UiRect::new(0, 0, 2, 2)).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn write_pixels_rejects_bad_input() {
        let mut render = test_render(4, 4);
        let short = vec![0xFFu8; 15];
        assert!(matches!(
            render.write_pixels(&short, UiRect::new(0, 0, 2, 2)),
            Err(RenderError::BufferTooSmall { needed: 16, actual: 15 })
        ));
        assert!(render.bitmap().bits().iter().all(|&p| p == 0));
        let ok = vec![0xFFu8; 16];
        assert!(render.write_pixels(&ok, UiRect::new(3, 3, 5, 5)).is_err());
        assert!(render.write_pixels(&ok, UiRect::new(1, 1, 1, 5)).is_err());
        assert!(RasterRender::new(Arc::new(RenderConfig::default()), render.text.clone(), None)
            .write_pixels(&ok, UiRect::new(0, 0, 2, 2))
            .is_err());
    }

    #[test]
    fn write_pixels_in_commits_only_paint_rect() {
        let mut render = test_render(4, 4);
        let src: Vec<u8> = (0..16u32).flat_map(|i| (0xFF00_0000 | i).to_le_bytes()).collect();
        render
            .write_pixels_in(&src, UiRect::new(0, 0, 4, 4), UiRect::new(1, 2, 3, 4))
            .unwrap();
        assert_eq!(render.bitmap().pixel(0, 0), Some(0));
        assert_eq!(render.bitmap().pixel(1, 2), Some(0xFF00_0009));
        assert_eq!(render.bitmap().pixel(2, 3), Some(0xFF00_000E));
        assert!(render
            .write_pixels_in(&src, UiRect::new(0, 0, 4, 4), UiRect::new(5, 5, 6, 6))
            .is_err());
    }

    #[test]
    fn snapshot_is_a_copy() {
        let mut render = test_render(2, 2);
        render.clear(UiColor::WHITE);
        let snap = render.make_image_snapshot().unwrap();
        render.clear(UiColor::BLACK);
        let snap = snap.as_any().downcast_ref::<RasterBitmap>().unwrap();
        assert_eq!(snap.pixel(0, 0), Some(0xFFFF_FFFF));
    }

    #[test]
    fn clear_rect_overwrites_alpha() {
        let mut render = test_render(4, 4);
        render.clear(UiColor::WHITE);
        render.clear_rect(UiRect::new(0, 0, 2, 2), UiColor::TRANSPARENT);
        assert_eq!(render.bitmap().pixel(1, 1), Some(0));
        assert_eq!(render.bitmap().pixel(2, 2), Some(0xFFFF_FFFF));
    }

    #[test]
    fn alpha_fixups_follow_origin() {
        let mut render = test_render(4, 4);
        render.clear(UiColor::WHITE);
        render.set_window_org(UiPoint::new(2, 0));
        render.clear_alpha(UiRect::new(0, 0, 1, 1), 0);
        assert_eq!(render.bitmap().pixel(2, 0), Some(0x00FF_FFFF));
        render.restore_alpha_opaque(UiRect::new(0, 0, 2, 2), UiPadding::default());
        assert_eq!(render.bitmap().pixel(2, 0), Some(0xFFFF_FFFF));
    }

    #[test]
    fn clone_render_copies_pixels_and_state() {
        let mut render = test_render(3, 3);
        render.clear(UiColor::RED);
        render.set_clip(UiRect::new(0, 0, 2, 2), false);
        let copy = render.clone_render();
        render.clear(UiColor::BLUE);
        assert_eq!(copy.clip_info().1, vec![UiRect::new(0, 0, 2, 2)]);
        let copy = copy.as_any().downcast_ref::<RasterRender>().unwrap();
        assert_eq!(copy.bitmap().pixel(0, 0), Some(0xFFFF_0000));
    }
}
