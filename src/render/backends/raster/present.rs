//! Handing pixels to native drawing code and to the window.

use log::{debug, trace};

use crate::alpha::restore_changed_alpha;
use crate::errors::{RenderError, Result};
use crate::geometry::UiRect;
use crate::render::backend::{Bitmap, RenderPresent};
use crate::render::native::{NativeWindow, PresentFrame, PresentMode, RenderPaint, WindowRegion};

use super::render::RasterRender;

/// Scoped access to a copy of the surface pixels for code that draws without
/// alpha (native text, themed controls).
///
/// Changes are committed when the guard drops. Pixels the native code touched and
/// left at zero alpha become opaque.
pub struct RenderDc<'a> {
    render: &'a mut RasterRender,
    before: Vec<u32>,
}

impl RenderDc<'_> {
    pub fn width(&self) -> u32 {
        self.render.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.render.bitmap.height()
    }

    pub fn pixels(&self) -> &[u32] {
        self.render.dib.as_deref().unwrap_or_default()
    }

    pub fn pixels_mut(&mut self) -> &mut [u32] {
        self.render.dib.as_deref_mut().unwrap_or_default()
    }
}

impl Drop for RenderDc<'_> {
    fn drop(&mut self) {
        let Some(dib) = self.render.dib.as_mut() else {
            return;
        };
        let changed = restore_changed_alpha(&self.before, dib);
        trace!("Render DC released, {} pixels changed", changed);
        if changed > 0 {
            self.render.bitmap.bits_mut().copy_from_slice(dib);
        }
    }
}

impl RasterRender {
    /// A DC over the current pixels, `None` for an empty surface.
    pub fn get_render_dc(&mut self) -> Option<RenderDc<'_>> {
        if self.bitmap.is_empty() {
            return None;
        }
        let pixels = self.bitmap.bits();
        match self.dib.as_mut() {
            Some(dib) if dib.len() == pixels.len() => dib.copy_from_slice(pixels),
            _ => {
                debug!("Creating DC buffer {}x{}", self.bitmap.width(), self.bitmap.height());
                self.dib = Some(pixels.to_vec());
            }
        }
        let before = self.bitmap.bits().to_vec();
        Some(RenderDc { render: self, before })
    }

    fn set_region(&mut self, region: Option<WindowRegion>, redraw: bool) -> bool {
        match self.window.as_mut() {
            Some(window) => window.set_region(region, redraw),
            None => {
                debug!("No window for region {:?}", region);
                false
            }
        }
    }

    fn paint_with(&mut self, window: &mut dyn NativeWindow, paint: &mut dyn RenderPaint) -> Result<()> {
        let dirty = window
            .update_rect()
            .and_then(|rc| rc.intersect(&self.bitmap.bounds()))
            .ok_or(RenderError::NothingToPaint)?;
        if !paint.do_paint(self, dirty) {
            return Err(RenderError::PaintFailed);
        }
        let mode = if window.is_layered() {
            PresentMode::Layered {
                alpha: window.layered_alpha(),
            }
        } else {
            PresentMode::Blit
        };
        let frame = PresentFrame {
            pixels: self.bitmap.bits(),
            width: self.bitmap.width(),
            height: self.bitmap.height(),
            dirty,
            mode,
        };
        window
            .present(&frame)
            .map_err(|e| RenderError::PresentFailed(format!("{:#}", e)))
    }
}

impl RenderPresent for RasterRender {
    fn with_render_dc(&mut self, draw: &mut dyn FnMut(&mut [u32], u32, u32)) -> Result<()> {
        let mut dc = self.get_render_dc().ok_or(RenderError::EmptySurface)?;
        let (w, h) = (dc.width(), dc.height());
        draw(dc.pixels_mut(), w, h);
        Ok(())
    }

    fn paint_and_swap_buffers(&mut self, paint: &mut dyn RenderPaint) -> Result<()> {
        let mut window = self.window.take().ok_or(RenderError::NoWindow)?;
        let result = self.paint_with(window.as_mut(), paint);
        self.window = Some(window);
        result
    }

    fn set_window_round_rect_rgn(&mut self, rc: UiRect, rx: f32, ry: f32, redraw: bool) -> bool {
        self.set_region(Some(WindowRegion::RoundRect { rect: rc, rx, ry }), redraw)
    }

    fn set_window_rect_rgn(&mut self, rc: UiRect, redraw: bool) -> bool {
        self.set_region(Some(WindowRegion::Rect(rc)), redraw)
    }

    fn clear_window_rgn(&mut self, redraw: bool) {
        self.set_region(None, redraw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::UiColor;
    use crate::render::backend::{Render, RenderCanvas, RenderShapes};
    use crate::render::backends::raster::render::test_render;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct WindowLog {
        presents: Vec<(UiRect, PresentMode, u32)>,
        regions: Vec<Option<WindowRegion>>,
    }

    struct FakeWindow {
        update: Option<UiRect>,
        layered: bool,
        fail: bool,
        log: Rc<RefCell<WindowLog>>,
    }

    impl FakeWindow {
        fn new(update: Option<UiRect>, layered: bool) -> (Self, Rc<RefCell<WindowLog>>) {
            let log = Rc::new(RefCell::new(WindowLog::default()));
            let window = FakeWindow {
                update,
                layered,
                fail: false,
                log: Rc::clone(&log),
            };
            (window, log)
        }
    }

    impl NativeWindow for FakeWindow {
        fn update_rect(&mut self) -> Option<UiRect> {
            self.update
        }
        fn is_layered(&self) -> bool {
            self.layered
        }
        fn layered_alpha(&self) -> u8 {
            200
        }
        fn present(&mut self, frame: &PresentFrame<'_>) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("device lost");
            }
            self.log.borrow_mut().presents.push((frame.dirty, frame.mode, frame.pixels[0]));
            Ok(())
        }
        fn set_region(&mut self, region: Option<WindowRegion>, _redraw: bool) -> bool {
            self.log.borrow_mut().regions.push(region);
            true
        }
    }

    struct Painter(bool);

    impl RenderPaint for Painter {
        fn do_paint(&mut self, render: &mut dyn Render, paint_rc: UiRect) -> bool {
            render.fill_rect(paint_rc, UiColor::RED, 255);
            self.0
        }
    }

    fn with_window(window: FakeWindow) -> RasterRender {
        let mut render = test_render(4, 4);
        render.window = Some(Box::new(window));
        render
    }

    #[test]
    fn dc_changes_are_written_back_opaque() {
        let mut render = test_render(2, 1);
        render.clear(UiColor::from_argb(0x80, 0, 0, 0));
        {
            let mut dc = render.get_render_dc().unwrap();
            assert_eq!(dc.pixels(), &[0x8000_0000, 0x8000_0000]);
            // Native code writes RGB with a zero alpha byte.
            dc.pixels_mut()[1] = 0x0012_3456;
        }
        assert_eq!(render.bitmap().pixel(0, 0), Some(0x8000_0000));
        assert_eq!(render.bitmap().pixel(1, 0), Some(0xFF12_3456));
    }

    #[test]
    fn dc_is_reseeded_each_time() {
        let mut render = test_render(1, 1);
        render
            .with_render_dc(&mut |px, w, h| {
                assert_eq!((w, h), (1, 1));
                px[0] = 0xFF00_00FF;
            })
            .unwrap();
        render.clear(UiColor::GREEN);
        let dc = render.get_render_dc().unwrap();
        assert_eq!(dc.pixels(), &[0xFF00_FF00]);
    }

    #[test]
    fn empty_surface_has_no_dc() {
        let mut render = RasterRender::new(
            std::sync::Arc::new(crate::config::RenderConfig::default()),
            crate::text::shared(crate::text::FixedMetricsTextBackend::new()),
            None,
        );
        assert!(render.get_render_dc().is_none());
        assert!(render.with_render_dc(&mut |_, _, _| {}).is_err());
    }

    #[test]
    fn paint_and_swap_presents_the_dirty_rect() {
        let (window, log) = FakeWindow::new(Some(UiRect::new(0, 0, 2, 2)), false);
        let mut render = with_window(window);
        render.paint_and_swap_buffers(&mut Painter(true)).unwrap();
        let log = log.borrow();
        assert_eq!(log.presents, vec![(UiRect::new(0, 0, 2, 2), PresentMode::Blit, 0xFFFF_0000)]);
        assert_eq!(render.bitmap().pixel(3, 3), Some(0));
    }

    #[test]
    fn layered_windows_get_their_alpha() {
        let (window, log) = FakeWindow::new(Some(UiRect::new(0, 0, 10, 10)), true);
        let mut render = with_window(window);
        render.paint_and_swap_buffers(&mut Painter(true)).unwrap();
        // The dirty rect is clamped to the surface.
        let (dirty, mode, _) = log.borrow().presents[0];
        assert_eq!(dirty, UiRect::new(0, 0, 4, 4));
        assert_eq!(mode, PresentMode::Layered { alpha: 200 });
    }

    #[test]
    fn paint_failures_are_reported_in_order() {
        let mut render = test_render(4, 4);
        assert!(matches!(render.paint_and_swap_buffers(&mut Painter(true)), Err(RenderError::NoWindow)));

        let (window, _) = FakeWindow::new(None, false);
        let mut render = with_window(window);
        assert!(matches!(
            render.paint_and_swap_buffers(&mut Painter(true)),
            Err(RenderError::NothingToPaint)
        ));

        let (window, log) = FakeWindow::new(Some(UiRect::new(0, 0, 4, 4)), false);
        let mut render = with_window(window);
        assert!(matches!(render.paint_and_swap_buffers(&mut Painter(false)), Err(RenderError::PaintFailed)));
        assert!(log.borrow().presents.is_empty());

        let (mut window, _) = FakeWindow::new(Some(UiRect::new(0, 0, 4, 4)), false);
        window.fail = true;
        let mut render = with_window(window);
        match render.paint_and_swap_buffers(&mut Painter(true)) {
            Err(RenderError::PresentFailed(msg)) => assert!(msg.contains("device lost")),
            other => panic!("unexpected {:?}", other),
        }
        // The window survives a failed frame.
        assert!(render.set_window_rect_rgn(UiRect::new(0, 0, 4, 4), false));
    }

    #[test]
    fn regions_are_forwarded() {
        let (window, log) = FakeWindow::new(None, false);
        let mut render = with_window(window);
        assert!(render.set_window_round_rect_rgn(UiRect::new(0, 0, 4, 4), 2.0, 2.0, true));
        assert!(render.set_window_rect_rgn(UiRect::new(1, 1, 3, 3), false));
        render.clear_window_rgn(true);
        assert_eq!(
            log.borrow().regions,
            vec![
                Some(WindowRegion::RoundRect {
                    rect: UiRect::new(0, 0, 4, 4),
                    rx: 2.0,
                    ry: 2.0
                }),
                Some(WindowRegion::Rect(UiRect::new(1, 1, 3, 3))),
                None,
            ]
        );

        let mut bare = test_render(4, 4);
        assert!(!bare.set_window_rect_rgn(UiRect::new(0, 0, 4, 4), false));
        assert_eq!(bare.width(), 4);
    }
}
