//! Blits, nine-patch image drawing and transformed image draws.

use log::{trace, warn};

use crate::errors::{RenderError, Result};
use crate::geometry::{UiPadding, UiPoint, UiPointF, UiRect};
use crate::render::backend::{downcast_ref, BackendType, Bitmap, Matrix, Render, RenderImages};
use crate::render::types::{RopMode, TiledDrawParam};

use super::bitmap::RasterBitmap;
use super::blend::{blend_over, copy_image_rect, draw_image_rect_clipped};
use super::matrix::RasterMatrix;
use super::render::RasterRender;

/// How many tiles of `image_size` fit into `available` with `margin` between them.
///
/// With `fully_tiled` only whole tiles count; otherwise a final partial tile does.
pub fn calc_draw_image_times(available: i32, image_size: i32, margin: i32, fully_tiled: bool) -> i32 {
    if available <= 0 || image_size <= 0 {
        return 0;
    }
    let first_required = if fully_tiled { image_size } else { 1 };
    if available < first_required {
        return 0;
    }
    let mut remaining = available - image_size;
    let mut times = 1;
    if remaining <= 0 {
        return times;
    }
    loop {
        if remaining < margin {
            break;
        }
        remaining -= margin;
        if remaining <= 0 {
            break;
        }
        if !fully_tiled || remaining >= image_size {
            times += 1;
            remaining -= image_size;
        } else {
            break;
        }
    }
    times
}

/// Tile spans along one axis: `(dest_start, draw_len)` per tile, the last one shrunk to fit.
fn tile_spans(start: i32, end: i32, image_size: i32, margin: i32, fully_tiled: bool) -> Vec<(i32, i32)> {
    let times = calc_draw_image_times(end - start, image_size, margin, fully_tiled);
    let mut spans = Vec::with_capacity(times.max(0) as usize);
    let mut pos = start;
    for i in 0..times {
        if i > 0 {
            pos += margin;
        }
        let len = image_size - (pos + image_size - end).max(0);
        spans.push((pos, len));
        pos += len;
    }
    spans
}

fn source_bitmap(bitmap: &dyn Bitmap) -> Option<&RasterBitmap> {
    match downcast_ref::<RasterBitmap, _>(bitmap, BackendType::Raster) {
        Ok(b) => Some(b),
        Err(e) => {
            warn!("draw_image: {}", e);
            None
        }
    }
}

fn source_render(src: &dyn Render) -> Result<&RasterRender> {
    downcast_ref::<RasterRender, _>(src, BackendType::Raster).map_err(|e| {
        warn!("blit: {}", e);
        e
    })
}

impl RasterRender {
    /// Draw `rc_src` of `src` into the logical rect `rc_dest`.
    fn draw_piece(&mut self, src: &RasterBitmap, rc_dest: UiRect, rc_src: UiRect, fade: u8) {
        let Some(visible) = self.visible() else {
            return;
        };
        let dest = self.to_device(rc_dest);
        if !draw_image_rect_clipped(&mut self.bitmap, dest, src, rc_src, fade, visible) {
            trace!("image piece {:?} skipped", rc_dest);
        }
    }

    fn check_blit(&self, src: &RasterRender, cx: i32, cy: i32) -> Result<UiRect> {
        if self.bitmap.is_empty() || src.bitmap.is_empty() {
            return Err(RenderError::EmptySurface);
        }
        if cx <= 0 || cy <= 0 {
            return Err(RenderError::EmptyRect);
        }
        self.visible().ok_or(RenderError::EmptyRect)
    }

    fn draw_center(
        &mut self,
        src: &RasterBitmap,
        dest: UiRect,
        source: UiRect,
        image_size: (i32, i32),
        fade: u8,
        tiled: &TiledDrawParam,
    ) {
        let (image_w, image_h) = image_size;
        match (tiled.tiled_x, tiled.tiled_y) {
            (false, false) => self.draw_piece(src, dest, source, fade),
            (true, true) => {
                let rows = tile_spans(dest.top, dest.bottom, image_h, tiled.tiled_margin_y, tiled.fully_tiled_y);
                let cols = tile_spans(dest.left, dest.right, image_w, tiled.tiled_margin_x, tiled.fully_tiled_x);
                for &(y, h) in &rows {
                    for &(x, w) in &cols {
                        let src_rc = UiRect::from_xywh(source.left, source.top, w, h);
                        self.draw_piece(src, UiRect::from_xywh(x, y, w, h), src_rc, fade);
                    }
                }
            }
            (true, false) => {
                for (x, w) in tile_spans(dest.left, dest.right, image_w, tiled.tiled_margin_x, tiled.fully_tiled_x) {
                    let src_rc = UiRect::new(source.left, source.top, source.left + w, source.bottom);
                    self.draw_piece(src, UiRect::new(x, dest.top, x + w, dest.bottom), src_rc, fade);
                }
            }
            (false, true) => {
                for (y, h) in tile_spans(dest.top, dest.bottom, image_h, tiled.tiled_margin_y, tiled.fully_tiled_y) {
                    let src_rc = UiRect::new(source.left, source.top, source.right, source.top + h);
                    self.draw_piece(src, UiRect::new(dest.left, y, dest.right, y + h), src_rc, fade);
                }
            }
        }
    }
}

impl RenderImages for RasterRender {
    fn bit_blt(
        &mut self,
        x: i32,
        y: i32,
        cx: i32,
        cy: i32,
        src: &dyn Render,
        x_src: i32,
        y_src: i32,
        rop: RopMode,
    ) -> Result<()> {
        let src = source_render(src)?;
        let visible = self.check_blit(src, cx, cy)?;
        if rop != RopMode::SrcCopy {
            trace!("bit_blt: {:?} degrades to a copy", rop);
        }
        let dest = self.to_device(UiRect::from_xywh(x, y, cx, cy));
        copy_image_rect(&mut self.bitmap, dest, &src.bitmap, UiRect::from_xywh(x_src, y_src, cx, cy), visible);
        Ok(())
    }

    fn stretch_blt(
        &mut self,
        x: i32,
        y: i32,
        cx: i32,
        cy: i32,
        src: &dyn Render,
        x_src: i32,
        y_src: i32,
        cx_src: i32,
        cy_src: i32,
        rop: RopMode,
    ) -> Result<()> {
        let src = source_render(src)?;
        let visible = self.check_blit(src, cx, cy)?;
        if cx_src <= 0 || cy_src <= 0 {
            return Err(RenderError::EmptyRect);
        }
        if rop != RopMode::SrcCopy {
            trace!("stretch_blt: {:?} degrades to a copy", rop);
        }
        let dest = self.to_device(UiRect::from_xywh(x, y, cx, cy));
        let rc_src = UiRect::from_xywh(x_src, y_src, cx_src, cy_src);
        copy_image_rect(&mut self.bitmap, dest, &src.bitmap, rc_src, visible);
        Ok(())
    }

    fn alpha_blend(
        &mut self,
        x: i32,
        y: i32,
        cx: i32,
        cy: i32,
        src: &dyn Render,
        x_src: i32,
        y_src: i32,
        cx_src: i32,
        cy_src: i32,
        alpha: u8,
    ) -> Result<()> {
        let src = source_render(src)?;
        let visible = self.check_blit(src, cx, cy)?;
        if cx_src <= 0 || cy_src <= 0 {
            return Err(RenderError::EmptyRect);
        }
        let dest = self.to_device(UiRect::from_xywh(x, y, cx, cy));
        let rc_src = UiRect::from_xywh(x_src, y_src, cx_src, cy_src);
        draw_image_rect_clipped(&mut self.bitmap, dest, &src.bitmap, rc_src, alpha, visible);
        Ok(())
    }

    fn draw_image(
        &mut self,
        paint_rc: UiRect,
        bitmap: &dyn Bitmap,
        rc_dest: UiRect,
        rc_dest_corners: UiPadding,
        rc_source: UiRect,
        rc_source_corners: UiPadding,
        fade: u8,
        tiled: Option<&TiledDrawParam>,
        window_shadow_mode: bool,
    ) {
        if !rc_dest.intersects(&paint_rc) {
            return;
        }
        let Some(src) = source_bitmap(bitmap) else {
            return;
        };
        let tiled = tiled.copied().unwrap_or_default();

        let mut center = rc_dest.deflate_padding(&rc_dest_corners);
        if tiled.tiled_x || tiled.tiled_y {
            center = center.deflate_padding(&tiled.tiled_padding);
        }
        let source_center = rc_source.deflate_padding(&rc_source_corners);
        let window_shadow_mode = window_shadow_mode && !rc_dest_corners.is_zero();

        if !window_shadow_mode && center.intersects(&paint_rc) {
            let image_size = (
                rc_source.width() - rc_source_corners.left - rc_source_corners.right,
                rc_source.height() - rc_source_corners.top - rc_source_corners.bottom,
            );
            self.draw_center(src, center, source_center, image_size, fade, &tiled);
        }

        let (d, dc, s, sc) = (rc_dest, rc_dest_corners, rc_source, rc_source_corners);
        let pieces = [
            // Corners and edges, clockwise from the top-left.
            (sc.left > 0 && sc.top > 0,
             UiRect::new(d.left, d.top, d.left + dc.left, d.top + dc.top),
             UiRect::new(s.left, s.top, s.left + sc.left, s.top + sc.top)),
            (sc.top > 0,
             UiRect::new(d.left + dc.left, d.top, d.right - dc.right, d.top + dc.top),
             UiRect::new(s.left + sc.left, s.top, s.right - sc.right, s.top + sc.top)),
            (sc.right > 0 && sc.top > 0,
             UiRect::new(d.right - dc.right, d.top, d.right, d.top + dc.top),
             UiRect::new(s.right - sc.right, s.top, s.right, s.top + sc.top)),
            (sc.left > 0,
             UiRect::new(d.left, d.top + dc.top, d.left + dc.left, d.bottom - dc.bottom),
             UiRect::new(s.left, s.top + sc.top, s.left + sc.left, s.bottom - sc.bottom)),
            (sc.right > 0,
             UiRect::new(d.right - dc.right, d.top + dc.top, d.right, d.bottom - dc.bottom),
             UiRect::new(s.right - sc.right, s.top + sc.top, s.right, s.bottom - sc.bottom)),
            (sc.left > 0 && sc.bottom > 0,
             UiRect::new(d.left, d.bottom - dc.bottom, d.left + dc.left, d.bottom),
             UiRect::new(s.left, s.bottom - sc.bottom, s.left + sc.left, s.bottom)),
            (sc.bottom > 0,
             UiRect::new(d.left + dc.left, d.bottom - dc.bottom, d.right - dc.right, d.bottom),
             UiRect::new(s.left + sc.left, s.bottom - sc.bottom, s.right - sc.right, s.bottom)),
            (sc.right > 0 && sc.bottom > 0,
             UiRect::new(d.right - dc.right, d.bottom - dc.bottom, d.right, d.bottom),
             UiRect::new(s.right - sc.right, s.bottom - sc.bottom, s.right, s.bottom)),
        ];
        for (enabled, dest, source) in pieces {
            if enabled && dest.intersects(&paint_rc) {
                self.draw_piece(src, dest, source, fade);
            }
        }
    }

    fn draw_image_simple(&mut self, paint_rc: UiRect, bitmap: &dyn Bitmap, rc_dest: UiRect, rc_source: UiRect, fade: u8) {
        self.draw_image(
            paint_rc,
            bitmap,
            rc_dest,
            UiPadding::default(),
            rc_source,
            UiPadding::default(),
            fade,
            None,
            false,
        );
    }

    fn draw_image_rect(
        &mut self,
        paint_rc: UiRect,
        bitmap: &dyn Bitmap,
        rc_dest: UiRect,
        rc_source: UiRect,
        fade: u8,
        matrix: Option<&dyn Matrix>,
    ) {
        let matrix = match matrix.map(|m| downcast_ref::<RasterMatrix, _>(m, BackendType::Raster)) {
            None => None,
            Some(Ok(m)) if m.is_identity() => None,
            Some(Ok(m)) => Some(*m),
            Some(Err(e)) => {
                warn!("draw_image_rect: {}", e);
                return;
            }
        };
        let Some(matrix) = matrix else {
            self.draw_image_simple(paint_rc, bitmap, rc_dest, rc_source, fade);
            return;
        };
        let Some(src) = source_bitmap(bitmap) else {
            return;
        };
        if rc_dest.is_empty() || rc_source.is_empty() || src.is_empty() {
            return;
        }
        let Some(inverse) = matrix.invert() else {
            trace!("draw_image_rect: singular matrix");
            return;
        };

        // Bounding box of the transformed destination, in device pixels.
        let corners = [
            UiPointF::new(rc_dest.left as f32, rc_dest.top as f32),
            UiPointF::new(rc_dest.right as f32, rc_dest.top as f32),
            UiPointF::new(rc_dest.right as f32, rc_dest.bottom as f32),
            UiPointF::new(rc_dest.left as f32, rc_dest.bottom as f32),
        ]
        .map(|p| self.to_device_f(matrix.transform_point(p)));
        let (mut min, mut max) = (corners[0], corners[0]);
        for p in &corners[1..] {
            min = UiPointF::new(min.x.min(p.x), min.y.min(p.y));
            max = UiPointF::new(max.x.max(p.x), max.y.max(p.y));
        }
        let bbox = UiRect::new(min.x.floor() as i32, min.y.floor() as i32, max.x.ceil() as i32, max.y.ceil() as i32);
        if !bbox.intersects(&self.to_device(paint_rc)) {
            return;
        }
        let Some(area) = self.visible_part(bbox) else {
            return;
        };

        let (org_x, org_y) = (self.origin.x as f32, self.origin.y as f32);
        let src_bounds = src.bounds();
        let stride = self.bitmap.width() as usize;
        let bits = self.bitmap.bits_mut();
        for y in area.top..area.bottom {
            for x in area.left..area.right {
                let logical = UiPointF::new(x as f32 + 0.5 - org_x, y as f32 + 0.5 - org_y);
                let u = inverse.transform_point(logical);
                if u.x < rc_dest.left as f32 || u.x >= rc_dest.right as f32 || u.y < rc_dest.top as f32 || u.y >= rc_dest.bottom as f32 {
                    continue;
                }
                let sx = rc_source.left + ((u.x - rc_dest.left as f32) * rc_source.width() as f32 / rc_dest.width() as f32) as i32;
                let sy = rc_source.top + ((u.y - rc_dest.top as f32) * rc_source.height() as f32 / rc_dest.height() as f32) as i32;
                if !src_bounds.contains(UiPoint::new(sx, sy)) {
                    continue;
                }
                let s = src.bits()[sy as usize * src.width() as usize + sx as usize];
                let d = &mut bits[y as usize * stride + x as usize];
                *d = blend_over(s, *d, fade);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::UiColor;
    use crate::render::backend::{RenderCanvas, RenderObject};
    use crate::render::backends::raster::render::test_render;
    use std::any::Any;

    fn solid(w: u32, h: u32, argb: u32) -> RasterBitmap {
        RasterBitmap::from_pixels(w, h, vec![argb; (w * h) as usize]).unwrap()
    }

    /// 3x3 source whose pixels encode their own index.
    fn grid() -> RasterBitmap {
        RasterBitmap::from_pixels(3, 3, (0..9).map(|i| 0xFF00_0000 | i).collect()).unwrap()
    }

    #[test]
    fn draw_times_fixtures() {
        assert_eq!(calc_draw_image_times(100, 20, 5, true), 4);
        assert_eq!(calc_draw_image_times(19, 20, 0, true), 0);
        assert_eq!(calc_draw_image_times(19, 20, 0, false), 1);
        assert_eq!(calc_draw_image_times(45, 20, 5, true), 2);
        assert_eq!(calc_draw_image_times(44, 20, 5, true), 1);
        assert_eq!(calc_draw_image_times(44, 20, 5, false), 2);
        assert_eq!(calc_draw_image_times(25, 20, 5, false), 1);
        assert_eq!(calc_draw_image_times(0, 20, 5, false), 0);
        assert_eq!(calc_draw_image_times(10, 0, 5, false), 0);
    }

    #[test]
    fn last_tile_is_shrunk() {
        assert_eq!(tile_spans(0, 44, 20, 5, false), vec![(0, 20), (25, 19)]);
        assert_eq!(tile_spans(10, 55, 20, 5, true), vec![(10, 20), (35, 20)]);
    }

    #[test]
    fn nine_patch_places_every_piece() {
        let mut render = test_render(9, 9);
        let src = grid();
        let corners = UiPadding::new(1, 1, 1, 1);
        let full = UiRect::new(0, 0, 9, 9);
        render.draw_image(full, &src, full, UiPadding::new(2, 2, 2, 2), src.bounds(), corners, 255, None, false);
        let px = |x, y| render.bitmap().pixel(x, y).unwrap() & 0xFF;
        // Corners are scaled up 2x.
        assert_eq!((px(0, 0), px(1, 1), px(8, 0), px(0, 8), px(8, 8)), (0, 0, 2, 6, 8));
        // Edges stretch along one axis.
        assert_eq!((px(4, 0), px(0, 4), px(8, 4), px(4, 8)), (1, 3, 5, 7));
        // The center stretches on both.
        assert_eq!(px(4, 4), 4);
    }

    #[test]
    fn window_shadow_mode_skips_center() {
        let mut render = test_render(9, 9);
        let src = grid();
        let full = UiRect::new(0, 0, 9, 9);
        let corners = UiPadding::new(1, 1, 1, 1);
        render.draw_image(full, &src, full, UiPadding::new(2, 2, 2, 2), src.bounds(), corners, 255, None, true);
        assert_eq!(render.bitmap().pixel(4, 4), Some(0));
        assert_eq!(render.bitmap().pixel(0, 0), Some(0xFF00_0000));

        // Zero destination corners force the center back on.
        let mut render = test_render(9, 9);
        render.draw_image(full, &src, full, UiPadding::default(), src.bounds(), UiPadding::default(), 255, None, true);
        assert_eq!(render.bitmap().pixel(4, 4), Some(0xFF00_0004));
    }

    #[test]
    fn pieces_outside_paint_rect_are_skipped() {
        let mut render = test_render(9, 9);
        let src = grid();
        let full = UiRect::new(0, 0, 9, 9);
        render.draw_image(
            UiRect::new(0, 0, 2, 2),
            &src,
            full,
            UiPadding::new(2, 2, 2, 2),
            src.bounds(),
            UiPadding::new(1, 1, 1, 1),
            255,
            None,
            false,
        );
        assert_eq!(render.bitmap().pixel(0, 0), Some(0xFF00_0000));
        assert_eq!(render.bitmap().pixel(8, 8), Some(0));
        assert_eq!(render.bitmap().pixel(4, 4), Some(0));
    }

    #[test]
    fn tiled_center_repeats_the_source() {
        let mut render = test_render(10, 2);
        let mut src = solid(3, 1, 0xFF00_0000);
        src.set_pixel(0, 0, 0xFFFF_0000);
        let tiled = TiledDrawParam {
            tiled_x: true,
            tiled_margin_x: 1,
            ..Default::default()
        };
        let rc = UiRect::new(0, 0, 10, 2);
        render.draw_image(rc, &src, rc, UiPadding::default(), src.bounds(), UiPadding::default(), 255, Some(&tiled), false);
        // Tiles at 0, 4 and 8; the last is two pixels wide.
        let red: Vec<i32> = (0..10).filter(|&x| render.bitmap().pixel(x, 1) == Some(0xFFFF_0000)).collect();
        assert_eq!(red, vec![0, 4, 8]);
        assert_eq!(render.bitmap().pixel(3, 0), Some(0));
        assert_eq!(render.bitmap().pixel(9, 0), Some(0xFF00_0000));
    }

    #[test]
    fn blits_copy_between_surfaces() {
        let mut src = test_render(4, 4);
        src.clear(UiColor::from_argb(0x80, 1, 2, 3));
        let mut dest = test_render(4, 4);
        dest.clear(UiColor::WHITE);
        dest.bit_blt(1, 1, 2, 2, &src, 0, 0, RopMode::SrcInvert).unwrap();
        assert_eq!(dest.bitmap().pixel(1, 1), Some(0x8001_0203));
        assert_eq!(dest.bitmap().pixel(0, 0), Some(0xFFFF_FFFF));

        dest.stretch_blt(0, 0, 4, 4, &src, 0, 0, 1, 1, RopMode::SrcCopy).unwrap();
        assert_eq!(dest.bitmap().pixel(3, 3), Some(0x8001_0203));
        assert!(dest.bit_blt(0, 0, 0, 2, &src, 0, 0, RopMode::SrcCopy).is_err());
    }

    #[test]
    fn alpha_blend_applies_global_alpha() {
        let mut src = test_render(2, 2);
        src.clear(UiColor::BLUE);
        let mut dest = test_render(2, 2);
        dest.clear(UiColor::RED);
        dest.alpha_blend(0, 0, 2, 2, &src, 0, 0, 2, 2, 128).unwrap();
        assert_eq!(dest.bitmap().pixel(0, 0), Some(0xFF7F_0080));
    }

    struct ForeignBitmap;

    impl RenderObject for ForeignBitmap {
        fn backend_type(&self) -> BackendType {
            BackendType::Vector
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl Bitmap for ForeignBitmap {
        fn init(&mut self, _: u32, _: u32, _: Option<&[u8]>, _: f32, _: crate::render::types::BitmapAlphaType) -> Result<()> {
            Ok(())
        }
        fn width(&self) -> u32 {
            4
        }
        fn height(&self) -> u32 {
            4
        }
        fn alpha_type(&self) -> crate::render::types::BitmapAlphaType {
            Default::default()
        }
        fn lock_pixel_bits(&mut self) -> Option<&mut [u32]> {
            None
        }
        fn unlock_pixel_bits(&mut self) {}
        fn clone_bitmap(&self) -> Box<dyn Bitmap> {
            Box::new(ForeignBitmap)
        }
    }

    #[test]
    fn foreign_bitmaps_are_ignored() {
        let mut render = test_render(4, 4);
        let rc = UiRect::new(0, 0, 4, 4);
        render.draw_image_simple(rc, &ForeignBitmap, rc, rc, 255);
        assert!(render.bitmap().bits().iter().all(|&p| p == 0));
    }

    #[test]
    fn transformed_draw_maps_through_the_inverse() {
        let mut render = test_render(8, 8);
        let src = solid(2, 2, 0xFF00_FF00);
        let mut m = RasterMatrix::identity();
        m.translate(UiPointF::new(4.0, 4.0));
        render.draw_image_rect(UiRect::new(0, 0, 8, 8), &src, UiRect::new(0, 0, 2, 2), src.bounds(), 255, Some(&m));
        assert_eq!(render.bitmap().pixel(4, 4), Some(0xFF00_FF00));
        assert_eq!(render.bitmap().pixel(5, 5), Some(0xFF00_FF00));
        assert_eq!(render.bitmap().pixel(0, 0), Some(0));
        assert_eq!(render.bitmap().pixel(6, 6), Some(0));
    }
}
