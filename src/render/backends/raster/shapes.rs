//! Fills, strokes, gradients and box shadows.
//!
//! Axis-aligned rectangles go straight to the pixel rows. Everything else becomes
//! contours in device space and passes through the scanline filler.

use log::{trace, warn};

use crate::color::UiColor;
use crate::geometry::{UiPoint, UiPointF, UiRect, UiRectF, UiSize};
use crate::render::backend::{downcast_ref, BackendType, Brush, Path, Pen, RenderShapes};
use crate::render::types::{FillType, Gradient, GradientDirection};

use super::blend::faded_alpha;
use super::outline::{arc_points, ellipse_points, round_rect_points};
use super::path::RasterPath;
use super::pen::{stroke_of, RasterBrush, RasterPen};
use super::render::RasterRender;
use super::scan::{rasterize, stroke_contours, Contour, CoverageMask, Stroke};

const BLUR_PASSES: usize = 3;

/// Color of a two-stop linear gradient at device pixel `(x, y)` of `rc`.
fn gradient_at(rc: &UiRect, from: UiColor, to: UiColor, direction: GradientDirection, x: i32, y: i32) -> UiColor {
    let fx = (x as f32 + 0.5 - rc.left as f32) / rc.width().max(1) as f32;
    let fy = (y as f32 + 0.5 - rc.top as f32) / rc.height().max(1) as f32;
    let t = match direction {
        GradientDirection::LeftToRight => fx,
        GradientDirection::TopToBottom => fy,
        GradientDirection::TopLeftToBottomRight => (fx + fy) / 2.0,
        GradientDirection::TopRightToBottomLeft => (1.0 - fx + fy) / 2.0,
    };
    from.lerp(to, t)
}

/// Odd integer widths put a line's edges on pixel boundaries when shifted half a pixel
/// across its direction.
fn align_thin_line(p1: UiPointF, p2: UiPointF, width: f32) -> (UiPointF, UiPointF) {
    let w = width.round() as i32;
    if w % 2 == 0 || width.fract() != 0.0 {
        return (p1, p2);
    }
    if (p2.x - p1.x).abs() >= (p2.y - p1.y).abs() {
        (p1.offset(0.0, 0.5), p2.offset(0.0, 0.5))
    } else {
        (p1.offset(0.5, 0.0), p2.offset(0.5, 0.0))
    }
}

/// Four non-overlapping bands of width `w` just inside `rc`.
fn border_bands(rc: UiRect, w: i32) -> [UiRect; 4] {
    let top = UiRect::new(rc.left, rc.top, rc.right, (rc.top + w).min(rc.bottom));
    let bottom = UiRect::new(rc.left, (rc.bottom - w).max(top.bottom), rc.right, rc.bottom);
    let left = UiRect::new(rc.left, top.bottom, rc.left + w, bottom.top);
    let right = UiRect::new((rc.right - w).max(left.right), top.bottom, rc.right, bottom.top);
    [top, bottom, left, right]
}

fn raster_pen(pen: &dyn Pen) -> Option<(Stroke, UiColor)> {
    match downcast_ref::<RasterPen, _>(pen, BackendType::Raster) {
        Ok(pen) => Some((stroke_of(pen), pen.color())),
        Err(e) => {
            warn!("Pen rejected: {}", e);
            None
        }
    }
}

fn raster_path(path: &dyn Path) -> Option<&RasterPath> {
    match downcast_ref::<RasterPath, _>(path, BackendType::Raster) {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("Path rejected: {}", e);
            None
        }
    }
}

/// Running box average of `radius` over `len` samples spaced `step` apart.
fn box_blur_line(data: &mut [u8], start: usize, len: usize, step: usize, radius: usize, scratch: &mut Vec<u8>) {
    scratch.clear();
    scratch.extend((0..len).map(|i| data[start + i * step]));
    let window = (2 * radius + 1) as u32;
    let at = |i: isize| -> u32 {
        if i < 0 || i as usize >= len {
            0
        } else {
            scratch[i as usize] as u32
        }
    };
    let mut sum: u32 = (-(radius as isize)..=radius as isize).map(at).sum();
    for i in 0..len {
        data[start + i * step] = ((sum + window / 2) / window) as u8;
        let i = i as isize;
        sum = sum + at(i + radius as isize + 1) - at(i - radius as isize);
    }
}

fn box_blur(mask: &mut CoverageMask, radius: usize) {
    let (w, h) = (mask.rect.width() as usize, mask.rect.height() as usize);
    let mut scratch = Vec::with_capacity(w.max(h));
    for _ in 0..BLUR_PASSES {
        for y in 0..h {
            box_blur_line(&mut mask.data, y * w, w, 1, radius, &mut scratch);
        }
        for x in 0..w {
            box_blur_line(&mut mask.data, x, h, w, radius, &mut scratch);
        }
    }
}

impl RasterRender {
    fn device_points(&self, points: &[UiPointF]) -> Vec<UiPointF> {
        points.iter().map(|&p| self.to_device_f(p)).collect()
    }

    fn fill_contours(&mut self, contours: &[Contour], rule: FillType, color: UiColor, fade: u8) {
        let Some(visible) = self.visible() else {
            return;
        };
        if let Some(mask) = rasterize(contours, rule, visible) {
            self.blend_mask(&mask, color, fade);
        }
    }

    fn fill_contours_gradient(&mut self, contours: &[Contour], rule: FillType, gradient: &Gradient, fade: u8) {
        let Some(visible) = self.visible() else {
            return;
        };
        let Some(mask) = rasterize(contours, rule, visible) else {
            return;
        };
        let rc = self.to_device(gradient.rect);
        let (from, to, direction) = (gradient.from, gradient.to, gradient.direction);
        self.blend_mask_with(&mask, |x, y| {
            let color = gradient_at(&rc, from, to, direction, x, y);
            (color, faded_alpha(color.a(), fade))
        });
    }

    /// Stroke a logical polyline.
    fn stroke_points(&mut self, points: &[UiPointF], closed: bool, stroke: &Stroke, color: UiColor, fade: u8) {
        let device = self.device_points(points);
        let contours = stroke_contours(&device, closed, stroke);
        self.fill_contours(&contours, FillType::Winding, color, fade);
    }

    fn stroke_line(&mut self, p1: UiPointF, p2: UiPointF, stroke: &Stroke, color: UiColor, fade: u8) {
        let (p1, p2) = align_thin_line(p1, p2, stroke.width);
        self.stroke_points(&[p1, p2], false, stroke, color, fade);
    }

    fn stroke_rect(&mut self, rc: UiRect, stroke: &Stroke, line_in_rect: bool, color: UiColor, fade: u8) {
        let w = (stroke.width.round() as i32).max(1);
        let outer = if line_in_rect {
            rc
        } else {
            UiRect::new(rc.left - w / 2, rc.top - w / 2, rc.right + w - w / 2, rc.bottom + w - w / 2)
        };
        if stroke.dash.pattern().is_none() {
            for band in border_bands(outer, w) {
                self.fill_rect(band, color, fade);
            }
            return;
        }
        let inset = w as f32 / 2.0;
        let r = UiRectF::from(outer);
        let points = [
            UiPointF::new(r.left + inset, r.top + inset),
            UiPointF::new(r.right - inset, r.top + inset),
            UiPointF::new(r.right - inset, r.bottom - inset),
            UiPointF::new(r.left + inset, r.bottom - inset),
        ];
        self.stroke_points(&points, true, stroke, color, fade);
    }

    fn stroke_round_rect(&mut self, rc: UiRect, rx: f32, ry: f32, stroke: &Stroke, color: UiColor, fade: u8) {
        let points = round_rect_points(UiRectF::from(rc), rx, ry);
        self.stroke_points(&points, true, stroke, color, fade);
    }

    fn circle_points(&self, center: UiPoint, radius: i32) -> Vec<UiPointF> {
        if radius <= 0 {
            return Vec::new();
        }
        let steps = self.config.arc_steps(360.0);
        ellipse_points(center.x as f32, center.y as f32, radius as f32, radius as f32, steps)
    }
}

impl RenderShapes for RasterRender {
    fn fill_rect(&mut self, rc: UiRect, color: UiColor, fade: u8) {
        let mode = self.config.fill_mode;
        self.fill_device_rect(self.to_device(rc), color, fade, mode);
    }

    fn fill_rect_gradient(&mut self, rc: UiRect, from: UiColor, to: UiColor, direction: i8, fade: u8) {
        if to.is_empty() {
            self.fill_rect(rc, from, fade);
            return;
        }
        let Some(area) = self.visible_part(self.to_device(rc)) else {
            return;
        };
        let gradient = Gradient {
            rect: rc,
            from,
            to,
            direction: GradientDirection::from_code(direction),
        };
        let contour = vec![
            UiPointF::new(area.left as f32, area.top as f32),
            UiPointF::new(area.right as f32, area.top as f32),
            UiPointF::new(area.right as f32, area.bottom as f32),
            UiPointF::new(area.left as f32, area.bottom as f32),
        ];
        self.fill_contours_gradient(&[contour], FillType::Winding, &gradient, fade);
    }

    fn draw_line(&mut self, p1: UiPointF, p2: UiPointF, color: UiColor, width: f32, fade: u8) {
        self.stroke_line(p1, p2, &Stroke::solid(width), color, fade);
    }

    fn draw_line_pen(&mut self, p1: UiPointF, p2: UiPointF, pen: &dyn Pen, fade: u8) {
        if let Some((stroke, color)) = raster_pen(pen) {
            self.stroke_line(p1, p2, &stroke, color, fade);
        }
    }

    fn draw_rect(&mut self, rc: UiRect, color: UiColor, width: f32, line_in_rect: bool, fade: u8) {
        self.stroke_rect(rc, &Stroke::solid(width), line_in_rect, color, fade);
    }

    fn draw_rect_pen(&mut self, rc: UiRect, pen: &dyn Pen, line_in_rect: bool, fade: u8) {
        if let Some((stroke, color)) = raster_pen(pen) {
            self.stroke_rect(rc, &stroke, line_in_rect, color, fade);
        }
    }

    fn draw_round_rect(&mut self, rc: UiRect, rx: f32, ry: f32, color: UiColor, width: f32, fade: u8) {
        self.stroke_round_rect(rc, rx, ry, &Stroke::solid(width), color, fade);
    }

    fn draw_round_rect_pen(&mut self, rc: UiRect, rx: f32, ry: f32, pen: &dyn Pen, fade: u8) {
        if let Some((stroke, color)) = raster_pen(pen) {
            self.stroke_round_rect(rc, rx, ry, &stroke, color, fade);
        }
    }

    fn fill_round_rect(&mut self, rc: UiRect, rx: f32, ry: f32, color: UiColor, fade: u8) {
        let points = self.device_points(&round_rect_points(UiRectF::from(rc), rx, ry));
        self.fill_contours(&[points], FillType::Winding, color, fade);
    }

    fn fill_round_rect_gradient(
        &mut self,
        rc: UiRect,
        rx: f32,
        ry: f32,
        from: UiColor,
        to: UiColor,
        direction: i8,
        fade: u8,
    ) {
        if to.is_empty() {
            self.fill_round_rect(rc, rx, ry, from, fade);
            return;
        }
        let points = self.device_points(&round_rect_points(UiRectF::from(rc), rx, ry));
        let gradient = Gradient {
            rect: rc,
            from,
            to,
            direction: GradientDirection::from_code(direction),
        };
        self.fill_contours_gradient(&[points], FillType::Winding, &gradient, fade);
    }

    fn draw_circle(&mut self, center: UiPoint, radius: i32, color: UiColor, width: f32, fade: u8) {
        let points = self.circle_points(center, radius);
        self.stroke_points(&points, true, &Stroke::solid(width), color, fade);
    }

    fn draw_circle_pen(&mut self, center: UiPoint, radius: i32, pen: &dyn Pen, fade: u8) {
        if let Some((stroke, color)) = raster_pen(pen) {
            let points = self.circle_points(center, radius);
            self.stroke_points(&points, true, &stroke, color, fade);
        }
    }

    fn fill_circle(&mut self, center: UiPoint, radius: i32, color: UiColor, fade: u8) {
        let points = self.device_points(&self.circle_points(center, radius));
        self.fill_contours(&[points], FillType::Winding, color, fade);
    }

    fn draw_arc(
        &mut self,
        rc: UiRect,
        start_angle: f32,
        sweep_angle: f32,
        use_center: bool,
        pen: &dyn Pen,
        gradient: Option<&Gradient>,
    ) {
        let Some((stroke, color)) = raster_pen(pen) else {
            return;
        };
        if rc.is_empty() || sweep_angle == 0.0 {
            return;
        }
        let steps = self.config.arc_steps(sweep_angle);
        let mut points = arc_points(UiRectF::from(rc), start_angle, sweep_angle, steps);
        if use_center {
            let c = rc.center();
            points.insert(0, UiPointF::new(c.x as f32, c.y as f32));
        }
        let device = self.device_points(&points);
        let contours = stroke_contours(&device, use_center, &stroke);
        match gradient {
            Some(gradient) => self.fill_contours_gradient(&contours, FillType::Winding, gradient, 255),
            None => self.fill_contours(&contours, FillType::Winding, color, 255),
        }
    }

    fn draw_path(&mut self, path: &dyn Path, pen: &dyn Pen) {
        let (Some(path), Some((stroke, color))) = (raster_path(path), raster_pen(pen)) else {
            return;
        };
        let contours: Vec<Contour> = path
            .figures()
            .iter()
            .flat_map(|f| stroke_contours(&self.device_points(&f.points), f.closed, &stroke))
            .collect();
        self.fill_contours(&contours, FillType::Winding, color, 255);
    }

    fn fill_path(&mut self, path: &dyn Path, brush: &dyn Brush) {
        let Some(path) = raster_path(path) else {
            return;
        };
        let color = match downcast_ref::<RasterBrush, _>(brush, BackendType::Raster) {
            Ok(brush) => brush.color(),
            Err(e) => {
                warn!("Brush rejected: {}", e);
                return;
            }
        };
        let contours: Vec<Contour> = path.figures().iter().map(|f| self.device_points(&f.points)).collect();
        self.fill_contours(&contours, path.fill_type(), color, 255);
    }

    fn fill_path_gradient(&mut self, path: &dyn Path, rc: UiRect, from: UiColor, to: UiColor, direction: i8) {
        let Some(path) = raster_path(path) else {
            return;
        };
        let contours: Vec<Contour> = path.figures().iter().map(|f| self.device_points(&f.points)).collect();
        if to.is_empty() {
            self.fill_contours(&contours, path.fill_type(), from, 255);
            return;
        }
        let gradient = Gradient {
            rect: rc,
            from,
            to,
            direction: GradientDirection::from_code(direction),
        };
        self.fill_contours_gradient(&contours, path.fill_type(), &gradient, 255);
    }

    fn draw_box_shadow(&mut self, rc: UiRect, radius: UiSize, offset: UiPoint, blur: i32, spread: i32, color: UiColor) {
        if rc.is_empty() || color.a() == 0 {
            return;
        }
        let blur_radius = (blur / 2).max(0);
        let shape = self.to_device(rc.inflate(spread, spread).offset_point(offset));
        if shape.is_empty() {
            trace!("box shadow collapsed by spread {}", spread);
            return;
        }
        let reach = blur_radius * BLUR_PASSES as i32;
        let Some(visible) = self.visible() else {
            return;
        };
        // Pixels further than `reach` from the visible rect cannot bleed into it.
        let Some(area) = shape.inflate(reach, reach).intersect(&visible.inflate(reach, reach)) else {
            return;
        };
        let Some(len) = (area.width() as usize).checked_mul(area.height() as usize) else {
            warn!("box shadow area {:?} too large", area);
            return;
        };

        let points = round_rect_points(UiRectF::from(shape), radius.cx as f32, radius.cy as f32);
        let Some(filled) = rasterize(&[points], FillType::Winding, area) else {
            return;
        };
        // Re-home the coverage into the full blur area so the blur can spread outward.
        let mut mask = CoverageMask {
            rect: area,
            data: vec![0; len],
        };
        filled.for_each(|x, y, c| {
            let idx = (y - area.top) as usize * area.width() as usize + (x - area.left) as usize;
            mask.data[idx] = c;
        });
        if blur_radius > 0 {
            box_blur(&mut mask, blur_radius as usize);
        }
        mask.exclude(&self.to_device(rc));
        self.blend_mask(&mask, color, 255);
    }
}
