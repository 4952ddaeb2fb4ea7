use std::any::Any;

use crate::geometry::{UiPoint, UiPointF, UiRectF};
use crate::render::backend::{BackendType, Matrix, Path, Pen, RenderObject};
use crate::render::types::FillType;

use super::outline::{arc_points, ellipse_points, flatten_cubic};

/// One subpath, already flattened to line segments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Figure {
    pub points: Vec<UiPointF>,
    pub closed: bool,
}

/// A path is a list of flattened figures. Curves are flattened when added, so a
/// transform applies to the polyline rather than to control points.
#[derive(Debug, Clone, Default)]
pub struct RasterPath {
    fill_type: FillType,
    figures: Vec<Figure>,
}

impl RasterPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn figures(&self) -> &[Figure] {
        &self.figures
    }

    /// The open figure to extend, connected to `start`.
    fn open_figure(&mut self, start: UiPointF) -> &mut Vec<UiPointF> {
        let needs_new = self.figures.last().map_or(true, |f| f.closed);
        if needs_new {
            self.figures.push(Figure::default());
        }
        let len = self.figures.len();
        let points = &mut self.figures[len - 1].points;
        if points.last() != Some(&start) {
            points.push(start);
        }
        points
    }

    fn push_closed(&mut self, points: Vec<UiPointF>) {
        if points.len() >= 2 {
            self.figures.push(Figure { points, closed: true });
        }
    }
}

fn ellipse_steps(rc: &UiRectF) -> usize {
    ((rc.width().abs() + rc.height().abs()) as usize).clamp(16, 128)
}

impl RenderObject for RasterPath {
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

impl Path for RasterPath {
    fn fill_type(&self) -> FillType {
        self.fill_type
    }

    fn set_fill_type(&mut self, fill_type: FillType) {
        self.fill_type = fill_type;
    }

    fn add_line(&mut self, p1: UiPointF, p2: UiPointF) {
        self.open_figure(p1).push(p2);
    }

    fn add_lines(&mut self, points: &[UiPointF]) {
        if let Some((&first, rest)) = points.split_first() {
            self.open_figure(first).extend_from_slice(rest);
        }
    }

    fn add_bezier(&mut self, p1: UiPointF, p2: UiPointF, p3: UiPointF, p4: UiPointF) {
        let points = self.open_figure(p1);
        flatten_cubic(p1, p2, p3, p4, points);
    }

    fn add_beziers(&mut self, points: &[UiPointF]) {
        let Some((&first, rest)) = points.split_first() else {
            return;
        };
        let figure = self.open_figure(first);
        let mut start = first;
        for seg in rest.chunks_exact(3) {
            flatten_cubic(start, seg[0], seg[1], seg[2], figure);
            start = seg[2];
        }
    }

    fn add_rect(&mut self, rc: UiRectF) {
        self.push_closed(vec![
            UiPointF::new(rc.left, rc.top),
            UiPointF::new(rc.right, rc.top),
            UiPointF::new(rc.right, rc.bottom),
            UiPointF::new(rc.left, rc.bottom),
        ]);
    }

    fn add_ellipse(&mut self, rc: UiRectF) {
        let points = ellipse_points(
            (rc.left + rc.right) / 2.0,
            (rc.top + rc.bottom) / 2.0,
            rc.width() / 2.0,
            rc.height() / 2.0,
            ellipse_steps(&rc),
        );
        self.push_closed(points);
    }

    fn add_arc(&mut self, rc: UiRectF, start_angle: f32, sweep_angle: f32) {
        let steps = ((sweep_angle.abs() / 6.0) as usize).max(12);
        let pts = arc_points(rc, start_angle, sweep_angle, steps);
        self.add_lines(&pts);
    }

    fn add_polygon(&mut self, points: &[UiPoint]) {
        self.push_closed(points.iter().map(|&p| UiPointF::from(p)).collect());
    }

    fn add_polygon_f(&mut self, points: &[UiPointF]) {
        self.push_closed(points.to_vec());
    }

    fn transform(&mut self, matrix: &dyn Matrix) {
        for p in self.figures.iter_mut().flat_map(|f| f.points.iter_mut()) {
            *p = matrix.transform_point(*p);
        }
    }

    fn bounds(&self, pen: Option<&dyn Pen>) -> UiRectF {
        let mut it = self.figures.iter().flat_map(|f| f.points.iter());
        let Some(first) = it.next() else {
            return UiRectF::default();
        };
        let mut rc = UiRectF::new(first.x, first.y, first.x, first.y);
        for p in it {
            rc.left = rc.left.min(p.x);
            rc.top = rc.top.min(p.y);
            rc.right = rc.right.max(p.x);
            rc.bottom = rc.bottom.max(p.y);
        }
        match pen {
            Some(pen) => rc.inflate(pen.width() / 2.0),
            None => rc,
        }
    }

    fn close(&mut self) {
        if let Some(figure) = self.figures.last_mut() {
            figure.closed = true;
        }
    }

    fn reset(&mut self) {
        self.figures.clear();
    }

    fn clone_path(&self) -> Box<dyn Path> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::UiColor;
    use crate::render::backends::raster::matrix::RasterMatrix;
    use crate::render::backends::raster::pen::RasterPen;

    #[test]
    fn lines_join_the_open_figure() {
        let mut path = RasterPath::new();
        path.add_line(UiPointF::new(0.0, 0.0), UiPointF::new(10.0, 0.0));
        path.add_line(UiPointF::new(10.0, 0.0), UiPointF::new(10.0, 10.0));
        path.close();
        path.add_line(UiPointF::new(20.0, 0.0), UiPointF::new(30.0, 0.0));
        assert_eq!(path.figures().len(), 2);
        assert_eq!(path.figures()[0].points.len(), 3);
        assert!(path.figures()[0].closed);
        assert!(!path.figures()[1].closed);
    }

    #[test]
    fn bounds_include_half_pen_width() {
        let mut path = RasterPath::new();
        path.add_rect(UiRectF::new(2.0, 3.0, 12.0, 8.0));
        assert_eq!(path.bounds(None), UiRectF::new(2.0, 3.0, 12.0, 8.0));
        let pen = RasterPen::new(UiColor::BLACK, 4.0);
        assert_eq!(path.bounds(Some(&pen)), UiRectF::new(0.0, 1.0, 14.0, 10.0));
    }

    #[test]
    fn transform_moves_every_point() {
        let mut path = RasterPath::new();
        path.add_polygon(&[UiPoint::new(0, 0), UiPoint::new(4, 0), UiPoint::new(4, 4)]);
        let mut m = RasterMatrix::identity();
        m.translate(UiPointF::new(5.0, 1.0));
        path.transform(&m);
        assert_eq!(path.bounds(None), UiRectF::new(5.0, 1.0, 9.0, 5.0));
    }

    #[test]
    fn clone_is_independent() {
        let mut path = RasterPath::new();
        path.add_ellipse(UiRectF::new(0.0, 0.0, 10.0, 10.0));
        let copy = path.clone_path();
        path.reset();
        assert!(path.figures().is_empty());
        assert_eq!(copy.bounds(None).width().round(), 10.0);
        assert_eq!(copy.fill_type(), FillType::EvenOdd);
    }
}
