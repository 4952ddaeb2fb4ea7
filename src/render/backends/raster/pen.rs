use std::any::Any;

use crate::color::UiColor;
use crate::render::backend::{BackendType, Brush, Pen, RenderObject};
use crate::render::types::{DashStyle, LineCap, LineJoin};

use super::scan::Stroke;

#[derive(Debug, Clone, PartialEq)]
pub struct RasterPen {
    color: UiColor,
    width: f32,
    start_cap: LineCap,
    end_cap: LineCap,
    dash_cap: LineCap,
    line_join: LineJoin,
    dash_style: DashStyle,
}

impl RasterPen {
    pub fn new(color: UiColor, width: f32) -> Self {
        Self {
            color,
            width,
            start_cap: LineCap::Butt,
            end_cap: LineCap::Butt,
            dash_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            dash_style: DashStyle::Solid,
        }
    }
}

/// Stroke parameters of any pen, whichever backend made it.
pub fn stroke_of(pen: &dyn Pen) -> Stroke {
    Stroke {
        width: pen.width(),
        start_cap: pen.start_cap(),
        end_cap: pen.end_cap(),
        dash_cap: pen.dash_cap(),
        join: pen.line_join(),
        dash: pen.dash_style(),
    }
}

impl RenderObject for RasterPen {
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

impl Pen for RasterPen {
    fn width(&self) -> f32 {
        self.width
    }

    fn set_width(&mut self, width: f32) {
        self.width = width;
    }

    fn color(&self) -> UiColor {
        self.color
    }

    fn set_color(&mut self, color: UiColor) {
        self.color = color;
    }

    fn start_cap(&self) -> LineCap {
        self.start_cap
    }

    fn set_start_cap(&mut self, cap: LineCap) {
        self.start_cap = cap;
    }

    fn end_cap(&self) -> LineCap {
        self.end_cap
    }

    fn set_end_cap(&mut self, cap: LineCap) {
        self.end_cap = cap;
    }

    fn dash_cap(&self) -> LineCap {
        self.dash_cap
    }

    fn set_dash_cap(&mut self, cap: LineCap) {
        self.dash_cap = cap;
    }

    fn line_join(&self) -> LineJoin {
        self.line_join
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.line_join = join;
    }

    fn dash_style(&self) -> DashStyle {
        self.dash_style
    }

    fn set_dash_style(&mut self, style: DashStyle) {
        self.dash_style = style;
    }

    fn clone_pen(&self) -> Box<dyn Pen> {
        Box::new(self.clone())
    }
}

/// Solid color brush.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterBrush {
    color: UiColor,
}

impl RasterBrush {
    pub fn new(color: UiColor) -> Self {
        Self { color }
    }
}

impl RenderObject for RasterBrush {
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

impl Brush for RasterBrush {
    fn color(&self) -> UiColor {
        self.color
    }

    fn clone_brush(&self) -> Box<dyn Brush> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloned_pen_is_independent() {
        let mut pen = RasterPen::new(UiColor::RED, 2.0);
        pen.set_dash_style(DashStyle::Dot);
        let copy = pen.clone_pen();
        pen.set_width(5.0);
        pen.set_color(UiColor::BLUE);
        assert_eq!(copy.width(), 2.0);
        assert_eq!(copy.color(), UiColor::RED);
        assert_eq!(copy.dash_style(), DashStyle::Dot);
    }

    #[test]
    fn stroke_reads_every_pen_field() {
        let mut pen = RasterPen::new(UiColor::BLACK, 3.0);
        pen.set_start_cap(LineCap::Round);
        pen.set_end_cap(LineCap::Square);
        pen.set_line_join(LineJoin::Bevel);
        let stroke = stroke_of(&pen);
        assert_eq!(stroke.width, 3.0);
        assert_eq!(stroke.start_cap, LineCap::Round);
        assert_eq!(stroke.end_cap, LineCap::Square);
        assert_eq!(stroke.join, LineJoin::Bevel);
    }

    #[test]
    fn brush_clone_keeps_color() {
        let brush = RasterBrush::new(UiColor::GREEN);
        assert_eq!(brush.clone_brush().color(), UiColor::GREEN);
    }
}
