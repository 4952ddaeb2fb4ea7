use std::any::Any;

use crate::geometry::UiPointF;
use crate::render::backend::{BackendType, Matrix, RenderObject};

/// Affine transform in row-vector form: `x' = m11*x + m21*y + dx`, `y' = m12*x + m22*y + dy`.
///
/// Every operation prepends, so the most recent call acts on points first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterMatrix {
    m: [f32; 6],
}

impl Default for RasterMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

fn multiply(a: &[f32; 6], b: &[f32; 6]) -> [f32; 6] {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

impl RasterMatrix {
    pub const fn identity() -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        }
    }

    pub fn from_elements(m: [f32; 6]) -> Self {
        Self { m }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// True when the transform keeps rectangles axis-aligned.
    pub fn is_axis_aligned(&self) -> bool {
        self.m[1] == 0.0 && self.m[2] == 0.0
    }

    fn prepend(&mut self, op: [f32; 6]) {
        self.m = multiply(&op, &self.m);
    }

    pub fn invert(&self) -> Option<RasterMatrix> {
        let [m11, m12, m21, m22, dx, dy] = self.m;
        let det = m11 * m22 - m12 * m21;
        if det.abs() < 1e-9 {
            return None;
        }
        let i11 = m22 / det;
        let i12 = -m12 / det;
        let i21 = -m21 / det;
        let i22 = m11 / det;
        Some(Self {
            m: [i11, i12, i21, i22, -(dx * i11 + dy * i21), -(dx * i12 + dy * i22)],
        })
    }
}

impl RenderObject for RasterMatrix {
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

impl Matrix for RasterMatrix {
    fn translate(&mut self, offset: UiPointF) {
        self.prepend([1.0, 0.0, 0.0, 1.0, offset.x, offset.y]);
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.prepend([sx, 0.0, 0.0, sy, 0.0, 0.0]);
    }

    fn rotate(&mut self, angle: f32) {
        let (sin, cos) = angle.to_radians().sin_cos();
        self.prepend([cos, sin, -sin, cos, 0.0, 0.0]);
    }

    fn rotate_at(&mut self, angle: f32, center: UiPointF) {
        self.translate(center);
        self.rotate(angle);
        self.translate(UiPointF::new(-center.x, -center.y));
    }

    fn transform_point(&self, pt: UiPointF) -> UiPointF {
        let [m11, m12, m21, m22, dx, dy] = self.m;
        UiPointF::new(m11 * pt.x + m21 * pt.y + dx, m12 * pt.x + m22 * pt.y + dy)
    }

    fn elements(&self) -> [f32; 6] {
        self.m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn near(a: UiPointF, b: UiPointF) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
    }

    #[test]
    fn operations_prepend() {
        let mut m = RasterMatrix::identity();
        m.translate(UiPointF::new(10.0, 5.0));
        m.rotate(90.0);
        // Rotation runs first, then the translation.
        assert!(near(m.transform_point(UiPointF::new(1.0, 0.0)), UiPointF::new(10.0, 6.0)));
    }

    #[test]
    fn rotate_at_keeps_center_fixed() {
        let mut m = RasterMatrix::identity();
        let c = UiPointF::new(50.0, 20.0);
        m.rotate_at(33.0, c);
        assert!(near(m.transform_point(c), c));
    }

    #[test]
    fn inverse_undoes_transform() {
        let mut m = RasterMatrix::identity();
        m.translate(UiPointF::new(3.0, -7.0));
        m.scale(2.0, 4.0);
        m.rotate(30.0);
        let inv = m.invert().unwrap();
        let p = UiPointF::new(12.5, -3.0);
        assert!(near(inv.transform_point(m.transform_point(p)), p));
        assert!(RasterMatrix::from_elements([0.0; 6]).invert().is_none());
    }
}
