//! Polyline approximations of curves.

use crate::geometry::{UiPointF, UiRectF};

/// Closed polygon with `steps` vertices on an ellipse.
pub fn ellipse_points(cx: f32, cy: f32, rx: f32, ry: f32, steps: usize) -> Vec<UiPointF> {
    let steps = steps.max(3);
    (0..steps)
        .map(|i| {
            let t = i as f32 / steps as f32 * std::f32::consts::TAU;
            UiPointF::new(cx + rx * t.cos(), cy + ry * t.sin())
        })
        .collect()
}

/// Open polyline of `steps + 1` points along the ellipse inscribed in `rc`.
/// Angles are degrees, clockwise from the positive x axis.
pub fn arc_points(rc: UiRectF, start_angle: f32, sweep_angle: f32, steps: usize) -> Vec<UiPointF> {
    let steps = steps.max(1);
    let cx = (rc.left + rc.right) / 2.0;
    let cy = (rc.top + rc.bottom) / 2.0;
    let rx = rc.width() / 2.0;
    let ry = rc.height() / 2.0;
    (0..=steps)
        .map(|i| {
            let deg = start_angle + sweep_angle * i as f32 / steps as f32;
            let t = deg.to_radians();
            UiPointF::new(cx + rx * t.cos(), cy + ry * t.sin())
        })
        .collect()
}

fn corner_steps(rx: f32, ry: f32) -> usize {
    ((rx.max(ry) / 2.0) as usize).clamp(2, 16)
}

/// Closed polygon of a rounded rectangle; radii are clamped to half the size.
pub fn round_rect_points(rc: UiRectF, rx: f32, ry: f32) -> Vec<UiPointF> {
    let rx = rx.clamp(0.0, rc.width() / 2.0);
    let ry = ry.clamp(0.0, rc.height() / 2.0);
    if rx <= 0.0 || ry <= 0.0 {
        return vec![
            UiPointF::new(rc.left, rc.top),
            UiPointF::new(rc.right, rc.top),
            UiPointF::new(rc.right, rc.bottom),
            UiPointF::new(rc.left, rc.bottom),
        ];
    }
    let steps = corner_steps(rx, ry);
    let corners = [
        (rc.right - rx, rc.top + ry, 270.0f32),
        (rc.right - rx, rc.bottom - ry, 0.0),
        (rc.left + rx, rc.bottom - ry, 90.0),
        (rc.left + rx, rc.top + ry, 180.0),
    ];
    let mut out = Vec::with_capacity(4 * (steps + 1));
    for (cx, cy, start) in corners {
        for i in 0..=steps {
            let t = (start + 90.0 * i as f32 / steps as f32).to_radians();
            out.push(UiPointF::new(cx + rx * t.cos(), cy + ry * t.sin()));
        }
    }
    out
}

fn distance(a: UiPointF, b: UiPointF) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Append a cubic Bezier to `out`, excluding its start point.
pub fn flatten_cubic(p0: UiPointF, p1: UiPointF, p2: UiPointF, p3: UiPointF, out: &mut Vec<UiPointF>) {
    let hull = distance(p0, p1) + distance(p1, p2) + distance(p2, p3);
    let steps = ((hull / 4.0) as usize).clamp(4, 64);
    for i in 1..=steps {
        let t = i as f32 / steps as f32;
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        out.push(UiPointF::new(
            a * p0.x + b * p1.x + c * p2.x + d * p3.x,
            a * p0.y + b * p1.y + c * p2.y + d * p3.y,
        ));
    }
}

/// Append a quadratic Bezier to `out`, excluding its start point.
pub fn flatten_quad(p0: UiPointF, p1: UiPointF, p2: UiPointF, out: &mut Vec<UiPointF>) {
    let hull = distance(p0, p1) + distance(p1, p2);
    let steps = ((hull / 4.0) as usize).clamp(2, 32);
    for i in 1..=steps {
        let t = i as f32 / steps as f32;
        let mt = 1.0 - t;
        out.push(UiPointF::new(
            mt * mt * p0.x + 2.0 * mt * t * p1.x + t * t * p2.x,
            mt * mt * p0.y + 2.0 * mt * t * p1.y + t * t * p2.y,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: UiPointF, b: UiPointF) -> bool {
        distance(a, b) < 1e-3
    }

    #[test]
    fn arc_runs_clockwise_in_y_down_space() {
        let pts = arc_points(UiRectF::new(0.0, 0.0, 20.0, 20.0), 0.0, 90.0, 12);
        assert_eq!(pts.len(), 13);
        assert!(close(pts[0], UiPointF::new(20.0, 10.0)));
        assert!(close(pts[12], UiPointF::new(10.0, 20.0)));
    }

    #[test]
    fn cubic_ends_on_last_control_point() {
        let mut out = vec![];
        let p3 = UiPointF::new(30.0, 0.0);
        flatten_cubic(UiPointF::new(0.0, 0.0), UiPointF::new(10.0, 20.0), UiPointF::new(20.0, 20.0), p3, &mut out);
        assert!(close(*out.last().unwrap(), p3));
        assert!(out.len() >= 4);
    }

    #[test]
    fn round_rect_without_radius_is_a_rect() {
        let pts = round_rect_points(UiRectF::new(0.0, 0.0, 10.0, 5.0), 0.0, 3.0);
        assert_eq!(pts.len(), 4);
        let rounded = round_rect_points(UiRectF::new(0.0, 0.0, 10.0, 5.0), 20.0, 20.0);
        assert!(rounded.iter().all(|p| p.x >= -1e-3 && p.x <= 10.001 && p.y >= -1e-3 && p.y <= 5.001));
    }
}
