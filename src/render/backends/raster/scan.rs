//! Scanline polygon coverage and stroke outlines.
//!
//! Everything that is not an axis-aligned rectangle is turned into closed contours
//! and rasterized here into a [`CoverageMask`]. Each pixel row is sampled at four
//! sub-scanlines; along a sub-scanline the covered span is accumulated with exact
//! fractional coverage at both ends.
//!
//! Strokes are built as the union of per-segment quads plus cap and join pieces. All
//! pieces are wound the same way and rasterized in a single non-zero pass, so
//! overlapping pieces never blend twice.

use crate::geometry::{UiPointF, UiRect, UiRectF};
use crate::render::types::{DashStyle, FillType, LineCap, LineJoin};

use super::outline::ellipse_points;

const SUBSAMPLES: usize = 4;
const MITER_LIMIT: f32 = 4.0;

pub type Contour = Vec<UiPointF>;

/// Per-pixel coverage (0..=255) over a device rectangle.
#[derive(Debug, Clone)]
pub struct CoverageMask {
    pub rect: UiRect,
    pub data: Vec<u8>,
}

impl CoverageMask {
    pub fn coverage(&self, x: i32, y: i32) -> u8 {
        if !self.rect.contains(crate::geometry::UiPoint::new(x, y)) {
            return 0;
        }
        let w = self.rect.width() as usize;
        self.data[(y - self.rect.top) as usize * w + (x - self.rect.left) as usize]
    }

    /// Zero the coverage inside `rc`.
    pub fn exclude(&mut self, rc: &UiRect) {
        let Some(hole) = self.rect.intersect(rc) else {
            return;
        };
        let w = self.rect.width() as usize;
        for y in hole.top..hole.bottom {
            let row = (y - self.rect.top) as usize * w;
            for x in hole.left..hole.right {
                self.data[row + (x - self.rect.left) as usize] = 0;
            }
        }
    }

    /// Visit every pixel with non-zero coverage.
    pub fn for_each(&self, mut f: impl FnMut(i32, i32, u8)) {
        let w = self.rect.width() as usize;
        if w == 0 {
            return;
        }
        for (i, &c) in self.data.iter().enumerate() {
            if c != 0 {
                f(self.rect.left + (i % w) as i32, self.rect.top + (i / w) as i32, c);
            }
        }
    }
}

struct Edge {
    x_top: f32,
    y_top: f32,
    y_bottom: f32,
    dxdy: f32,
    winding: i32,
}

fn bounds_of(contours: &[Contour]) -> Option<UiRectF> {
    let mut it = contours.iter().flatten();
    let first = it.next()?;
    let mut rc = UiRectF::new(first.x, first.y, first.x, first.y);
    for p in it {
        rc.left = rc.left.min(p.x);
        rc.top = rc.top.min(p.y);
        rc.right = rc.right.max(p.x);
        rc.bottom = rc.bottom.max(p.y);
    }
    Some(rc)
}

fn is_inside(winding: i32, rule: FillType) -> bool {
    match rule {
        FillType::Winding => winding != 0,
        FillType::EvenOdd => winding & 1 != 0,
    }
}

fn accumulate_span(acc: &mut [f32], origin: f32, xa: f32, xb: f32) {
    let a = (xa - origin).max(0.0);
    let b = (xb - origin).min(acc.len() as f32);
    if b <= a {
        return;
    }
    let ia = a.floor() as usize;
    let ib = b.floor() as usize;
    if ia == ib {
        acc[ia] += b - a;
        return;
    }
    acc[ia] += (ia + 1) as f32 - a;
    for v in &mut acc[ia + 1..ib] {
        *v += 1.0;
    }
    if ib < acc.len() {
        acc[ib] += b - ib as f32;
    }
}

/// Rasterize closed contours (the last point connects back to the first) within `clip`.
pub fn rasterize(contours: &[Contour], rule: FillType, clip: UiRect) -> Option<CoverageMask> {
    let rect = bounds_of(contours)?.round_out().intersect(&clip)?;

    let mut edges = Vec::new();
    for contour in contours.iter().filter(|c| c.len() >= 3) {
        for (i, &p0) in contour.iter().enumerate() {
            let p1 = contour[(i + 1) % contour.len()];
            if p0.y == p1.y {
                continue;
            }
            let (top, bottom, winding) = if p0.y < p1.y { (p0, p1, 1) } else { (p1, p0, -1) };
            edges.push(Edge {
                x_top: top.x,
                y_top: top.y,
                y_bottom: bottom.y,
                dxdy: (bottom.x - top.x) / (bottom.y - top.y),
                winding,
            });
        }
    }
    if edges.is_empty() {
        return None;
    }

    let width = rect.width() as usize;
    let height = rect.height() as usize;
    let mut data = vec![0u8; width * height];
    let mut acc = vec![0f32; width];
    let mut crossings: Vec<(f32, i32)> = Vec::new();
    let origin = rect.left as f32;

    for row in 0..height {
        acc.fill(0.0);
        let y = (rect.top + row as i32) as f32;
        for s in 0..SUBSAMPLES {
            let sy = y + (s as f32 + 0.5) / SUBSAMPLES as f32;
            crossings.clear();
            crossings.extend(
                edges
                    .iter()
                    .filter(|e| sy >= e.y_top && sy < e.y_bottom)
                    .map(|e| (e.x_top + (sy - e.y_top) * e.dxdy, e.winding)),
            );
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut winding = 0;
            let mut span_start = 0.0;
            for &(x, w) in &crossings {
                let was_inside = is_inside(winding, rule);
                winding += w;
                let now_inside = is_inside(winding, rule);
                if !was_inside && now_inside {
                    span_start = x;
                } else if was_inside && !now_inside {
                    accumulate_span(&mut acc, origin, span_start, x);
                }
            }
        }
        let out = &mut data[row * width..(row + 1) * width];
        for (dst, a) in out.iter_mut().zip(acc.iter()) {
            *dst = ((a / SUBSAMPLES as f32).min(1.0) * 255.0 + 0.5) as u8;
        }
    }

    Some(CoverageMask { rect, data })
}

fn signed_area(contour: &[UiPointF]) -> f32 {
    let n = contour.len();
    (0..n)
        .map(|i| {
            let a = contour[i];
            let b = contour[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f32>()
        / 2.0
}

/// Push `contour` wound positively; degenerate pieces are dropped.
fn push_oriented(out: &mut Vec<Contour>, mut contour: Contour) {
    let area = signed_area(&contour);
    if area.abs() < 1e-6 {
        return;
    }
    if area < 0.0 {
        contour.reverse();
    }
    out.push(contour);
}

/// Stroke parameters, usually read from a pen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub start_cap: LineCap,
    pub end_cap: LineCap,
    pub dash_cap: LineCap,
    pub join: LineJoin,
    pub dash: DashStyle,
}

impl Stroke {
    pub fn solid(width: f32) -> Self {
        Self {
            width,
            start_cap: LineCap::Butt,
            end_cap: LineCap::Butt,
            dash_cap: LineCap::Butt,
            join: LineJoin::Miter,
            dash: DashStyle::Solid,
        }
    }
}

fn sub(a: UiPointF, b: UiPointF) -> UiPointF {
    UiPointF::new(a.x - b.x, a.y - b.y)
}

fn length(v: UiPointF) -> f32 {
    (v.x * v.x + v.y * v.y).sqrt()
}

fn scaled(v: UiPointF, k: f32) -> UiPointF {
    UiPointF::new(v.x * k, v.y * k)
}

fn add(a: UiPointF, b: UiPointF) -> UiPointF {
    UiPointF::new(a.x + b.x, a.y + b.y)
}

fn dedup(points: &[UiPointF]) -> Vec<UiPointF> {
    let mut out: Vec<UiPointF> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last().map_or(true, |&q| length(sub(p, q)) > 1e-4) {
            out.push(p);
        }
    }
    out
}

/// Split a polyline into its "on" dashes.
fn dash_polyline(points: &[UiPointF], closed: bool, pattern: &[f32], width: f32) -> Vec<Vec<UiPointF>> {
    let unit = width.max(1.0);
    let lengths: Vec<f32> = pattern.iter().map(|l| l * unit).collect();
    let mut pts = points.to_vec();
    if closed {
        if let Some(&first) = points.first() {
            pts.push(first);
        }
    }

    let mut out = Vec::new();
    let mut current: Vec<UiPointF> = Vec::new();
    let mut idx = 0;
    let mut left = lengths[0];
    if let Some(&first) = pts.first() {
        current.push(first);
    }
    for seg in pts.windows(2) {
        let (a, b) = (seg[0], seg[1]);
        let seg_len = length(sub(b, a));
        if seg_len <= 0.0 {
            continue;
        }
        let mut t = 0.0;
        while seg_len - t > left {
            t += left;
            let p = add(a, scaled(sub(b, a), t / seg_len));
            if idx % 2 == 0 {
                current.push(p);
                out.push(std::mem::take(&mut current));
            } else {
                current = vec![p];
            }
            idx = (idx + 1) % lengths.len();
            left = lengths[idx];
        }
        left -= seg_len - t;
        if idx % 2 == 0 {
            current.push(b);
        }
    }
    if idx % 2 == 0 && current.len() >= 2 {
        out.push(current);
    }
    out
}

fn segment_quad(a: UiPointF, b: UiPointF, hw: f32, extend_start: f32, extend_end: f32) -> Contour {
    let d = sub(b, a);
    let len = length(d);
    let dir = scaled(d, 1.0 / len);
    let n = UiPointF::new(-dir.y * hw, dir.x * hw);
    let a = sub(a, scaled(dir, extend_start));
    let b = add(b, scaled(dir, extend_end));
    vec![add(a, n), add(b, n), sub(b, n), sub(a, n)]
}

fn cap_extension(cap: LineCap, hw: f32) -> f32 {
    if cap == LineCap::Square {
        hw
    } else {
        0.0
    }
}

fn round_piece(center: UiPointF, hw: f32) -> Contour {
    let steps = ((hw * 4.0) as usize).clamp(8, 64);
    ellipse_points(center.x, center.y, hw, hw, steps)
}

fn join_pieces(out: &mut Vec<Contour>, prev: UiPointF, v: UiPointF, next: UiPointF, hw: f32, join: LineJoin) {
    let d1 = sub(v, prev);
    let d2 = sub(next, v);
    let (l1, l2) = (length(d1), length(d2));
    if l1 <= 0.0 || l2 <= 0.0 {
        return;
    }
    let cross = d1.x * d2.y - d1.y * d2.x;
    if cross.abs() < 1e-6 {
        return;
    }
    if join == LineJoin::Round {
        push_oriented(out, round_piece(v, hw));
        return;
    }
    let side = if cross > 0.0 { -1.0 } else { 1.0 };
    let n1 = UiPointF::new(-d1.y / l1 * hw * side, d1.x / l1 * hw * side);
    let n2 = UiPointF::new(-d2.y / l2 * hw * side, d2.x / l2 * hw * side);
    let p1 = add(v, n1);
    let p2 = add(v, n2);
    if join == LineJoin::Miter {
        let m = add(n1, n2);
        let m_len = length(m);
        if m_len > 0.0 {
            let cos_half = (m.x * n1.x + m.y * n1.y) / (m_len * hw);
            if cos_half > 0.0 && 1.0 / cos_half <= MITER_LIMIT {
                let tip = add(v, scaled(m, hw / cos_half / m_len));
                push_oriented(out, vec![v, p1, tip, p2]);
                return;
            }
        }
    }
    push_oriented(out, vec![v, p1, p2]);
}

fn stroke_open(out: &mut Vec<Contour>, pts: &[UiPointF], hw: f32, start_cap: LineCap, end_cap: LineCap, join: LineJoin) {
    if pts.len() < 2 {
        if let (Some(&p), LineCap::Round) = (pts.first(), start_cap) {
            push_oriented(out, round_piece(p, hw));
        }
        return;
    }
    let last = pts.len() - 2;
    for (i, seg) in pts.windows(2).enumerate() {
        let ext_start = if i == 0 { cap_extension(start_cap, hw) } else { 0.0 };
        let ext_end = if i == last { cap_extension(end_cap, hw) } else { 0.0 };
        push_oriented(out, segment_quad(seg[0], seg[1], hw, ext_start, ext_end));
    }
    for i in 1..pts.len() - 1 {
        join_pieces(out, pts[i - 1], pts[i], pts[i + 1], hw, join);
    }
    if start_cap == LineCap::Round {
        push_oriented(out, round_piece(pts[0], hw));
    }
    if end_cap == LineCap::Round {
        push_oriented(out, round_piece(pts[pts.len() - 1], hw));
    }
}

fn stroke_closed(out: &mut Vec<Contour>, pts: &[UiPointF], hw: f32, join: LineJoin) {
    let n = pts.len();
    if n < 2 {
        return;
    }
    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        if length(sub(b, a)) > 0.0 {
            push_oriented(out, segment_quad(a, b, hw, 0.0, 0.0));
        }
    }
    for i in 0..n {
        join_pieces(out, pts[(i + n - 1) % n], pts[i], pts[(i + 1) % n], hw, join);
    }
}

/// Outline of `points` stroked with `stroke`, ready for a non-zero fill.
pub fn stroke_contours(points: &[UiPointF], closed: bool, stroke: &Stroke) -> Vec<Contour> {
    let pts = dedup(points);
    let hw = stroke.width.max(1.0) / 2.0;
    let mut out = Vec::new();
    if pts.is_empty() {
        return out;
    }
    match stroke.dash.pattern() {
        None if closed && pts.len() > 2 => stroke_closed(&mut out, &pts, hw, stroke.join),
        None => stroke_open(&mut out, &pts, hw, stroke.start_cap, stroke.end_cap, stroke.join),
        Some(pattern) => {
            let dashes = dash_polyline(&pts, closed, pattern, stroke.width);
            let count = dashes.len();
            for (i, dash) in dashes.iter().enumerate() {
                let start = if i == 0 && !closed { stroke.start_cap } else { stroke.dash_cap };
                let end = if i + 1 == count && !closed { stroke.end_cap } else { stroke.dash_cap };
                stroke_open(&mut out, dash, hw, start, end, stroke.join);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(l: f32, t: f32, r: f32, b: f32) -> Contour {
        vec![UiPointF::new(l, t), UiPointF::new(r, t), UiPointF::new(r, b), UiPointF::new(l, b)]
    }

    #[test]
    fn axis_aligned_square_is_fully_covered() {
        let mask = rasterize(&[square(2.0, 2.0, 6.0, 5.0)], FillType::Winding, UiRect::new(0, 0, 10, 10)).unwrap();
        assert_eq!(mask.rect, UiRect::new(2, 2, 6, 5));
        assert!(mask.data.iter().all(|&c| c == 255));
        assert_eq!(mask.coverage(1, 1), 0);
    }

    #[test]
    fn half_pixel_edges_give_half_coverage() {
        let mask = rasterize(&[square(0.5, 0.0, 2.0, 1.0)], FillType::Winding, UiRect::new(0, 0, 4, 4)).unwrap();
        assert_eq!(mask.coverage(0, 0), 128);
        assert_eq!(mask.coverage(1, 0), 255);
    }

    #[test]
    fn even_odd_punches_holes() {
        let outer = square(0.0, 0.0, 8.0, 8.0);
        let inner = square(2.0, 2.0, 6.0, 6.0);
        let clip = UiRect::new(0, 0, 8, 8);
        let eo = rasterize(&[outer.clone(), inner.clone()], FillType::EvenOdd, clip).unwrap();
        assert_eq!(eo.coverage(4, 4), 0);
        assert_eq!(eo.coverage(1, 1), 255);
        // Same winding direction: the non-zero rule fills the hole.
        let nz = rasterize(&[outer, inner], FillType::Winding, clip).unwrap();
        assert_eq!(nz.coverage(4, 4), 255);
    }

    #[test]
    fn clip_limits_mask() {
        let mask = rasterize(&[square(0.0, 0.0, 8.0, 8.0)], FillType::Winding, UiRect::new(4, 4, 6, 20)).unwrap();
        assert_eq!(mask.rect, UiRect::new(4, 4, 6, 8));
        assert!(rasterize(&[square(0.0, 0.0, 2.0, 2.0)], FillType::Winding, UiRect::new(5, 5, 9, 9)).is_none());
    }

    #[test]
    fn stroke_pieces_share_orientation() {
        let pts = [UiPointF::new(1.0, 1.0), UiPointF::new(8.0, 1.0), UiPointF::new(8.0, 8.0)];
        let contours = stroke_contours(&pts, false, &Stroke::solid(3.0));
        assert!(!contours.is_empty());
        assert!(contours.iter().all(|c| signed_area(c) > 0.0));
        let mask = rasterize(&contours, FillType::Winding, UiRect::new(0, 0, 12, 12)).unwrap();
        // The corner where the quads overlap is covered once, not cancelled.
        assert_eq!(mask.coverage(8, 1), 255);
        // Outer corner filled by the miter join.
        assert_eq!(mask.coverage(8, 0), 255);
    }

    #[test]
    fn dashes_leave_gaps() {
        let pts = [UiPointF::new(0.0, 0.5), UiPointF::new(16.0, 0.5)];
        let dashes = dash_polyline(&pts, false, &[3.0, 1.0], 1.0);
        assert_eq!(dashes.len(), 4);
        assert_eq!(dashes[0], vec![UiPointF::new(0.0, 0.5), UiPointF::new(3.0, 0.5)]);
        assert_eq!(dashes[1][0], UiPointF::new(4.0, 0.5));
    }

    #[test]
    fn square_cap_extends_line() {
        let pts = [UiPointF::new(2.0, 5.0), UiPointF::new(6.0, 5.0)];
        let mut stroke = Stroke::solid(2.0);
        let butt = rasterize(&stroke_contours(&pts, false, &stroke), FillType::Winding, UiRect::new(0, 0, 10, 10)).unwrap();
        stroke.start_cap = LineCap::Square;
        stroke.end_cap = LineCap::Square;
        let square = rasterize(&stroke_contours(&pts, false, &stroke), FillType::Winding, UiRect::new(0, 0, 10, 10)).unwrap();
        assert_eq!(butt.coverage(1, 4), 0);
        assert_eq!(square.coverage(1, 4), 255);
        assert_eq!(square.coverage(6, 4), 255);
    }
}
