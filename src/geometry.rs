//! Integer and float geometry used by every render call.
//!
//! Rectangles are half-open: a `UiRect` with `left = 0, right = 10` covers the ten
//! pixel columns `0..10`. A rectangle is empty when its width or height is not
//! positive, and empty rectangles never intersect anything.
//!
//! # Example
//!
//! ```rust
//! use uirender::geometry::{UiPadding, UiRect};
//!
//! let rc = UiRect::new(0, 0, 100, 40);
//! let inner = rc.deflate_padding(&UiPadding::new(4, 4, 4, 4));
//! assert_eq!(inner, UiRect::new(4, 4, 96, 36));
//!
//! let clipped = rc.intersect(&UiRect::new(90, 30, 200, 200));
//! assert_eq!(clipped, Some(UiRect::new(90, 30, 100, 40)));
//! ```

use std::fmt::Debug;

#[derive(Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct UiPoint {
    pub x: i32,
    pub y: i32,
}

impl Debug for UiPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl UiPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UiPointF {
    pub x: f32,
    pub y: f32,
}

impl UiPointF {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<UiPoint> for UiPointF {
    fn from(p: UiPoint) -> Self {
        Self::new(p.x as f32, p.y as f32)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct UiSize {
    pub cx: i32,
    pub cy: i32,
}

impl UiSize {
    pub const fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }

    pub fn is_empty(&self) -> bool {
        self.cx <= 0 || self.cy <= 0
    }
}

/// Per-edge insets: nine-patch corners, shadow padding, image padding.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct UiPadding {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl UiPadding {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn is_zero(&self) -> bool {
        self.left == 0 && self.top == 0 && self.right == 0 && self.bottom == 0
    }
}

#[derive(Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct UiRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Debug for UiRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "UiRect {{ left: {}, top: {}, right: {}, bottom: {} }}",
            self.left, self.top, self.right, self.bottom
        )
    }
}

impl UiRect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub const fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn size(&self) -> UiSize {
        UiSize::new(self.width(), self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// All four coordinates are zero.
    pub fn is_zero(&self) -> bool {
        self.left == 0 && self.top == 0 && self.right == 0 && self.bottom == 0
    }

    pub fn center(&self) -> UiPoint {
        UiPoint::new((self.left + self.right) / 2, (self.top + self.bottom) / 2)
    }

    pub fn contains(&self, pt: UiPoint) -> bool {
        pt.x >= self.left && pt.x < self.right && pt.y >= self.top && pt.y < self.bottom
    }

    /// Returns true if `other` lies completely within this rectangle.
    pub fn contains_rect(&self, other: &UiRect) -> bool {
        !other.is_empty()
            && other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }

    /// Overlap of two rectangles, `None` when it is empty.
    pub fn intersect(&self, other: &UiRect) -> Option<UiRect> {
        let rc = UiRect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        if rc.is_empty() {
            None
        } else {
            Some(rc)
        }
    }

    pub fn intersects(&self, other: &UiRect) -> bool {
        self.intersect(other).is_some()
    }

    /// Smallest rectangle covering both; empty inputs are ignored.
    pub fn union(&self, other: &UiRect) -> UiRect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        UiRect::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    pub fn offset(&self, dx: i32, dy: i32) -> UiRect {
        UiRect::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }

    pub fn offset_point(&self, pt: UiPoint) -> UiRect {
        self.offset(pt.x, pt.y)
    }

    pub fn inflate(&self, dx: i32, dy: i32) -> UiRect {
        UiRect::new(self.left - dx, self.top - dy, self.right + dx, self.bottom + dy)
    }

    pub fn deflate(&self, dx: i32, dy: i32) -> UiRect {
        self.inflate(-dx, -dy)
    }

    pub fn deflate_padding(&self, padding: &UiPadding) -> UiRect {
        UiRect::new(
            self.left + padding.left,
            self.top + padding.top,
            self.right - padding.right,
            self.bottom - padding.bottom,
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UiRectF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl UiRectF {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn offset(&self, dx: f32, dy: f32) -> UiRectF {
        UiRectF::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }

    pub fn inflate(&self, d: f32) -> UiRectF {
        UiRectF::new(self.left - d, self.top - d, self.right + d, self.bottom + d)
    }

    /// Smallest integer rectangle covering this one.
    pub fn round_out(&self) -> UiRect {
        UiRect::new(
            self.left.floor() as i32,
            self.top.floor() as i32,
            self.right.ceil() as i32,
            self.bottom.ceil() as i32,
        )
    }
}

impl From<UiRect> for UiRectF {
    fn from(rc: UiRect) -> Self {
        Self::new(rc.left as f32, rc.top as f32, rc.right as f32, rc.bottom as f32)
    }
}
