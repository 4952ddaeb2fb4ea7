//! Small layout and color helpers used around image drawing.

use crate::color::UiColor;
use crate::geometry::{UiPadding, UiRect, UiSize};

/// Place an image of `image_size` inside `rc_control`.
///
/// `align` is searched for `left`/`hcenter`/`right` and `top`/`vcenter`/`bottom`;
/// an axis without a keyword keeps the control's extent. The result is deflated by
/// `padding` and is `None` when nothing is left.
pub fn make_image_dest(rc_control: UiRect, image_size: UiSize, align: &str, padding: &UiPadding) -> Option<UiRect> {
    let mut dest = rc_control;

    if align.contains("left") {
        dest.left = rc_control.left;
        dest.right = dest.left + image_size.cx;
    } else if align.contains("hcenter") {
        dest.left = rc_control.left + (rc_control.width() - image_size.cx) / 2;
        dest.right = dest.left + image_size.cx;
    } else if align.contains("right") {
        dest.left = rc_control.right - image_size.cx;
        dest.right = dest.left + image_size.cx;
    }

    if align.contains("top") {
        dest.top = rc_control.top;
        dest.bottom = dest.top + image_size.cy;
    } else if align.contains("vcenter") {
        dest.top = rc_control.top + (rc_control.height() - image_size.cy) / 2;
        dest.bottom = dest.top + image_size.cy;
    } else if align.contains("bottom") {
        dest.top = rc_control.bottom - image_size.cy;
        dest.bottom = dest.top + image_size.cy;
    }

    let dest = dest.deflate_padding(padding);
    (!dest.is_empty()).then_some(dest)
}

/// Hue in degrees `[0, 360)`, saturation and lightness in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

pub fn rgb_to_hsl(color: UiColor) -> Hsl {
    let r = color.r() as f32 / 255.0;
    let g = color.g() as f32 / 255.0;
    let b = color.b() as f32 / 255.0;
    let min = r.min(g).min(b);
    let max = r.max(g).max(b);
    let l = (min + max) / 2.0;
    if max == min {
        return Hsl { h: 0.0, s: 0.0, l };
    }
    let d = max - min;
    let s = if l <= 0.5 { d / (max + min) } else { d / (2.0 - max - min) };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    Hsl { h: h * 60.0, s, l }
}

pub fn hsl_to_rgb(hsl: Hsl, alpha: u8) -> UiColor {
    let Hsl { h, s, l } = hsl;
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let hue = h / 360.0;
    let channel = |t: f32| -> u8 {
        let t = if t < 0.0 {
            t + 1.0
        } else if t > 1.0 {
            t - 1.0
        } else {
            t
        };
        let v = if 6.0 * t < 1.0 {
            p + (q - p) * 6.0 * t
        } else if 2.0 * t < 1.0 {
            q
        } else if 3.0 * t < 2.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    };
    UiColor::from_argb(alpha, channel(hue + 1.0 / 3.0), channel(hue), channel(hue - 1.0 / 3.0))
}
