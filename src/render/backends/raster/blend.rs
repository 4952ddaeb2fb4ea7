//! Per-pixel compositing.
//!
//! Pixels are straight-alpha ARGB. Every division by 255 in this crate goes through
//! [`div255`], which rounds half up, so fills, image draws, masks and text all agree
//! bit for bit.

use crate::color::UiColor;
use crate::geometry::UiRect;
use crate::render::backend::Bitmap;

use super::bitmap::RasterBitmap;

#[inline]
pub fn div255(v: u32) -> u32 {
    (v + 127) / 255
}

/// Alpha of `alpha` after applying a global fade.
#[inline]
pub fn faded_alpha(alpha: u8, fade: u8) -> u8 {
    div255(alpha as u32 * fade as u32) as u8
}

/// Blend `src` over `dst` with `src`'s alpha already scaled to `alpha`.
#[inline]
pub fn blend_with_alpha(src: u32, dst: u32, alpha: u32) -> u32 {
    if alpha == 0 {
        return dst;
    }
    let inv = 255 - alpha;
    let dst_a = dst >> 24;
    let out_a = alpha + div255(dst_a * inv);
    let channel = |shift: u32| -> u32 {
        let s = (src >> shift) & 0xFF;
        let d = (dst >> shift) & 0xFF;
        div255(s * alpha + d * inv)
    };
    (out_a.min(255) << 24) | (channel(16) << 16) | (channel(8) << 8) | channel(0)
}

/// Alpha-over of `src` onto `dst`, with the source alpha multiplied by `fade`.
#[inline]
pub fn blend_over(src: u32, dst: u32, fade: u8) -> u32 {
    let alpha = div255((src >> 24) * fade as u32);
    blend_with_alpha(src, dst, alpha)
}

/// A color at full coverage scaled by a mask coverage value.
#[inline]
pub fn blend_coverage(color: UiColor, dst: u32, alpha: u8, coverage: u8) -> u32 {
    let a = div255(alpha as u32 * coverage as u32);
    blend_with_alpha(color.argb(), dst, a)
}

/// Composite `rc_src` of `src` into `rc_dest` of `dest` with nearest-neighbor scaling.
///
/// Returns false without touching `dest` when either buffer is empty, either rect is
/// empty or nothing of `rc_dest` lies inside `dest`.
pub fn draw_image_rect(dest: &mut RasterBitmap, rc_dest: UiRect, src: &RasterBitmap, rc_src: UiRect, fade: u8) -> bool {
    let bounds = dest.bounds();
    draw_image_rect_clipped(dest, rc_dest, src, rc_src, fade, bounds)
}

/// Same as [`draw_image_rect`], additionally restricted to `clip`.
pub fn draw_image_rect_clipped(
    dest: &mut RasterBitmap,
    rc_dest: UiRect,
    src: &RasterBitmap,
    rc_src: UiRect,
    fade: u8,
    clip: UiRect,
) -> bool {
    for_each_sample(dest, rc_dest, src, rc_src, clip, |s, d| blend_over(s, d, fade))
}

/// Nearest-neighbor copy without blending.
pub fn copy_image_rect(dest: &mut RasterBitmap, rc_dest: UiRect, src: &RasterBitmap, rc_src: UiRect, clip: UiRect) -> bool {
    for_each_sample(dest, rc_dest, src, rc_src, clip, |s, _| s)
}

fn for_each_sample<F>(
    dest: &mut RasterBitmap,
    rc_dest: UiRect,
    src: &RasterBitmap,
    rc_src: UiRect,
    clip: UiRect,
    mut op: F,
) -> bool
where
    F: FnMut(u32, u32) -> u32,
{
    if dest.is_empty() || src.is_empty() || rc_dest.is_empty() || rc_src.is_empty() {
        return false;
    }
    let Some(visible) = rc_dest.intersect(&dest.bounds()).and_then(|rc| rc.intersect(&clip)) else {
        return false;
    };

    let dest_w = rc_dest.width().max(1) as i64;
    let dest_h = rc_dest.height().max(1) as i64;
    let src_w = rc_src.width() as i64;
    let src_h = rc_src.height() as i64;
    let src_stride = src.width() as usize;
    let dest_stride = dest.width() as usize;
    let src_bounds = src.bounds();
    let src_bits = src.bits();
    let dest_bits = dest.bits_mut();

    for y in visible.top..visible.bottom {
        let sy = rc_src.top as i64 + (y - rc_dest.top) as i64 * src_h / dest_h;
        if sy < src_bounds.top as i64 || sy >= src_bounds.bottom as i64 {
            continue;
        }
        let src_row = sy as usize * src_stride;
        let dest_row = y as usize * dest_stride;
        for x in visible.left..visible.right {
            let sx = rc_src.left as i64 + (x - rc_dest.left) as i64 * src_w / dest_w;
            if sx < src_bounds.left as i64 || sx >= src_bounds.right as i64 {
                continue;
            }
            let s = src_bits[src_row + sx as usize];
            let d = &mut dest_bits[dest_row + x as usize];
            *d = op(s, *d);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, argb: u32) -> RasterBitmap {
        RasterBitmap::from_pixels(w, h, vec![argb; (w * h) as usize]).unwrap()
    }

    #[test]
    fn opaque_onto_transparent_at_full_fade_is_exact() {
        for src in [0xFF12_3456u32, 0xFFFF_FFFF, 0xFF00_0000, 0xFF80_7F01] {
            assert_eq!(blend_over(src, 0, 255), src);
        }
    }

    #[test]
    fn rounding_is_half_up_everywhere() {
        assert_eq!(div255(127), 0);
        assert_eq!(div255(128), 1);
        assert_eq!(div255(255 * 128), 128);
        assert_eq!(faded_alpha(255, 128), 128);
        assert_eq!(faded_alpha(128, 255), 128);
        // 50% blue over opaque red.
        let out = blend_over(0xFF00_00FF, 0xFFFF_0000, 128);
        assert_eq!(out, 0xFF7F_0080);
        // The same arithmetic applies through the coverage path.
        assert_eq!(blend_coverage(UiColor::BLUE, 0xFFFF_0000, 255, 128), out);
    }

    #[test]
    fn zero_alpha_leaves_destination() {
        assert_eq!(blend_over(0x00FF_FFFF, 0x8012_3456, 255), 0x8012_3456);
        assert_eq!(blend_over(0xFFFF_FFFF, 0x8012_3456, 0), 0x8012_3456);
    }

    #[test]
    fn compositor_rejects_degenerate_input() {
        let mut dest = solid(4, 4, 0);
        let full = dest.bounds();
        let src = solid(2, 2, 0xFFFF_FFFF);
        assert!(!draw_image_rect(&mut dest, UiRect::new(0, 0, 0, 4), &src, src.bounds(), 255));
        assert!(!draw_image_rect(&mut dest, full, &src, UiRect::default(), 255));
        assert!(!draw_image_rect(&mut dest, UiRect::new(10, 10, 20, 20), &src, src.bounds(), 255));
        assert!(!draw_image_rect(&mut dest, full, &RasterBitmap::new(), src.bounds(), 255));
        assert!(dest.bits().iter().all(|&p| p == 0));
    }

    #[test]
    fn compositor_stretches_nearest_neighbor() {
        let mut src = solid(2, 1, 0);
        src.set_pixel(0, 0, 0xFFFF_0000);
        src.set_pixel(1, 0, 0xFF00_00FF);
        let mut dest = solid(4, 2, 0);
        let full = dest.bounds();
        assert!(draw_image_rect(&mut dest, full, &src, src.bounds(), 255));
        assert_eq!(dest.bits(), &[
            0xFFFF_0000, 0xFFFF_0000, 0xFF00_00FF, 0xFF00_00FF,
            0xFFFF_0000, 0xFFFF_0000, 0xFF00_00FF, 0xFF00_00FF,
        ]);
    }

    #[test]
    fn compositor_skips_samples_outside_source() {
        let src = solid(2, 2, 0xFFFF_FFFF);
        let mut dest = solid(4, 4, 0);
        // Source rect hangs off the right edge of the 2x2 source.
        assert!(draw_image_rect(&mut dest, UiRect::new(0, 0, 4, 2), &src, UiRect::new(0, 0, 4, 2), 255));
        assert_eq!(dest.pixel(1, 0), Some(0xFFFF_FFFF));
        assert_eq!(dest.pixel(2, 0), Some(0));
        assert_eq!(dest.pixel(3, 1), Some(0));
    }

    #[test]
    fn compositor_respects_clip() {
        let src = solid(4, 4, 0xFF00_FF00);
        let mut dest = solid(4, 4, 0);
        let full = dest.bounds();
        assert!(draw_image_rect_clipped(&mut dest, full, &src, src.bounds(), 255, UiRect::new(1, 1, 3, 3)));
        assert_eq!(dest.pixel(0, 0), Some(0));
        assert_eq!(dest.pixel(1, 1), Some(0xFF00_FF00));
        assert_eq!(dest.pixel(3, 3), Some(0));
    }
}
