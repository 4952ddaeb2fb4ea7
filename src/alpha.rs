//! Alpha channel fixups for pixels written by code that does not track alpha.
//!
//! All functions take a packed ARGB buffer of `width * height` pixels. Rectangles
//! are clamped to the buffer; a buffer shorter than `width * height` is left alone.

use crate::geometry::{UiPadding, UiRect};

fn region(pixels: &[u32], width: u32, height: u32, rc: UiRect) -> Option<UiRect> {
    if pixels.len() < width as usize * height as usize {
        return None;
    }
    rc.intersect(&UiRect::new(0, 0, width as i32, height as i32))
}

fn for_each_in(pixels: &mut [u32], width: u32, height: u32, rc: UiRect, mut f: impl FnMut(&mut u32)) {
    let Some(rc) = region(pixels, width, height, rc) else {
        return;
    };
    let stride = width as usize;
    for y in rc.top..rc.bottom {
        let row = y as usize * stride;
        for p in &mut pixels[row + rc.left as usize..row + rc.right as usize] {
            f(p);
        }
    }
}

/// Set the alpha byte of every pixel in `rc`.
pub fn clear_alpha(pixels: &mut [u32], width: u32, height: u32, rc: UiRect, alpha: u8) {
    let a = (alpha as u32) << 24;
    for_each_in(pixels, width, height, rc, |p| *p = (*p & 0x00FF_FFFF) | a);
}

/// Inside `rc` minus `padding`, give fully transparent pixels the alpha `alpha`.
pub fn restore_alpha(pixels: &mut [u32], width: u32, height: u32, rc: UiRect, padding: &UiPadding, alpha: u8) {
    let a = (alpha as u32) << 24;
    for_each_in(pixels, width, height, rc.deflate_padding(padding), |p| {
        if *p >> 24 == 0 {
            *p |= a;
        }
    });
}

/// Inside `rc` minus `padding`, make pixels with color but zero alpha opaque.
pub fn restore_alpha_opaque(pixels: &mut [u32], width: u32, height: u32, rc: UiRect, padding: &UiPadding) {
    for_each_in(pixels, width, height, rc.deflate_padding(padding), |p| {
        if *p >> 24 == 0 && *p & 0x00FF_FFFF != 0 {
            *p |= 0xFF00_0000;
        }
    });
}

/// Pixels that differ from `before` and came back with zero alpha become opaque.
///
/// Returns the number of changed pixels.
pub fn restore_changed_alpha(before: &[u32], after: &mut [u32]) -> usize {
    let mut changed = 0;
    for (old, new) in before.iter().zip(after.iter_mut()) {
        if old != new {
            changed += 1;
            if *new >> 24 == 0 {
                *new |= 0xFF00_0000;
            }
        }
    }
    changed
}
