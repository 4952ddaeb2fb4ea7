//! Packed ARGB color.
//!
//! A [`UiColor`] stores its channels in the same layout as a surface pixel:
//! `A << 24 | R << 16 | G << 8 | B`, straight (not premultiplied) alpha.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct UiColor(pub u32);

impl std::fmt::Debug for UiColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UiColor(#{:08X})", self.0)
    }
}

impl UiColor {
    pub const TRANSPARENT: UiColor = UiColor(0x0000_0000);
    pub const BLACK: UiColor = UiColor(0xFF00_0000);
    pub const WHITE: UiColor = UiColor(0xFFFF_FFFF);
    pub const RED: UiColor = UiColor(0xFFFF_0000);
    pub const GREEN: UiColor = UiColor(0xFF00_FF00);
    pub const BLUE: UiColor = UiColor(0xFF00_00FF);

    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        UiColor((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::from_argb(0xFF, r, g, b)
    }

    pub const fn argb(&self) -> u32 {
        self.0
    }

    pub const fn a(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn r(&self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn g(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(&self) -> u8 {
        self.0 as u8
    }

    /// A zero value means "no color" to every draw call that takes an optional color.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn with_alpha(&self, a: u8) -> Self {
        UiColor((self.0 & 0x00FF_FFFF) | (a as u32) << 24)
    }

    /// Channel-wise linear interpolation, `t` in `0.0..=1.0`.
    pub fn lerp(&self, other: UiColor, t: f32) -> UiColor {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 { (a as f32 + (b as f32 - a as f32) * t).round() as u8 };
        UiColor::from_argb(
            mix(self.a(), other.a()),
            mix(self.r(), other.r()),
            mix(self.g(), other.g()),
            mix(self.b(), other.b()),
        )
    }
}

impl From<u32> for UiColor {
    fn from(argb: u32) -> Self {
        UiColor(argb)
    }
}
