use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::geometry::{UiPadding, UiRect};

bitflags! {
    /// Text layout flags accepted by `measure_string`/`draw_string` and carried by rich-text runs.
    #[derive(Default)]
    pub struct TextFormat: u32 {
        const SINGLELINE    = 0x0001;
        const LEFT          = 0x0002;
        const HCENTER       = 0x0004;
        const RIGHT         = 0x0008;
        const TOP           = 0x0010;
        const VCENTER       = 0x0020;
        const BOTTOM        = 0x0040;
        const END_ELLIPSIS  = 0x0080;
        const PATH_ELLIPSIS = 0x0100;
        const NOCLIP        = 0x0200;
        const WORD_WRAP     = 0x0400;
        const VERTICAL      = 0x0800;
    }
}

impl std::fmt::Display for TextFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = vec![];
        if self.contains(TextFormat::SINGLELINE) {
            parts.push("singleline");
        }
        if self.contains(TextFormat::HCENTER) {
            parts.push("hcenter");
        } else if self.contains(TextFormat::RIGHT) {
            parts.push("right");
        }
        if self.contains(TextFormat::VCENTER) {
            parts.push("vcenter");
        } else if self.contains(TextFormat::BOTTOM) {
            parts.push("bottom");
        }
        if self.contains(TextFormat::WORD_WRAP) {
            parts.push("wrap");
        }
        if self.intersects(TextFormat::END_ELLIPSIS | TextFormat::PATH_ELLIPSIS) {
            parts.push("ellipsis");
        }
        write!(f, "{}", parts.join("|"))
    }
}

/// Font style descriptor. Sizes are in device pixels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UiFont {
    pub font_name: String,
    pub font_size: i32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
}

impl UiFont {
    pub fn new(font_name: impl Into<String>, font_size: i32) -> Self {
        Self {
            font_name: font_name.into(),
            font_size,
            ..Default::default()
        }
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }
}

/// Tiling behaviour for the center of a nine-patch image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TiledDrawParam {
    pub tiled_x: bool,
    pub tiled_y: bool,
    /// Only whole tiles are drawn along X.
    pub fully_tiled_x: bool,
    pub fully_tiled_y: bool,
    pub tiled_margin_x: i32,
    pub tiled_margin_y: i32,
    /// Inset applied to the destination center before tiling.
    pub tiled_padding: UiPadding,
}

/// Raster operation for `bit_blt`. Every mode copies the source in the software backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RopMode {
    #[default]
    SrcCopy,
    DstInvert,
    SrcInvert,
    SrcAnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderClipType {
    /// Nothing is visible.
    Empty,
    /// A single rectangle.
    Rect,
    /// Several rectangles.
    Region,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitmapAlphaType {
    Opaque,
    #[default]
    Premul,
    Unpremul,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashStyle {
    #[default]
    Solid,
    Dash,
    Dot,
    DashDot,
    DashDotDot,
}

impl DashStyle {
    /// On/off lengths in multiples of the pen width, `None` for solid lines.
    pub fn pattern(&self) -> Option<&'static [f32]> {
        match self {
            DashStyle::Solid => None,
            DashStyle::Dash => Some(&[3.0, 1.0]),
            DashStyle::Dot => Some(&[1.0, 1.0]),
            DashStyle::DashDot => Some(&[3.0, 1.0, 1.0, 1.0]),
            DashStyle::DashDotDot => Some(&[3.0, 1.0, 1.0, 1.0, 1.0, 1.0]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillType {
    Winding,
    #[default]
    EvenOdd,
}

/// Direction of a two-color linear gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientDirection {
    LeftToRight,
    TopToBottom,
    TopLeftToBottomRight,
    TopRightToBottomLeft,
}

impl GradientDirection {
    /// Maps the numeric codes 1..=4; anything else is left-to-right.
    pub fn from_code(code: i8) -> Self {
        match code {
            2 => GradientDirection::TopToBottom,
            3 => GradientDirection::TopLeftToBottomRight,
            4 => GradientDirection::TopRightToBottomLeft,
            _ => GradientDirection::LeftToRight,
        }
    }
}

/// Rectangle + two colors + direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    pub rect: UiRect,
    pub from: crate::color::UiColor,
    pub to: crate::color::UiColor,
    pub direction: GradientDirection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_gradient_code_is_horizontal() {
        assert_eq!(GradientDirection::from_code(0), GradientDirection::LeftToRight);
        assert_eq!(GradientDirection::from_code(7), GradientDirection::LeftToRight);
        assert_eq!(GradientDirection::from_code(4), GradientDirection::TopRightToBottomLeft);
    }

    #[test]
    fn text_format_display() {
        let f = TextFormat::SINGLELINE | TextFormat::HCENTER | TextFormat::END_ELLIPSIS;
        assert_eq!(f.to_string(), "singleline|hcenter|ellipsis");
        assert_eq!(TextFormat::default().to_string(), "");
    }
}
