//! Collaborators supplied by the host windowing layer.
//!
//! The render surface never talks to a window system directly. A host hands it a
//! [`NativeWindow`] which reports what needs repainting, accepts finished frames and
//! manages the window's shape region. Painting itself is driven by a [`RenderPaint`]
//! callback, normally the root of the control tree.

use crate::geometry::UiRect;
use crate::render::backend::Render;

/// How a finished frame reaches the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentMode {
    /// Plain block copy into the window.
    Blit,
    /// Per-pixel alpha composition with a global window alpha.
    Layered { alpha: u8 },
}

/// A frame handed to the window for presentation.
#[derive(Debug)]
pub struct PresentFrame<'a> {
    pub pixels: &'a [u32],
    pub width: u32,
    pub height: u32,
    /// The part of the frame that changed.
    pub dirty: UiRect,
    pub mode: PresentMode,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WindowRegion {
    Rect(UiRect),
    RoundRect { rect: UiRect, rx: f32, ry: f32 },
}

pub trait NativeWindow {
    /// Region that needs repainting, `None` when the window is up to date.
    fn update_rect(&mut self) -> Option<UiRect>;
    fn is_layered(&self) -> bool;
    fn layered_alpha(&self) -> u8 {
        255
    }
    fn present(&mut self, frame: &PresentFrame<'_>) -> anyhow::Result<()>;
    /// Apply (or with `None` remove) a window shape region.
    fn set_region(&mut self, region: Option<WindowRegion>, redraw: bool) -> bool;
}

/// Callback used by `paint_and_swap_buffers` to fill the dirty region.
pub trait RenderPaint {
    fn do_paint(&mut self, render: &mut dyn Render, paint_rc: UiRect) -> bool;
}
