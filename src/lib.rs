pub mod alpha;
pub mod color;
pub mod config;
pub mod errors;
pub mod geometry;
pub mod helper;
pub mod render;
pub mod text;

pub use color::UiColor;
pub use config::{FillMode, RenderConfig, TextBackendKind};
pub use errors::{RenderError, Result};
pub use geometry::{UiPadding, UiPoint, UiPointF, UiRect, UiRectF, UiSize};
pub use render::{BackendType, RasterRender, RasterRenderFactory, Render, RenderFactory};
