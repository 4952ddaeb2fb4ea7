//! Software rasterizer backend.
//!
//! All drawing happens on a [`RasterBitmap`] owned by a [`RasterRender`]; the host
//! window only ever sees finished frames.

mod bitmap;
mod blend;
mod draw_image;
mod factory;
mod font;
mod matrix;
pub mod outline;
mod path;
mod pen;
mod present;
mod render;
pub mod scan;
mod shapes;
mod text;

pub use bitmap::RasterBitmap;
pub use blend::{blend_over, div255, draw_image_rect, faded_alpha};
pub use draw_image::calc_draw_image_times;
pub use factory::RasterRenderFactory;
pub use font::RasterFont;
pub use matrix::RasterMatrix;
pub use path::{Figure, RasterPath};
pub use pen::{RasterBrush, RasterPen};
pub use present::RenderDc;
pub use render::RasterRender;
