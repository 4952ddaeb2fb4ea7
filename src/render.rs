pub mod backend;
pub mod native;
pub mod rich_text;
pub mod types;

/// Rendering backends.
pub mod backends {
    /// Software rasterizer
    pub mod raster;
}

pub use backend::{BackendType, Render, RenderFactory};
pub use backends::raster::{RasterRender, RasterRenderFactory};
