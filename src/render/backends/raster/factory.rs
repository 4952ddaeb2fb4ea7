use std::sync::Arc;

use log::info;

use crate::color::UiColor;
use crate::config::RenderConfig;
use crate::render::backend::{BackendType, Bitmap, Brush, Font, Matrix, Path, Pen, Render, RenderFactory};
use crate::render::native::NativeWindow;
use crate::text::{self, SharedTextBackend};

use super::bitmap::RasterBitmap;
use super::font::RasterFont;
use super::matrix::RasterMatrix;
use super::path::RasterPath;
use super::pen::{RasterBrush, RasterPen};
use super::render::RasterRender;

/// Builds raster render objects. Every surface it creates shares its config and
/// text backend.
pub struct RasterRenderFactory {
    config: Arc<RenderConfig>,
    text: SharedTextBackend,
}

impl RasterRenderFactory {
    pub fn new(config: RenderConfig) -> Self {
        let text = text::backend_for(&config);
        Self::with_text_backend(config, text)
    }

    pub fn with_text_backend(config: RenderConfig, text: SharedTextBackend) -> Self {
        info!(
            "Raster render factory: fill mode {:?}, text backend {:?}",
            config.fill_mode, config.text_backend
        );
        Self {
            config: Arc::new(config),
            text,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn text_backend(&self) -> SharedTextBackend {
        self.text.clone()
    }
}

impl Default for RasterRenderFactory {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl RenderFactory for RasterRenderFactory {
    fn backend_type(&self) -> BackendType {
        BackendType::Raster
    }

    fn create_font(&self) -> Box<dyn Font> {
        Box::new(RasterFont::new())
    }

    fn create_pen(&self, color: UiColor, width: f32) -> Box<dyn Pen> {
        Box::new(RasterPen::new(color, width))
    }

    fn create_brush(&self, color: UiColor) -> Box<dyn Brush> {
        Box::new(RasterBrush::new(color))
    }

    fn create_path(&self) -> Box<dyn Path> {
        Box::new(RasterPath::new())
    }

    fn create_matrix(&self) -> Box<dyn Matrix> {
        Box::new(RasterMatrix::identity())
    }

    fn create_bitmap(&self) -> Box<dyn Bitmap> {
        Box::new(RasterBitmap::new())
    }

    fn create_render(&self, window: Option<Box<dyn NativeWindow>>) -> Box<dyn Render> {
        Box::new(RasterRender::new(Arc::clone(&self.config), self.text.clone(), window))
    }
}
