use std::any::Any;
use std::sync::Arc;

use crate::errors::{RenderError, Result};
use crate::render::backend::{BackendType, Font, RenderObject};
use crate::render::types::UiFont;

/// A validated font descriptor. Glyphs are resolved lazily by the surface's text backend.
#[derive(Debug, Clone, Default)]
pub struct RasterFont {
    desc: Option<Arc<UiFont>>,
}

impl RasterFont {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_desc(font: &UiFont) -> Result<Self> {
        let mut f = Self::new();
        f.init_font(font)?;
        Ok(f)
    }

    /// The descriptor, `None` until `init_font` succeeds.
    pub fn descriptor(&self) -> Option<&Arc<UiFont>> {
        self.desc.as_ref()
    }
}

impl RenderObject for RasterFont {
    fn backend_type(&self) -> BackendType {
        BackendType::Raster
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Font for RasterFont {
    fn init_font(&mut self, font: &UiFont) -> Result<()> {
        if font.font_name.trim().is_empty() {
            return Err(RenderError::InvalidFont("empty font name".to_string()));
        }
        if font.font_size <= 0 {
            return Err(RenderError::InvalidFont(format!(
                "{}: size {} is not positive",
                font.font_name, font.font_size
            )));
        }
        self.desc = Some(Arc::new(font.clone()));
        Ok(())
    }

    fn font_name(&self) -> &str {
        self.desc.as_ref().map_or("", |d| d.font_name.as_str())
    }

    fn font_size(&self) -> i32 {
        self.desc.as_ref().map_or(0, |d| d.font_size)
    }

    fn is_bold(&self) -> bool {
        self.desc.as_ref().is_some_and(|d| d.bold)
    }

    fn is_italic(&self) -> bool {
        self.desc.as_ref().is_some_and(|d| d.italic)
    }

    fn is_underline(&self) -> bool {
        self.desc.as_ref().is_some_and(|d| d.underline)
    }

    fn is_strikeout(&self) -> bool {
        self.desc.as_ref().is_some_and(|d| d.strikeout)
    }

    fn clone_font(&self) -> Box<dyn Font> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_rejects_bad_descriptors() {
        let mut font = RasterFont::new();
        assert!(font.init_font(&UiFont::new("", 12)).is_err());
        assert!(font.init_font(&UiFont::new("Arial", 0)).is_err());
        assert!(font.descriptor().is_none());
        assert_eq!(font.font_size(), 0);
    }

    #[test]
    fn accessors_reflect_descriptor() {
        let mut desc = UiFont::new("Arial", 14).bold(true);
        desc.underline = true;
        let font = RasterFont::from_desc(&desc).unwrap();
        assert_eq!(font.font_name(), "Arial");
        assert_eq!(font.font_size(), 14);
        assert!(font.is_bold());
        assert!(font.is_underline());
        assert!(!font.is_italic());
        assert!(!font.is_strikeout());
    }
}
