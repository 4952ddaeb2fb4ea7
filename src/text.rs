//! Glyph sources and the plain-text line model.

pub mod backend;
pub mod layout;

#[cfg(feature = "system_fonts")]
pub mod font_cache;
#[cfg(feature = "system_fonts")]
pub mod font_manager;
#[cfg(feature = "system_fonts")]
pub mod system;

pub use backend::{shared, FixedMetricsTextBackend, GlyphMask, LineMetrics, SharedTextBackend, TextBackend};
pub use layout::{layout_text, text_width, TextLayout};

#[cfg(feature = "system_fonts")]
pub use system::SystemTextBackend;

use crate::config::{RenderConfig, TextBackendKind};

/// The text backend selected by `config`.
pub fn backend_for(config: &RenderConfig) -> SharedTextBackend {
    match config.text_backend {
        #[cfg(feature = "system_fonts")]
        TextBackendKind::System => shared(SystemTextBackend::from_config(config)),
        #[cfg(not(feature = "system_fonts"))]
        TextBackendKind::System => {
            log::warn!("System fonts are not compiled in, using fixed metrics");
            shared(FixedMetricsTextBackend::new())
        }
        TextBackendKind::FixedMetrics => shared(FixedMetricsTextBackend::new()),
    }
}
