use serde::{Deserialize, Serialize};

use crate::errors::RenderError;

pub const DEFAULT_FONT_FAMILY: &str = "Microsoft YaHei";

/// How `fill_rect` combines the fill color with the pixels already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    /// Alpha-over blend. An opaque color at full fade overwrites.
    SourceOver,
    /// Overwrite the destination, alpha included.
    Source,
}

/// Which glyph source the factory wires into the surfaces it creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextBackendKind {
    /// Installed system fonts (requires the `system_fonts` feature).
    System,
    /// Deterministic box glyphs with fixed advances.
    FixedMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub fill_mode: FillMode,
    pub text_backend: TextBackendKind,
    /// Family used when the requested face cannot be resolved.
    pub default_font_family: String,
    pub min_arc_steps: u32,
    pub arc_step_degrees: f32,
    pub glyph_cache_capacity: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fill_mode: FillMode::SourceOver,
            text_backend: if cfg!(feature = "system_fonts") {
                TextBackendKind::System
            } else {
                TextBackendKind::FixedMetrics
            },
            default_font_family: DEFAULT_FONT_FAMILY.to_string(),
            min_arc_steps: 12,
            arc_step_degrees: 6.0,
            glyph_cache_capacity: 4096,
        }
    }
}

impl RenderConfig {
    /// Parse a JSON document; absent keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Number of segments used to walk an arc of `sweep` degrees.
    pub fn arc_steps(&self, sweep: f32) -> usize {
        let per_step = if self.arc_step_degrees > 0.0 { self.arc_step_degrees } else { 6.0 };
        let steps = (sweep.abs() / per_step) as u32;
        steps.max(self.min_arc_steps).max(1) as usize
    }
}
