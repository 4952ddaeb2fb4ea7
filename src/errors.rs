use crate::geometry::UiRect;
use crate::render::backend::BackendType;

/// Reasons a render operation refused to run.
///
/// Operations that only succeed or fail return `Result<(), RenderError>`; callers that
/// only care about success can use `.is_ok()`.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Invalid size {width}x{height}")]
    InvalidSize { width: i64, height: i64 },

    #[error("Surface has no pixels")]
    EmptySurface,

    #[error("Empty rectangle")]
    EmptyRect,

    #[error("Rectangle {0:?} lies outside the surface")]
    OutOfBounds(UiRect),

    #[error("Pixel buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("Object belongs to the {actual} backend, expected {expected}")]
    BackendMismatch {
        expected: BackendType,
        actual: BackendType,
    },

    #[error("Invalid font: {0}")]
    InvalidFont(String),

    #[error("No native window attached")]
    NoWindow,

    #[error("Nothing to paint")]
    NothingToPaint,

    #[error("Paint callback failed")]
    PaintFailed,

    #[error("Presentation failed: {0}")]
    PresentFailed(String),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("PNG encode error: {0}")]
    Encode(#[from] png::EncodingError),
}

pub type Result<T> = std::result::Result<T, RenderError>;
