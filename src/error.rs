use crate::environment::Pos;

/// Recoverable errors raised by the grid environment.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvError {
    #[error("grid size must be at least 1, got {0}")]
    InvalidSize(usize),
    #[error("invalid action code {0}, expected 0 (up), 1 (down), 2 (left) or 3 (right)")]
    InvalidAction(i64),
    #[error("episode already finished, call reset before stepping again")]
    EpisodeFinished,
    #[error("position {pos:?} lies outside a {size}x{size} grid")]
    OutOfBounds { pos: Pos, size: usize },
    #[error("pixel size must be at least 1")]
    InvalidPixelSize,
}

pub type Result<T> = std::result::Result<T, EnvError>;

/// Errors from the image helpers in `visual`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VisualError {
    #[error("no images to stack")]
    Empty,
    #[error("image {index} has shape {found:?}, expected height {height} with 3 channels")]
    ShapeMismatch {
        index: usize,
        found: (usize, usize, usize),
        height: usize,
    },
    #[error("upscale factor must be at least 1")]
    InvalidFactor,
    #[error("image buffer does not fit {width}x{height} RGB")]
    BufferSize { width: usize, height: usize },
}
