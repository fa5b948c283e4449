use thiserror::Error;

pub type Result<T> = std::result::Result<T, GrainError>;

#[derive(Debug, Error)]
pub enum GrainError {
    #[error("invalid dimensions {width}x{height}: both axes must be positive")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("invalid frame range: start {start} is after end {end}")]
    InvalidFrameRange { start: u64, end: u64 },

    #[error("invalid seed {0:?}: expected an unsigned integer")]
    InvalidSeed(String),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("distribution error: {0}")]
    Distribution(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GrainError {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Reject zero-area render targets before any work is done.
pub fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(GrainError::InvalidDimensions { width, height });
    }
    Ok(())
}
