//! Playback error types.

use thiserror::Error;

/// Errors raised while configuring playback.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// Follow sharpness outside `[0, 1]`.
    #[error("follow sharpness must be within [0, 1], got {0}")]
    InvalidSharpness(f32),

    /// Non-finite or non-positive rate.
    #[error("frame rate must be finite and positive, got {0}")]
    InvalidFrameRate(f32),

    /// Any other unusable setting.
    #[error("invalid playback configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for playback operations.
pub type PlaybackResult<T> = Result<T, PlaybackError>;
