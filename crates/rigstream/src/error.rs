//! # Player Error Types

use rigstream_ingest::StreamError;
use rigstream_playback::PlaybackError;
use thiserror::Error;

/// Errors surfaced by [`StreamPlayer`](crate::StreamPlayer) and its configuration.
#[derive(Error, Debug)]
pub enum RigstreamError {
    /// Ingest side failed (start, config).
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Playback configuration rejected.
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// Malformed TOML.
    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// File could not be read.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for player operations.
pub type RigstreamResult<T> = Result<T, RigstreamError>;
