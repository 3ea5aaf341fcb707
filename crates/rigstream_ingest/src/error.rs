//! # Ingest Error Types
//!
//! Errors that surface to the caller of the ingest pipeline. Per-character
//! stream errors are NOT represented here: they travel as
//! [`ErrorRecord`](rigstream_shared::ErrorRecord)s through the error queue.

use rigstream_shared::ReturnCode;
use thiserror::Error;

/// Errors returned by session and configuration operations.
#[derive(Error, Debug)]
pub enum StreamError {
    /// The native source failed to start or to accept callbacks.
    #[error("stream failed to start ({code}): {message}")]
    InitFailed {
        /// Native return code.
        code: ReturnCode,
        /// Detail from the source.
        message: String,
    },

    /// `start` was called on a session that already started.
    #[error("stream session already started")]
    AlreadyStarted,

    /// An operation required a running stream.
    #[error("stream session not started")]
    NotStarted,

    /// Another bridge already owns the native callback slots.
    #[error("native callbacks are already registered to another bridge")]
    CallbacksAlreadyRegistered,

    /// Configuration is unusable.
    #[error("invalid ingest configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamError {
    /// Shorthand for an [`StreamError::InitFailed`].
    #[must_use]
    pub fn init_failed(code: ReturnCode, message: impl Into<String>) -> Self {
        Self::InitFailed {
            code,
            message: message.into(),
        }
    }
}

/// Result type for ingest operations.
pub type StreamResult<T> = Result<T, StreamError>;
