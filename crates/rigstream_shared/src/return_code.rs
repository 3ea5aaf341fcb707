//! Native library return codes.

use thiserror::Error;

/// Return codes reported by the native streaming library.
///
/// The values are fixed by the native ABI.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ReturnCode {
    /// Success.
    #[error("no error")]
    NoError = 0,
    /// Manifest version is not supported.
    #[error("bad file version")]
    BadFileVersion = -1,
    /// Locator could not be opened.
    #[error("bad path")]
    BadPath = -2,
    /// Nothing has been loaded yet.
    #[error("no file loaded")]
    NoFileLoaded = -3,
    /// Manifest or segment could not be parsed.
    #[error("bad file data")]
    BadFileData = -4,
    /// Library used before initialization.
    #[error("api not initialized")]
    ApiNotInitialized = -5,
    /// Streaming requested without callbacks.
    #[error("no callback registered")]
    NoCallback = -6,
    /// End of an enumeration.
    #[error("no more data")]
    NoMoreData = -7,
    /// Anything else.
    #[error("unknown error")]
    Unknown = -12345,
}

impl ReturnCode {
    /// Decodes a raw native code. Unrecognized values map to [`ReturnCode::Unknown`].
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::NoError,
            -1 => Self::BadFileVersion,
            -2 => Self::BadPath,
            -3 => Self::NoFileLoaded,
            -4 => Self::BadFileData,
            -5 => Self::ApiNotInitialized,
            -6 => Self::NoCallback,
            -7 => Self::NoMoreData,
            _ => Self::Unknown,
        }
    }

    /// The raw native value.
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    /// Whether this code signals success.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::NoError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_roundtrip_for_known_codes() {
        for code in [
            ReturnCode::NoError,
            ReturnCode::BadFileVersion,
            ReturnCode::BadPath,
            ReturnCode::NoFileLoaded,
            ReturnCode::BadFileData,
            ReturnCode::ApiNotInitialized,
            ReturnCode::NoCallback,
            ReturnCode::NoMoreData,
            ReturnCode::Unknown,
        ] {
            assert_eq!(ReturnCode::from_raw(code.as_raw()), code);
        }
    }

    #[test]
    fn test_unrecognized_is_unknown() {
        assert_eq!(ReturnCode::from_raw(42), ReturnCode::Unknown);
        assert!(!ReturnCode::from_raw(42).is_ok());
    }
}
