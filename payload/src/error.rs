use std::io;

use thiserror::Error;

/// Errors produced while writing or reading a payload trailer.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The stream does not end in the `PAYLOADS` magic, so no trailer is present.
    #[error("Magic string does not match the expected \"PAYLOADS\"")]
    MagicMismatch,

    /// Fewer bytes were available than `field` needs.
    #[error("Unexpected end of data while reading {field}")]
    Truncated { field: &'static str },

    /// Declared lengths or offsets are inconsistent with the stream.
    #[error("Malformed trailer: {reason}")]
    Malformed { reason: String },

    /// The host file already ends in a trailer.
    #[error("A payload trailer is already present")]
    AlreadyPresent,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl PayloadError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        PayloadError::Malformed {
            reason: reason.into(),
        }
    }

    /// Maps a short read to [`PayloadError::Truncated`], leaving every other
    /// I/O failure untouched.
    pub(crate) fn from_read(err: io::Error, field: &'static str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            PayloadError::Truncated { field }
        } else {
            PayloadError::Io(err)
        }
    }

    /// True for the "no trailer present" case.
    pub fn is_missing_magic(&self) -> bool {
        matches!(self, PayloadError::MagicMismatch)
    }
}

pub type Result<T> = std::result::Result<T, PayloadError>;
