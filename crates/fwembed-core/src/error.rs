//! Error types for the fwembed-core library.
//!
//! Every failure mode of the encoder is a variant of [`Error`]. None of them
//! are retried: the tool is one-shot and offline, so the driver reports the
//! error and exits without writing anything.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fwembed operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all fwembed operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file (missing or unreadable)
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write output file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to create output directory
    #[error("failed to create directory '{path}': {source}")]
    DirectoryCreate {
        /// Path to the directory that failed to create
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Envelope header found without its footer, or the other way round
    #[error("malformed {envelope} envelope: {details}")]
    MalformedEnvelope {
        /// Name of the envelope descriptor that partially matched
        envelope: String,
        /// What was missing
        details: String,
    },

    /// The enclosed region of an envelope is not valid base64
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// Input is well-formed but of a kind the converter cannot embed
    #[error("unsupported input: {reason}")]
    UnsupportedInput {
        /// Explanation shown to the user
        reason: String,
    },

    /// Truncated or structurally broken RIFF/WAVE data
    #[error("invalid WAV data at offset {offset}: {details}")]
    InvalidWav {
        /// Byte offset where the problem was detected
        offset: usize,
        /// Detailed description of the issue
        details: String,
    },

    /// Key text could not be parsed as an RSA key
    #[error("invalid RSA key: {0}")]
    InvalidKey(String),

    /// Array name is not a C identifier
    #[error("invalid array name '{name}': must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidArrayName {
        /// The rejected name
        name: String,
    },

    /// Wrap width of zero
    #[error("invalid wrap width: must be at least 1")]
    InvalidWrapWidth,

    /// Array body text could not be parsed back into bytes
    #[error("invalid array body: {details}")]
    InvalidArrayBody {
        /// Detailed description of the issue
        details: String,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new directory creation error
    pub fn directory_create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreate {
            path: path.into(),
            source,
        }
    }

    /// Creates a new malformed envelope error
    pub fn malformed_envelope(envelope: impl Into<String>, details: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            envelope: envelope.into(),
            details: details.into(),
        }
    }

    /// Creates a new unsupported input error
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedInput {
            reason: reason.into(),
        }
    }

    /// Creates a new WAV format error
    pub fn invalid_wav(offset: usize, details: impl Into<String>) -> Self {
        Self::InvalidWav {
            offset,
            details: details.into(),
        }
    }

    /// Creates a new key parse error
    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    /// Creates a new array body parse error
    pub fn invalid_array_body(details: impl Into<String>) -> Self {
        Self::InvalidArrayBody {
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::malformed_envelope("PEM", "footer marker not found");
        assert!(err.to_string().contains("malformed PEM envelope"));
        assert!(err.to_string().contains("footer marker"));

        let err = Error::file_read(
            "/missing/cert.pem",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.to_string().contains("/missing/cert.pem"));
    }
}
