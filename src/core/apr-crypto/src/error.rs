//! Key management error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, generating or encoding keys.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The key file could not be read.
    #[error("failed to read key file {path}: {source}")]
    Io {
        /// Path of the key file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a valid PEM-encoded RSA key.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The key modulus is smaller than the required minimum.
    #[error("key too small: {bits} bits, at least {min_bits} required")]
    KeyTooSmall {
        /// Size of the rejected key.
        bits: usize,
        /// Required minimum size.
        min_bits: usize,
    },

    /// Key generation failed.
    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// Encoding a key to PEM or DER failed.
    #[error("key encoding failed: {0}")]
    EncodingFailed(String),
}

impl KeyError {
    /// Returns true if the error means the key material itself is unusable.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, KeyError::InvalidKey(_) | KeyError::KeyTooSmall { .. })
    }
}
