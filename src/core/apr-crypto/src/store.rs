//! Key store: load the signing key from disk, or generate one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::KeyError;
use crate::keys::Keypair;

/// Where a loaded keypair came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Parsed from a PEM file.
    File(PathBuf),
    /// Freshly generated because no key file existed.
    Generated,
}

/// A keypair together with its origin.
#[derive(Debug)]
pub struct LoadedKey {
    /// The signing keypair.
    pub keypair: Keypair,
    /// Where the keypair came from.
    pub source: KeySource,
}

impl LoadedKey {
    /// Returns true if the generation fallback was taken.
    ///
    /// Callers must surface this: tokens signed with a generated key stop
    /// verifying after a restart.
    pub fn is_generated(&self) -> bool {
        self.source == KeySource::Generated
    }
}

/// Loads signing keys from the filesystem.
pub struct KeyStore;

impl KeyStore {
    /// Loads the PEM private key at `path`, generating a fresh keypair if
    /// the file does not exist.
    ///
    /// # Errors
    ///
    /// - [`KeyError::InvalidKey`] / [`KeyError::KeyTooSmall`] if the file
    ///   exists but does not hold a usable key
    /// - [`KeyError::Io`] for read errors other than "not found"
    /// - [`KeyError::KeyGenerationFailed`] if the fallback fails
    pub fn load(path: impl AsRef<Path>) -> Result<LoadedKey, KeyError> {
        let path = path.as_ref();

        match Keypair::from_pem_file(path) {
            Ok(keypair) => {
                info!(path = %path.display(), bits = keypair.bits(), "Loaded signing key");
                Ok(LoadedKey {
                    keypair,
                    source: KeySource::File(path.to_path_buf()),
                })
            },
            Err(KeyError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No key file, generating keypair");
                let keypair = Keypair::generate()?;
                Ok(LoadedKey {
                    keypair,
                    source: KeySource::Generated,
                })
            },
            Err(e) => Err(e),
        }
    }
}
