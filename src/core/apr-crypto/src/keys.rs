//! RSA key types used to sign and verify tokens.
//!
//! Private key material never leaves this module except as zeroizing DER
//! or PEM buffers, and the `Debug` output of [`Keypair`] is redacted.

use std::path::Path;

use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::error::KeyError;

/// Minimum accepted RSA modulus size, in bits.
pub const MIN_KEY_BITS: usize = 4096;

/// An RSA signing keypair.
///
/// The public half is derived from the private key, so both always
/// belong to the same keypair.
#[derive(Clone)]
pub struct Keypair {
    private: RsaPrivateKey,
    public: PublicKey,
}

impl Keypair {
    /// Generates a new keypair with a [`MIN_KEY_BITS`] modulus.
    ///
    /// This is slow (seconds) and is meant to run once at startup.
    pub fn generate() -> Result<Self, KeyError> {
        let private = RsaPrivateKey::new(&mut OsRng, MIN_KEY_BITS)
            .map_err(|e| KeyError::KeyGenerationFailed(e.to_string()))?;
        Ok(Self::from_private(private))
    }

    /// Parses a PEM-encoded RSA private key.
    ///
    /// Accepts both PKCS#1 (`RSA PRIVATE KEY`) and PKCS#8 (`PRIVATE KEY`).
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidKey`] if the PEM is not a consistent RSA
    /// private key, and [`KeyError::KeyTooSmall`] if the modulus is below
    /// [`MIN_KEY_BITS`].
    pub fn from_pem(pem: &str) -> Result<Self, KeyError> {
        let private = RsaPrivateKey::from_pkcs1_pem(pem)
            .or_else(|pkcs1_err| {
                RsaPrivateKey::from_pkcs8_pem(pem).map_err(|pkcs8_err| {
                    KeyError::InvalidKey(format!(
                        "not a PKCS#1 ({pkcs1_err}) or PKCS#8 ({pkcs8_err}) RSA private key"
                    ))
                })
            })?;

        private
            .validate()
            .map_err(|e| KeyError::InvalidKey(format!("inconsistent key components: {e}")))?;

        let bits = private.size() * 8;
        if bits < MIN_KEY_BITS {
            return Err(KeyError::KeyTooSmall {
                bits,
                min_bits: MIN_KEY_BITS,
            });
        }

        Ok(Self::from_private(private))
    }

    /// Reads and parses a PEM-encoded RSA private key file.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        let path = path.as_ref();
        let pem = read_secret(path)?;
        Self::from_pem(&pem)
    }

    fn from_private(private: RsaPrivateKey) -> Self {
        let public = PublicKey {
            inner: private.to_public_key(),
        };
        Self { private, public }
    }

    /// Returns the public half of the keypair.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Returns the modulus size in bits.
    pub fn bits(&self) -> usize {
        self.private.size() * 8
    }

    /// Encodes the private key as PKCS#1 DER.
    pub fn private_key_der(&self) -> Result<Zeroizing<Vec<u8>>, KeyError> {
        let doc = self
            .private
            .to_pkcs1_der()
            .map_err(|e| KeyError::EncodingFailed(e.to_string()))?;
        Ok(Zeroizing::new(doc.as_bytes().to_vec()))
    }

    /// Encodes the private key as a PKCS#1 PEM document.
    pub fn private_key_pem(&self) -> Result<Zeroizing<String>, KeyError> {
        self.private
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| KeyError::EncodingFailed(e.to_string()))
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("bits", &self.bits())
            .field("private", &"[REDACTED]")
            .finish()
    }
}

/// The public half of an RSA keypair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: RsaPublicKey,
}

impl PublicKey {
    /// Parses a PEM-encoded RSA public key.
    ///
    /// Accepts both PKCS#1 (`RSA PUBLIC KEY`) and SPKI (`PUBLIC KEY`).
    pub fn from_pem(pem: &str) -> Result<Self, KeyError> {
        let inner = RsaPublicKey::from_pkcs1_pem(pem).or_else(|pkcs1_err| {
            RsaPublicKey::from_public_key_pem(pem).map_err(|spki_err| {
                KeyError::InvalidKey(format!(
                    "not a PKCS#1 ({pkcs1_err}) or SPKI ({spki_err}) RSA public key"
                ))
            })
        })?;

        let bits = inner.size() * 8;
        if bits < MIN_KEY_BITS {
            return Err(KeyError::KeyTooSmall {
                bits,
                min_bits: MIN_KEY_BITS,
            });
        }

        Ok(Self { inner })
    }

    /// Reads and parses a PEM-encoded RSA public key file.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        let path = path.as_ref();
        let pem = std::fs::read_to_string(path).map_err(|source| KeyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_pem(&pem)
    }

    /// Returns the modulus size in bits.
    pub fn bits(&self) -> usize {
        self.inner.size() * 8
    }

    /// Encodes the key as PKCS#1 `RSAPublicKey` DER.
    pub fn to_pkcs1_der(&self) -> Result<Vec<u8>, KeyError> {
        self.inner
            .to_pkcs1_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| KeyError::EncodingFailed(e.to_string()))
    }

    /// Encodes the key as an SPKI PEM document.
    pub fn to_pem(&self) -> Result<String, KeyError> {
        self.inner
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyError::EncodingFailed(e.to_string()))
    }
}

fn read_secret(path: &Path) -> Result<Zeroizing<String>, KeyError> {
    std::fs::read_to_string(path)
        .map(Zeroizing::new)
        .map_err(|source| KeyError::Io {
            path: path.to_path_buf(),
            source,
        })
}
