//! # APR Crypto
//!
//! Signing key management for APR tokens.
//!
//! This crate owns the RSA keypair used to sign and verify tokens:
//! - Loading PEM-encoded private keys (PKCS#1 or PKCS#8)
//! - Generating a fresh keypair when no key file exists (dev fallback)
//! - Loading PEM-encoded public keys for verifier-only services
//! - Exporting keys to PEM/DER for the token layer and tooling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod keys;
pub mod store;

pub use error::KeyError;
pub use keys::{Keypair, PublicKey, MIN_KEY_BITS};
pub use store::{KeySource, KeyStore, LoadedKey};
