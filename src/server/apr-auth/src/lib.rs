//! # APR Auth
//!
//! Token-based authentication for the APR backend.
//!
//! ## Components
//!
//! - [`TokenIssuer`] - signs RS512 tokens for a subject and audience
//! - [`TokenVerifier`] - checks structure, algorithm, signature, expiry,
//!   audience and issuer, in that order
//! - [`AuthGate`] - turns an `Authorization` header into a [`Principal`]
//!
//! Issuer and verifier are independent; both are built from the keypair
//! managed by `apr-crypto`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod claims;
pub mod config;
pub mod context;
pub mod error;
pub mod gate;
pub mod issuer;
pub mod verifier;

pub use claims::ClaimSet;
pub use config::TokenConfig;
pub use context::Principal;
pub use error::{AuthError, SigningError, VerificationError};
pub use gate::AuthGate;
pub use issuer::TokenIssuer;
pub use verifier::{TokenVerifier, SIGNING_ALGORITHM};
