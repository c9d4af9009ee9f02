//! Authentication error types.

use thiserror::Error;

/// Reasons a token is rejected by the verifier.
///
/// The messages are diagnostic and must not be sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// The token is not a well-formed JWT.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The header names an algorithm other than the pinned one.
    #[error("unexpected signing method: {0}")]
    UnexpectedSigningMethod(String),

    /// The signature does not match the public key.
    #[error("invalid signature")]
    InvalidSignature,

    /// The token is past its `exp` claim.
    #[error("token expired at {expired_at} (now {now})")]
    TokenExpired {
        /// The token's `exp` claim.
        expired_at: u64,
        /// Verification time.
        now: u64,
    },

    /// The token was not issued for this audience.
    #[error("invalid audience: expected {expected:?}, got {actual:?}")]
    AudienceMismatch {
        /// Audience the caller protects.
        expected: String,
        /// Audience found in the token.
        actual: Vec<String>,
    },

    /// The token was issued by someone else.
    #[error("invalid issuer: expected {expected:?}, got {actual:?}")]
    IssuerMismatch {
        /// Trusted issuer.
        expected: String,
        /// Issuer found in the token.
        actual: String,
    },
}

/// Errors that can occur while issuing a token.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The signing key could not be prepared.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// The token configuration is unusable.
    #[error("invalid token configuration: {0}")]
    InvalidConfig(String),

    /// Serializing or signing the claims failed.
    #[error("token signing failed: {0}")]
    SigningFailed(String),
}

/// Rejections produced by the bearer gate.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization` header was sent.
    #[error("missing header")]
    MissingHeader,

    /// The header is not `Bearer <token>`.
    #[error("invalid bearer format")]
    InvalidBearerFormat,

    /// The token failed verification.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] VerificationError),
}

impl AuthError {
    /// Message safe to return to the client.
    ///
    /// Verification details collapse into a single generic message.
    pub fn client_message(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "missing header",
            AuthError::InvalidBearerFormat => "invalid bearer format",
            AuthError::InvalidToken(_) => "invalid token",
        }
    }
}
