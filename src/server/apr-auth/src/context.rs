//! Authenticated request context.

use crate::claims::ClaimSet;

/// The identity resolved from a verified token.
///
/// Attached to the request by the gate and read by downstream handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Principal identifier (the token's `sub` claim).
    pub subject: String,

    /// Token expiration timestamp (Unix seconds).
    pub expires_at: u64,
}

impl Principal {
    /// Returns the principal identifier.
    pub fn as_str(&self) -> &str {
        &self.subject
    }
}

impl From<ClaimSet> for Principal {
    fn from(claims: ClaimSet) -> Self {
        Self {
            subject: claims.sub,
            expires_at: claims.exp,
        }
    }
}
