//! Request and response bodies.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Credentials posted to the login endpoint.
#[derive(Deserialize)]
pub struct LoginRequest {
    /// Username.
    pub username: String,
    /// Plain-text password.
    pub password: String,
    /// Service the token is for; written to the `aud` claim.
    #[serde(default)]
    pub service: Option<String>,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("service", &self.service)
            .finish()
    }
}

/// A freshly issued token.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtResponse {
    /// The signed token.
    pub jwt: String,
}

/// The authenticated principal.
#[derive(Debug, Serialize, Deserialize)]
pub struct PrincipalResponse {
    /// Principal identifier.
    pub principal: String,
    /// Token expiration (Unix seconds).
    pub expires_at: u64,
}

/// Health check.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Server version.
    pub version: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Client-safe error message.
    pub error: String,
}
