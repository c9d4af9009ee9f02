//! Bearer token gate.
//!
//! Framework-independent: takes the raw `Authorization` header value and
//! returns the [`Principal`] or a rejection. The HTTP layer turns a
//! rejection into a 401 using [`AuthError::client_message`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::claims::now_unix;
use crate::context::Principal;
use crate::error::AuthError;
use crate::verifier::TokenVerifier;

const BEARER_SCHEME: &str = "Bearer";

/// Authenticates requests for one protected service.
#[derive(Debug, Clone)]
pub struct AuthGate {
    verifier: Arc<TokenVerifier>,
    service: String,
    trusted_issuer: String,
}

impl AuthGate {
    /// Creates a gate accepting tokens for `service` issued by
    /// `trusted_issuer`.
    pub fn new(
        verifier: Arc<TokenVerifier>,
        service: impl Into<String>,
        trusted_issuer: impl Into<String>,
    ) -> Self {
        Self {
            verifier,
            service: service.into(),
            trusted_issuer: trusted_issuer.into(),
        }
    }

    /// Returns the service this gate protects.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Authenticates a request from its `Authorization` header.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Principal, AuthError> {
        self.authenticate_at(authorization, now_unix())
    }

    /// Authenticates as if the current time were `now`.
    pub fn authenticate_at(
        &self,
        authorization: Option<&str>,
        now: u64,
    ) -> Result<Principal, AuthError> {
        let header = authorization.ok_or(AuthError::MissingHeader)?;
        let token = bearer_token(header).ok_or(AuthError::InvalidBearerFormat)?;

        let claims = self
            .verifier
            .verify_at(token, &self.service, &self.trusted_issuer, now)
            .map_err(|e| {
                warn!(service = %self.service, reason = %e, "Rejected bearer token");
                AuthError::InvalidToken(e)
            })?;

        debug!(service = %self.service, sub = %claims.sub, "Authenticated request");
        Ok(Principal::from(claims))
    }
}

/// Extracts `<token>` from exactly `Bearer <token>`.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if scheme != BEARER_SCHEME || token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}
