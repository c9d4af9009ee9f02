//! Token issuance.

use apr_crypto::Keypair;
use jsonwebtoken::{encode, EncodingKey, Header};
use tracing::{debug, error};

use crate::claims::{now_unix, ClaimSet};
use crate::config::TokenConfig;
use crate::error::SigningError;
use crate::verifier::SIGNING_ALGORITHM;

/// Signs tokens with the service's private key.
///
/// Owns the only copy of the private key outside the key store. Safe to
/// share across threads; issuing takes `&self`.
pub struct TokenIssuer {
    key: EncodingKey,
    config: TokenConfig,
}

impl TokenIssuer {
    /// Creates an issuer from a keypair and token configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::InvalidConfig`] for an unusable configuration
    /// and [`SigningError::InvalidKey`] if the key cannot be encoded.
    pub fn new(keypair: &Keypair, config: TokenConfig) -> Result<Self, SigningError> {
        config.validate()?;

        let der = keypair
            .private_key_der()
            .map_err(|e| SigningError::InvalidKey(e.to_string()))?;

        Ok(Self {
            key: EncodingKey::from_rsa_der(&der),
            config,
        })
    }

    /// Returns the issuer configuration.
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Issues a token for `subject`, valid for `audience`.
    ///
    /// An empty audience falls back to the configured default audience.
    pub fn issue(&self, subject: &str, audience: &str) -> Result<String, SigningError> {
        self.issue_at(subject, audience, now_unix())
    }

    /// Issues a token as if the current time were `issued_at`.
    pub fn issue_at(
        &self,
        subject: &str,
        audience: &str,
        issued_at: u64,
    ) -> Result<String, SigningError> {
        let claims = self.claims(subject, audience, issued_at);

        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.key).map_err(|e| {
            error!(error = %e, "Token signing failed");
            SigningError::SigningFailed(e.to_string())
        })?;

        debug!(sub = %claims.sub, aud = ?claims.aud, exp = claims.exp, "Issued token");
        Ok(token)
    }

    fn claims(&self, subject: &str, audience: &str, issued_at: u64) -> ClaimSet {
        let audience = if audience.is_empty() {
            self.config.default_audience.clone()
        } else {
            audience.to_string()
        };

        ClaimSet {
            iss: self.config.issuer.clone(),
            sub: subject.to_string(),
            aud: vec![audience],
            iat: issued_at,
            exp: issued_at.saturating_add(self.config.validity.as_secs()),
        }
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("key", &"[REDACTED]")
            .field("config", &self.config)
            .finish()
    }
}
