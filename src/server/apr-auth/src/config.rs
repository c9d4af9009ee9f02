//! Token configuration.

use std::time::Duration;

use crate::error::SigningError;

/// Name of the APR service; the default issuer and audience.
pub const SERVICE_NAME: &str = "apr";

/// Default token lifetime.
pub const DEFAULT_VALIDITY: Duration = Duration::from_secs(24 * 60 * 60);

/// Values stamped into every issued token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    /// Issuer name written to `iss`, and the issuer verifiers trust.
    pub issuer: String,
    /// Audience used when the caller does not name one.
    pub default_audience: String,
    /// Time between `iat` and `exp`.
    pub validity: Duration,
}

impl TokenConfig {
    /// Creates a configuration with the default validity window.
    pub fn new(issuer: impl Into<String>, default_audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            default_audience: default_audience.into(),
            validity: DEFAULT_VALIDITY,
        }
    }

    /// Overrides the validity window.
    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), SigningError> {
        if self.issuer.is_empty() {
            return Err(SigningError::InvalidConfig("issuer must not be empty".into()));
        }
        if self.default_audience.is_empty() {
            return Err(SigningError::InvalidConfig(
                "default audience must not be empty".into(),
            ));
        }
        if self.validity.as_secs() == 0 {
            return Err(SigningError::InvalidConfig(
                "validity must be at least one second".into(),
            ));
        }
        Ok(())
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new(SERVICE_NAME, SERVICE_NAME)
    }
}
