//! Token verification.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. structure (three segments, decodable header)
//! 2. algorithm pinned to [`SIGNING_ALGORITHM`]
//! 3. signature against the configured public key
//! 4. expiry
//! 5. audience
//! 6. issuer
//!
//! The algorithm is read from the raw header before the JWT library sees
//! the token, so `none` or HMAC headers are rejected as
//! [`VerificationError::UnexpectedSigningMethod`] and never reach a key.

use apr_crypto::{KeyError, PublicKey};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::claims::{now_unix, ClaimSet};
use crate::error::VerificationError;

/// The only algorithm tokens are signed and accepted with.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::RS512;

const SIGNING_ALGORITHM_NAME: &str = "RS512";

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Verifies tokens against a known public key.
///
/// Holds no mutable state; every call re-verifies from scratch.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Creates a verifier for tokens signed by the holder of `public_key`.
    pub fn new(public_key: &PublicKey) -> Result<Self, KeyError> {
        let key = DecodingKey::from_rsa_der(&public_key.to_pkcs1_der()?);

        // Claims are checked here, in order, after the signature.
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self { key, validation })
    }

    /// Verifies `token` for `expected_audience`, issued by `expected_issuer`.
    pub fn verify(
        &self,
        token: &str,
        expected_audience: &str,
        expected_issuer: &str,
    ) -> Result<ClaimSet, VerificationError> {
        self.verify_at(token, expected_audience, expected_issuer, now_unix())
    }

    /// Verifies `token` as if the current time were `now`.
    pub fn verify_at(
        &self,
        token: &str,
        expected_audience: &str,
        expected_issuer: &str,
        now: u64,
    ) -> Result<ClaimSet, VerificationError> {
        let header = parse_header(token)?;

        if header.alg != SIGNING_ALGORITHM_NAME {
            return Err(VerificationError::UnexpectedSigningMethod(header.alg));
        }

        let claims = decode::<ClaimSet>(token, &self.key, &self.validation)
            .map_err(map_jwt_error)?
            .claims;

        if now >= claims.exp {
            return Err(VerificationError::TokenExpired {
                expired_at: claims.exp,
                now,
            });
        }

        if !claims.has_audience(expected_audience) {
            return Err(VerificationError::AudienceMismatch {
                expected: expected_audience.to_string(),
                actual: claims.aud,
            });
        }

        if claims.iss != expected_issuer {
            return Err(VerificationError::IssuerMismatch {
                expected: expected_issuer.to_string(),
                actual: claims.iss,
            });
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithm", &SIGNING_ALGORITHM)
            .finish()
    }
}

/// Splits the token and decodes its header.
///
/// The signature segment may be empty here so that unsigned tokens are
/// reported by the algorithm check rather than as malformed.
fn parse_header(token: &str) -> Result<RawHeader, VerificationError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, claims, _signature] = segments.as_slice() else {
        return Err(VerificationError::MalformedToken(format!(
            "expected 3 segments, got {}",
            segments.len()
        )));
    };
    if header.is_empty() || claims.is_empty() {
        return Err(VerificationError::MalformedToken("empty segment".into()));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|e| VerificationError::MalformedToken(format!("header: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| VerificationError::MalformedToken(format!("header: {e}")))
}

/// Maps jsonwebtoken errors to our rejection reasons.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> VerificationError {
    match error.kind() {
        ErrorKind::InvalidSignature => VerificationError::InvalidSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            VerificationError::UnexpectedSigningMethod(error.to_string())
        },
        _ => VerificationError::MalformedToken(error.to_string()),
    }
}
