//! Route handlers.

use apr_auth::Principal;
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::models::{HealthResponse, JwtResponse, LoginRequest, PrincipalResponse};
use crate::state::AppState;

/// `GET /api/health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/auth/login`
///
/// Checks the credentials against the stored hash and returns a token for
/// the requested service (or the default audience).
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<JwtResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let Some(hash) = state.credentials.password_hash(&request.username).await? else {
        warn!(username = %request.username, "Login for unknown user");
        return Err(ApiError::Unauthorized("invalid credentials"));
    };

    if !verify_password(request.password, hash).await? {
        warn!(username = %request.username, "Login with wrong password");
        return Err(ApiError::Unauthorized("invalid credentials"));
    }

    let audience = request.service.unwrap_or_default();
    let jwt = state.issuer.issue(&request.username, &audience)?;

    info!(username = %request.username, audience = %audience, "Login succeeded");
    Ok(Json(JwtResponse { jwt }))
}

/// `POST /api/auth/login/{service}`
///
/// Exchanges the caller's token for one addressed to another service.
pub async fn sso_login(
    State(state): State<AppState>,
    Path(service): Path<String>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<JwtResponse>, ApiError> {
    let jwt = state.issuer.issue(principal.as_str(), &service)?;

    info!(sub = %principal.subject, service = %service, "Issued SSO token");
    Ok(Json(JwtResponse { jwt }))
}

/// `GET /api/auth/principal`
pub async fn principal(Extension(principal): Extension<Principal>) -> Json<PrincipalResponse> {
    Json(PrincipalResponse {
        principal: principal.subject,
        expires_at: principal.expires_at,
    })
}

/// Verifies `password` against an argon2 PHC string off the async runtime.
async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash)
            .map_err(|e| ApiError::Internal(format!("unreadable password hash: {e}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("password check panicked: {e}")))?
}
