//! Bearer authentication middleware.

use apr_auth::AuthError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Rejects requests without a valid bearer token and attaches the
/// [`apr_auth::Principal`] as a request extension otherwise.
pub async fn require_principal(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = match request.headers().get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| AuthError::InvalidBearerFormat)?),
        None => None,
    };

    let principal = state.gate.authenticate(header).inspect_err(|e| {
        debug!(
            service = %state.gate.service(),
            path = %request.uri().path(),
            reason = %e,
            "Unauthenticated request"
        );
    })?;

    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}
