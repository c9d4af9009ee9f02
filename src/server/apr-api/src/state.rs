//! Shared handler state.

use std::sync::Arc;

use apr_auth::{AuthGate, TokenIssuer};
use apr_storage::CredentialStore;

/// State shared by every request.
///
/// Everything inside is immutable, so cloning per request is cheap and
/// needs no locking.
#[derive(Clone)]
pub struct AppState {
    /// Signs tokens on login and SSO.
    pub issuer: Arc<TokenIssuer>,
    /// Guards protected routes.
    pub gate: Arc<AuthGate>,
    /// Source of stored password hashes.
    pub credentials: Arc<dyn CredentialStore>,
}

impl AppState {
    /// Creates the application state.
    pub fn new(
        issuer: TokenIssuer,
        gate: AuthGate,
        credentials: impl CredentialStore + 'static,
    ) -> Self {
        Self {
            issuer: Arc::new(issuer),
            gate: Arc::new(gate),
            credentials: Arc::new(credentials),
        }
    }
}
