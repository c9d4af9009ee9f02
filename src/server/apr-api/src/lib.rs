//! # APR API
//!
//! REST layer for the APR authentication service.
//!
//! ## Endpoints
//!
//! - `GET  /api/health` - liveness check
//! - `POST /api/auth/login` - exchange credentials for a token
//! - `POST /api/auth/login/{service}` - exchange a token for one addressed
//!   to another service (bearer required)
//! - `GET  /api/auth/principal` - echo the authenticated principal (bearer
//!   required)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/login/{service}", post(handlers::sso_login))
        .route("/api/auth/principal", get(handlers::principal))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_principal,
        ));

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/auth/login", post(handlers::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
