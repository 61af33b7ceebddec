//! Middleware for JWT token validation and authentication

use axum::{
    extract::{Request, State},
    http::{Method, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{debug, warn};

use crate::{AppState, error::ApiError};

/// Decides which requests bypass authentication
pub type SkipPredicate = fn(&Method, &str) -> bool;

/// Default predicate: health, registration and login are public.
pub fn public_route(method: &Method, path: &str) -> bool {
    match path {
        "/health" => *method == Method::GET,
        "/api/users" | "/api/users/login" => *method == Method::POST,
        _ => false,
    }
}

/// Verify the bearer token and attach the resulting [`Principal`] to the request
///
/// [`Principal`]: crate::principal::Principal
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if (state.skip_auth)(req.method(), req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let principal = state
        .jwt_service
        .verify_header(header, Utc::now())
        .map_err(|e| {
            warn!(
                method = %req.method(),
                path = req.uri().path(),
                "Rejected request: {}",
                e
            );
            ApiError::Auth(e)
        })?;

    debug!(user_id = %principal.id(), "Authenticated request");
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}
