//! Role-based access gate

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{
    error::{ApiError, AuthError},
    models::Role,
    principal::Principal,
};

/// `true` iff a principal is present and any of its roles meets `required`.
///
/// A missing principal is never authorized.
pub fn authorize(principal: Option<&Principal>, required: Role) -> bool {
    principal.is_some_and(|p| p.roles().iter().any(|role| role.meets(required)))
}

/// Like [`authorize`], but reports why access was refused.
pub fn check_access(principal: Option<&Principal>, required: Role) -> Result<(), AuthError> {
    match principal {
        None => Err(AuthError::MissingToken),
        Some(p) if authorize(Some(p), required) => Ok(()),
        Some(_) => Err(AuthError::InsufficientRole),
    }
}

/// Route-level middleware; the minimum role is the layer's state.
///
/// ```ignore
/// get(list_users).route_layer(middleware::from_fn_with_state(Role::Admin, require_role))
/// ```
pub async fn require_role(
    State(required): State<Role>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = req.extensions().get::<Principal>();

    if let Err(e) = check_access(principal, required) {
        warn!(
            user_id = ?principal.map(Principal::id),
            required = %required,
            "Access denied: {}",
            e
        );
        return Err(e.into());
    }

    Ok(next.run(req).await)
}
