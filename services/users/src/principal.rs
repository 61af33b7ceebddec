//! The authenticated identity attached to a request

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::{
    error::{ApiError, AuthError},
    models::{Role, User},
};

/// A validated (identity, role-set) pair.
///
/// The role-set is never empty; [`Principal::new`] refuses to build one
/// without roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    id: Uuid,
    roles: Vec<Role>,
}

impl Principal {
    /// Returns `None` when `roles` is empty.
    pub fn new(id: Uuid, roles: Vec<Role>) -> Option<Self> {
        if roles.is_empty() {
            return None;
        }
        Some(Self { id, roles })
    }

    /// Derive the principal for a stored user.
    pub fn from_user(user: &User) -> Option<Self> {
        Self::new(user.id, user.roles.clone())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

/// Handlers take `Principal` directly; the auth middleware must have run.
#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(ApiError::Auth(AuthError::MissingToken))
    }
}
