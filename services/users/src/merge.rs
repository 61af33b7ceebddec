//! Partial-update merge
//!
//! Builds the candidate entity for an update without touching storage:
//! fields present in the request replace the current ones, absent fields
//! are carried over, and a new password is hashed before it lands in the
//! draft. Roles are never changed here.

use chrono::{DateTime, Utc};

use crate::{
    models::{UpdateUser, User},
    password::{PasswordError, PasswordHasher},
};

/// Apply `request` onto a copy of `current`.
///
/// `updated_at` moves to `now` only when at least one field was present, so
/// an empty request yields a draft equal to `current`.
pub fn merge(
    current: &User,
    request: UpdateUser,
    hasher: &PasswordHasher,
    now: DateTime<Utc>,
) -> Result<User, PasswordError> {
    if request.is_empty() {
        return Ok(current.clone());
    }

    let mut draft = current.clone();

    if let Some(username) = request.username {
        draft.username = username;
    }
    if let Some(email) = request.email {
        draft.email = email;
    }
    if let Some(password) = request.password {
        draft.password_hash = hasher.hash(&password)?;
    }
    draft.bio = request.bio.apply(draft.bio);
    draft.updated_at = now;

    Ok(draft)
}
