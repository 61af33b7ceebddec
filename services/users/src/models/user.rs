//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::Role;

/// User entity
///
/// `password_hash` always holds an argon2 PHC string, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh user with a new id and both timestamps set to now.
    pub fn new(
        username: String,
        email: String,
        password_hash: String,
        bio: Option<String>,
        roles: Vec<Role>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            bio,
            roles,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A field of a sparse update that can be absent, explicitly null, or set.
///
/// Use with `#[serde(default)]`: a missing key stays [`Patch::Absent`],
/// `null` becomes [`Patch::Clear`], any value becomes [`Patch::Set`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// Resolve against the current optional value.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Absent => current,
            Patch::Clear => None,
            Patch::Set(value) => Some(value),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Set(value),
            None => Patch::Clear,
        })
    }
}

/// User update payload
///
/// `None` leaves a field untouched; `Some("")` is an explicit value.
/// `password` carries plaintext and is hashed during the merge.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub bio: Patch<String>,
}

impl UpdateUser {
    /// `true` when no field is present.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.bio.is_absent()
    }
}

/// User login credentials
#[derive(Debug, Clone, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Self-service registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Admin insert payload; `roles` defaults to `[Guest]`
#[derive(Debug, Clone, Deserialize)]
pub struct AdminNewUser {
    #[serde(flatten)]
    pub user: NewUser,
    #[serde(default)]
    pub roles: Option<Vec<Role>>,
}

/// Role replacement payload
#[derive(Debug, Clone, Deserialize)]
pub struct SetRoles {
    pub roles: Vec<Role>,
}
