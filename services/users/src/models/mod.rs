//! User-management models

pub mod role;
pub mod user;

// Re-export for convenience
pub use role::{InvalidRole, Role};
pub use user::{AdminNewUser, LoginCredentials, NewUser, Patch, SetRoles, UpdateUser, User};
