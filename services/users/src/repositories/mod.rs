//! User persistence
//!
//! Handlers only see [`UserStore`]; the PostgreSQL implementation backs the
//! running service and the in-memory one backs tests.

use async_trait::async_trait;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::User;

pub mod memory;
pub mod user;

pub use memory::InMemoryUserStore;
pub use user::PgUserStore;

/// Storage operations over the `users` collection
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>>;

    /// All users, ordered by username
    async fn list_all(&self) -> DatabaseResult<Vec<User>>;

    /// Fails with `DatabaseError::Duplicate` when the username or email is taken
    async fn insert(&self, user: &User) -> DatabaseResult<()>;

    /// Overwrite the stored user with the same id; `false` if none matched
    async fn replace(&self, user: &User) -> DatabaseResult<bool>;

    /// `false` if no user had that id
    async fn delete_by_id(&self, id: Uuid) -> DatabaseResult<bool>;
}
