//! In-memory user store
//!
//! Enforces the same uniqueness rules as the PostgreSQL table so handler
//! behavior does not depend on which store is plugged in.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::UserStore;
use crate::models::User;

#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Reject `candidate` if another user already holds its username or email.
fn check_unique(users: &HashMap<Uuid, User>, candidate: &User) -> DatabaseResult<()> {
    for existing in users.values().filter(|u| u.id != candidate.id) {
        if existing.username == candidate.username {
            return Err(DatabaseError::Duplicate("users_username_key".to_string()));
        }
        if existing.email == candidate.email {
            return Err(DatabaseError::Duplicate("users_email_key".to_string()));
        }
    }
    Ok(())
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn list_all(&self) -> DatabaseResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn insert(&self, user: &User) -> DatabaseResult<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(DatabaseError::Duplicate("users_pkey".to_string()));
        }
        check_unique(&users, user)?;
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn replace(&self, user: &User) -> DatabaseResult<bool> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Ok(false);
        }
        check_unique(&users, user)?;
        users.insert(user.id, user.clone());
        Ok(true)
    }

    async fn delete_by_id(&self, id: Uuid) -> DatabaseResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}
