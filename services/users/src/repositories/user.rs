//! PostgreSQL-backed user store

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{debug, info};
use uuid::Uuid;

use super::UserStore;
use crate::models::{Role, User};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, bio, roles, created_at, updated_at";

/// User repository
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `users` table if it does not exist yet
    pub async fn ensure_schema(&self) -> DatabaseResult<()> {
        info!("Ensuring users schema");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                username TEXT NOT NULL CONSTRAINT users_username_key UNIQUE,
                email TEXT NOT NULL CONSTRAINT users_email_key UNIQUE,
                password_hash TEXT NOT NULL,
                bio TEXT,
                roles SMALLINT[] NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn find_one(&self, column: &str, value: &str) -> DatabaseResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        row.map(|row| user_from_row(&row)).transpose()
    }
}

fn user_from_row(row: &PgRow) -> DatabaseResult<User> {
    let decode = |e: sqlx::Error| DatabaseError::Decode(e.to_string());

    let ordinals: Vec<i16> = row.try_get("roles").map_err(decode)?;
    let roles = ordinals
        .into_iter()
        .map(|ordinal| Role::try_from(i64::from(ordinal)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DatabaseError::Decode(e.to_string()))?;

    Ok(User {
        id: row.try_get("id").map_err(decode)?,
        username: row.try_get("username").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        password_hash: row.try_get("password_hash").map_err(decode)?,
        bio: row.try_get("bio").map_err(decode)?,
        roles,
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}

fn role_ordinals(user: &User) -> Vec<i16> {
    user.roles.iter().map(|role| role.ordinal()).collect()
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        debug!("Finding user by ID: {}", id);

        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        row.map(|row| user_from_row(&row)).transpose()
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        debug!("Finding user by email");
        self.find_one("email", email).await
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        debug!("Finding user by username: {}", username);
        self.find_one("username", username).await
    }

    async fn list_all(&self) -> DatabaseResult<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY username", USER_COLUMNS);
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        rows.iter().map(user_from_row).collect()
    }

    async fn insert(&self, user: &User) -> DatabaseResult<()> {
        info!("Creating new user: {}", user.username);

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, bio, roles, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.bio)
        .bind(role_ordinals(user))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(())
    }

    async fn replace(&self, user: &User) -> DatabaseResult<bool> {
        info!("Replacing user: {}", user.id);

        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, password_hash = $4, bio = $5, roles = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.bio)
        .bind(role_ordinals(user))
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_id(&self, id: Uuid) -> DatabaseResult<bool> {
        info!("Deleting user: {}", id);

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }
}
