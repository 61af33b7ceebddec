//! Error types shared by persistence code
//!
//! Every store implementation reports failures through [`DatabaseError`],
//! whatever the backing engine.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred while opening the connection pool
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred while creating or upgrading the schema
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// A unique constraint rejected the write (e.g. a taken email)
    #[error("Duplicate value for {0}")]
    Duplicate(String),

    /// A stored row could not be turned into a domain value
    #[error("Failed to decode stored record: {0}")]
    Decode(String),
}

impl DatabaseError {
    /// Classify a query failure, turning unique violations into [`DatabaseError::Duplicate`].
    ///
    /// The constraint name is kept as the duplicate subject so callers can
    /// tell a taken username from a taken email.
    pub fn from_query(err: SqlxError) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                let subject = db_err.constraint().unwrap_or("unique field").to_string();
                return DatabaseError::Duplicate(subject);
            }
        }
        DatabaseError::Query(err)
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
