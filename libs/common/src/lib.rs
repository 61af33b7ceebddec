//! Shared infrastructure for the user-management workspace
//!
//! This crate holds what every service needs to talk to PostgreSQL:
//! connection configuration, pool construction, a health check and the
//! error type persistence code reports through.

pub mod database;
pub mod error;

/// Example usage of the database module
///
/// ```rust,no_run
/// use common::database::{DatabaseConfig, health_check, init_pool};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::from_env()?;
///     let pool = init_pool(&config).await?;
///     println!("Database reachable: {}", health_check(&pool).await?);
///     Ok(())
/// }
/// ```
pub use database::{DatabaseConfig, health_check, init_pool};
pub use error::{DatabaseError, DatabaseResult};
