//! Service configuration read from the environment

use anyhow::Result;
use std::env;

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to
    pub bind_address: String,
}

impl ServerConfig {
    /// Create a new ServerConfig from environment variables
    ///
    /// # Environment Variables
    /// - `BIND_ADDRESS`: Listen address (default: 0.0.0.0:8585)
    pub fn from_env() -> Result<Self> {
        let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8585".to_string());

        if bind_address.trim().is_empty() {
            anyhow::bail!("BIND_ADDRESS must not be empty");
        }

        Ok(Self { bind_address })
    }
}

/// Initial administrator account
#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub username: String,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl SeedConfig {
    /// Create a new SeedConfig from environment variables
    ///
    /// # Environment Variables
    /// - `ADMIN_USERNAME`: Seed username (default: admin)
    /// - `ADMIN_EMAIL`: Seed email (optional)
    /// - `ADMIN_PASSWORD`: Seed password (optional)
    pub fn from_env() -> Self {
        let non_empty = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            username: non_empty("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
            email: non_empty("ADMIN_EMAIL"),
            password: non_empty("ADMIN_PASSWORD"),
        }
    }

    /// Email and password, when both are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.email.as_deref()?, self.password.as_deref()?))
    }
}
