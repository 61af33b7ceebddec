//! Startup seeding of the administrator account

use anyhow::Result;
use tracing::{info, warn};

use crate::{
    config::SeedConfig,
    models::{Role, User},
    password::PasswordHasher,
    repositories::UserStore,
};

/// Insert the configured admin unless a user with that name already exists.
///
/// Returns `true` when a user was inserted. The password is hashed but not
/// checked against the strength rules.
pub async fn seed_admin(
    store: &dyn UserStore,
    hasher: &PasswordHasher,
    config: &SeedConfig,
) -> Result<bool> {
    let Some((email, password)) = config.credentials() else {
        warn!("ADMIN_EMAIL or ADMIN_PASSWORD not set; skipping admin seed");
        return Ok(false);
    };

    if store.find_by_username(&config.username).await?.is_some() {
        info!("Admin user {} already present", config.username);
        return Ok(false);
    }

    let admin = User::new(
        config.username.clone(),
        email.to_string(),
        hasher.hash(password)?,
        None,
        vec![Role::Admin],
    );
    store.insert(&admin).await?;

    info!(user_id = %admin.id, "Seeded admin user {}", admin.username);
    Ok(true)
}
