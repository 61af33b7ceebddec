use std::sync::Arc;

use anyhow::Result;
use axum::{ServiceExt, extract::Request};
use common::database;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use users::{
    AppState,
    config::{SeedConfig, ServerConfig},
    jwt::{JwtConfig, JwtService},
    login_throttle::{LoginThrottle, LoginThrottleConfig},
    middleware::public_route,
    password::PasswordHasher,
    repositories::PgUserStore,
    routes, seed,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting user-management service");

    let server_config = ServerConfig::from_env()?;
    let jwt_config = JwtConfig::from_env()?;
    let throttle_config = LoginThrottleConfig::from_env()?;

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let user_store = PgUserStore::new(pool);
    user_store.ensure_schema().await?;

    let password_hasher = PasswordHasher::default();
    seed::seed_admin(&user_store, &password_hasher, &SeedConfig::from_env()).await?;

    let app_state = AppState {
        user_store: Arc::new(user_store),
        jwt_service: JwtService::new(&jwt_config),
        password_hasher,
        login_throttle: LoginThrottle::new(throttle_config),
        skip_auth: public_route,
    };

    // Start the web server
    let app = routes::create_app(app_state);

    let listener = TcpListener::bind(&server_config.bind_address).await?;
    info!(
        "User-management service listening on {}",
        server_config.bind_address
    );

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;

    Ok(())
}
