//! User-management service
//!
//! Registration, login and account administration over HTTP. Requests carry
//! an HS256 bearer token; the auth middleware turns it into a
//! [`principal::Principal`] and route layers gate on [`models::Role`].

pub mod access;
pub mod config;
pub mod error;
pub mod jwt;
pub mod login_throttle;
pub mod merge;
pub mod middleware;
pub mod models;
pub mod password;
pub mod principal;
pub mod repositories;
pub mod routes;
pub mod seed;
pub mod validation;

use std::sync::Arc;

use crate::{
    jwt::JwtService, login_throttle::LoginThrottle, middleware::SkipPredicate,
    password::PasswordHasher, repositories::UserStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_store: Arc<dyn UserStore>,
    pub jwt_service: JwtService,
    pub password_hasher: PasswordHasher,
    pub login_throttle: LoginThrottle,
    pub skip_auth: SkipPredicate,
}
