//! User-management service routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{
        Method, StatusCode,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
    },
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::Layer;
use tower_http::{
    cors::{Any, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, error, info, warn};
use uuid::Uuid;

use crate::{
    AppState,
    access::require_role,
    error::{ApiError, ApiResult, AuthError},
    merge::merge,
    middleware::auth_middleware,
    models::{AdminNewUser, LoginCredentials, NewUser, Role, SetRoles, UpdateUser, User},
    principal::Principal,
    validation,
};

/// Public view of a user; never carries the password hash
#[derive(Debug, Serialize)]
pub struct UserBody {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl UserBody {
    fn new(user: User, token: Option<String>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            bio: user.bio,
            roles: user.roles,
            created_at: user.created_at,
            updated_at: user.updated_at,
            token,
        }
    }
}

/// Response wrapping a single user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserBody,
}

impl UserResponse {
    fn new(user: User, token: Option<String>) -> Json<Self> {
        Json(Self {
            user: UserBody::new(user, token),
        })
    }
}

/// Response for the admin user listing
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserBody>,
}

/// The service as it is served: trailing slashes are trimmed before routing,
/// so `/api/users/login/` reaches the login handler.
pub fn create_app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(create_router(state))
}

/// Any origin may call the API with a bearer token.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers([ORIGIN, CONTENT_TYPE, ACCEPT, AUTHORIZATION])
}

/// Create the router for the user-management service
///
/// Every route except those accepted by `state.skip_auth` goes through
/// [`auth_middleware`]; administrative routes additionally require
/// [`Role::Admin`].
pub fn create_router(state: AppState) -> Router {
    let admin_only = || middleware::from_fn_with_state(Role::Admin, require_role);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/users", post(sign_up))
        .route("/api/users/login", post(login))
        .route("/api/user/info", get(current_user))
        // GET and POST are admin-only; PUT edits the caller's own profile.
        .route(
            "/api/user",
            get(list_users)
                .post(insert_user)
                .route_layer(admin_only())
                .put(update_profile),
        )
        .route(
            "/api/user/:id",
            put(update_user)
                .delete(delete_user)
                .route_layer(admin_only()),
        )
        .route(
            "/api/user/:id/roles",
            put(set_roles).route_layer(admin_only()),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(cors_layer())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "users"
    }))
}

/// Self-service registration; new users are guests
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_new_user(&payload).map_err(ApiError::Validation)?;

    let user = create_user(&state, payload, vec![Role::Guest]).await?;
    info!(user_id = %user.id, "Registered user {}", user.username);

    let token = issue_token(&state, &user)?;
    Ok((StatusCode::CREATED, UserResponse::new(user, Some(token))))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginCredentials>,
) -> ApiResult<impl IntoResponse> {
    let throttle_key = payload.email.to_lowercase();

    // Reserved before the password check; only a success releases it.
    if !state.login_throttle.try_begin(&throttle_key).await {
        warn!(email = %throttle_key, "Login throttled");
        return Err(ApiError::TooManyAttempts);
    }

    let user = state
        .user_store
        .find_by_email(&payload.email)
        .await?
        .filter(|user| {
            state
                .password_hasher
                .verify(&user.password_hash, &payload.password)
        });

    let Some(user) = user else {
        warn!(email = %throttle_key, "Login failed");
        return Err(ApiError::InvalidCredentials);
    };

    state.login_throttle.reset(&throttle_key).await;
    info!(user_id = %user.id, "User logged in");

    let token = issue_token(&state, &user)?;
    Ok(UserResponse::new(user, Some(token)))
}

/// The authenticated user's own record
pub async fn current_user(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<impl IntoResponse> {
    let user = find_user(&state, principal.id()).await?;
    Ok(UserResponse::new(user, None))
}

/// Partial update of the authenticated user's own record
pub async fn update_profile(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<UpdateUser>,
) -> ApiResult<impl IntoResponse> {
    let user = apply_update(&state, principal.id(), payload).await?;
    Ok(UserResponse::new(user, None))
}

/// List all users (admin)
pub async fn list_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users = state.user_store.list_all().await?;

    Ok(Json(UserListResponse {
        users: users
            .into_iter()
            .map(|user| UserBody::new(user, None))
            .collect(),
    }))
}

/// Create a user with explicit roles (admin)
pub async fn insert_user(
    State(state): State<AppState>,
    Json(payload): Json<AdminNewUser>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_new_user(&payload.user).map_err(ApiError::Validation)?;

    let roles = dedup_roles(payload.roles.unwrap_or_else(|| vec![Role::Guest]));
    validation::validate_roles(&roles).map_err(ApiError::Validation)?;

    let user = create_user(&state, payload.user, roles).await?;
    info!(user_id = %user.id, "Admin created user {}", user.username);

    Ok((StatusCode::CREATED, UserResponse::new(user, None)))
}

/// Partial update of any user (admin)
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUser>,
) -> ApiResult<impl IntoResponse> {
    let user = apply_update(&state, id, payload).await?;
    Ok(UserResponse::new(user, None))
}

/// Replace a user's role set (admin)
pub async fn set_roles(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetRoles>,
) -> ApiResult<impl IntoResponse> {
    let roles = dedup_roles(payload.roles);
    validation::validate_roles(&roles).map_err(ApiError::Validation)?;

    let mut user = find_user(&state, id).await?;
    user.roles = roles;
    user.updated_at = Utc::now();

    if !state.user_store.replace(&user).await? {
        return Err(AuthError::NotFound.into());
    }

    info!(user_id = %user.id, roles = ?user.roles, "Replaced user roles");
    Ok(UserResponse::new(user, None))
}

/// Delete a user (admin)
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if !state.user_store.delete_by_id(id).await? {
        return Err(AuthError::NotFound.into());
    }

    info!(user_id = %id, "Deleted user");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_user(state: &AppState, id: Uuid) -> ApiResult<User> {
    state
        .user_store
        .find_by_id(id)
        .await?
        .ok_or(ApiError::Auth(AuthError::NotFound))
}

async fn create_user(state: &AppState, payload: NewUser, roles: Vec<Role>) -> ApiResult<User> {
    let password_hash = state.password_hasher.hash(&payload.password)?;
    let user = User::new(
        payload.username,
        payload.email,
        password_hash,
        payload.bio,
        roles,
    );

    state.user_store.insert(&user).await?;
    Ok(user)
}

async fn apply_update(state: &AppState, id: Uuid, payload: UpdateUser) -> ApiResult<User> {
    validation::validate_update(&payload).map_err(ApiError::Validation)?;

    let current = find_user(state, id).await?;
    let draft = merge(&current, payload, &state.password_hasher, Utc::now())?;

    if draft == current {
        return Ok(current);
    }

    if !state.user_store.replace(&draft).await? {
        return Err(AuthError::NotFound.into());
    }

    info!(user_id = %draft.id, "Updated user");
    Ok(draft)
}

fn issue_token(state: &AppState, user: &User) -> ApiResult<String> {
    let principal = Principal::from_user(user).ok_or_else(|| {
        error!(user_id = %user.id, "User has no roles; cannot issue token");
        ApiError::InternalServerError
    })?;

    state
        .jwt_service
        .issue(&principal, Utc::now())
        .map_err(|e| {
            error!("Failed to issue token: {}", e);
            ApiError::InternalServerError
        })
}

fn dedup_roles(roles: Vec<Role>) -> Vec<Role> {
    let mut unique = Vec::with_capacity(roles.len());
    for role in roles {
        if !unique.contains(&role) {
            unique.push(role);
        }
    }
    unique
}
