//! Defines the Axum API routes and handlers.

use crate::auth::{AuthGate, TokenService};
use crate::store::RecordStore;
use crate::web::cors::AllowedOrigins;
use crate::web::error::ApiError;
use crate::web::extract::CurrentUser;
use crate::web::login_rate_limit::login_rate_limit_middleware;
use crate::web::models::{
    AuthRequest, HealthResponse, ItemRequest, ItemsResponse, LoginResponse, UserResponse, UsersResponse,
};
use crate::web::rate_limiter::RateLimiter;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use itemvault_shared::{Item, Role};
use std::sync::Arc;
use uuid::Uuid;

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

pub struct AppStateInner {
    pub store: Arc<RecordStore>,
    pub gate: AuthGate,
    pub rate_limiter: RateLimiter,
}
pub type AppState = Arc<AppStateInner>;

impl AppStateInner {
    pub fn new(store: Arc<RecordStore>, tokens: Arc<TokenService>, rate_limiter: RateLimiter) -> AppState {
        Arc::new(Self {
            store,
            gate: AuthGate::new(tokens),
            rate_limiter,
        })
    }
}

/// Creates the Axum router with all the API endpoints.
pub fn create_router_with_state(state: AppState, origins: &AllowedOrigins) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/register", post(register))
        .route(
            "/api/login",
            post(login).route_layer(axum::middleware::from_fn_with_state(state.clone(), login_rate_limit_middleware)),
        )
        .route("/api/me", get(me))
        .route("/api/items", get(list_items).post(create_item))
        .route("/api/items/{id}", get(get_item).put(update_item).delete(delete_item))
        .route("/api/users", get(list_users))
        .route("/api/users/{id}", get(get_user).delete(delete_user))
        .with_state(state)
        .layer(origins.layer())
}

/// Ids that are not UUIDs cannot name anything in the store.
fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(not_found.to_string()))
}

/// GET /api/health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}

/// POST /api/register -- always creates a plain user
async fn register(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<AuthRequest>, ApiError>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let username = payload.username.trim();
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let user = state.store.create_user(username, &payload.password, Role::User.as_str()).await?;
    tracing::info!(user_id = %user.id, "Registered user '{}'", user.username);
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/login
async fn login(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<AuthRequest>, ApiError>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = match state.store.authenticate(&payload.username, &payload.password).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Failed login for '{}'", payload.username.trim());
            return Err(e.into());
        }
    };
    let token = state.gate.tokens().issue(&user)?;
    tracing::info!(user_id = %user.id, "Issued token for '{}'", user.username);
    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// GET /api/me -- the identity carried by the presented token
async fn me(CurrentUser(identity): CurrentUser) -> Json<crate::auth::Identity> {
    Json(identity)
}

/// GET /api/items
async fn list_items(State(state): State<AppState>, CurrentUser(_): CurrentUser) -> Json<ItemsResponse> {
    Json(ItemsResponse {
        items: state.store.list_items().await,
    })
}

/// GET /api/items/{id}
async fn get_item(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    let id = parse_id(&id, "item not found")?;
    Ok(Json(state.store.get_item(id).await?))
}

/// POST /api/items -- owned by the caller
async fn create_item(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    WithRejection(Json(payload), _): WithRejection<Json<ItemRequest>, ApiError>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let item = state
        .store
        .create_item(&identity.username, &payload.title, &payload.description)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/items/{id} -- owner or admin
async fn update_item(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<ItemRequest>, ApiError>,
) -> Result<Json<Item>, ApiError> {
    let id = parse_id(&id, "item not found")?;
    let item = state
        .store
        .update_item(id, &identity.username, identity.is_admin(), &payload.title, &payload.description)
        .await?;
    Ok(Json(item))
}

/// DELETE /api/items/{id} -- admin only
async fn delete_item(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.gate.require_role(Some(&identity), &[Role::Admin])?;
    let id = parse_id(&id, "item not found")?;
    state.store.delete_item(id).await?;
    tracing::info!(item_id = %id, "Item deleted by '{}'", identity.username);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users -- admin only
async fn list_users(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<UsersResponse>, ApiError> {
    state.gate.require_role(Some(&identity), &[Role::Admin])?;
    let users = state.store.list_users().await.into_iter().map(UserResponse::from).collect();
    Ok(Json(UsersResponse { users }))
}

/// GET /api/users/{id} -- admin only
async fn get_user(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    state.gate.require_role(Some(&identity), &[Role::Admin])?;
    let id = parse_id(&id, "user not found")?;
    Ok(Json(state.store.get_user(id).await?.into()))
}

/// DELETE /api/users/{id} -- admin only, never the caller's own account
async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.gate.require_role(Some(&identity), &[Role::Admin])?;
    let id = parse_id(&id, "user not found")?;
    if id == identity.id {
        return Err(ApiError::BadRequest("cannot delete your own account".to_string()));
    }
    state.store.delete_user(id).await?;
    tracing::info!(user_id = %id, "User deleted by '{}'", identity.username);
    Ok(StatusCode::NO_CONTENT)
}
