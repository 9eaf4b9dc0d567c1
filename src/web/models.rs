//! Contains the data models for API requests and responses.

use chrono::{DateTime, Utc};
use itemvault_shared::{Item, Role, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a registration or login request.
#[derive(Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

/// A user as shown to clients.
#[derive(Serialize, Deserialize, Debug)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Represents a login response with JWT token.
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Body of item create and update requests.
#[derive(Deserialize)]
pub struct ItemRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize)]
pub struct ItemsResponse {
    pub items: Vec<Item>,
}

#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserResponse>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}
