//! Maps store, token and gate failures onto HTTP responses.

use crate::auth::{AuthError, TokenError};
use crate::store::StoreError;
use axum::extract::rejection::JsonRejection;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("too many login attempts")]
    TooManyRequests,
    #[error("{0}")]
    Internal(String),
}

/// Helper to create a JSON error response with a message and status code
pub fn json_error(message: &str, status: StatusCode) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_error(&self.to_string(), self.status())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidInput(message) => ApiError::BadRequest(message.to_string()),
            StoreError::InvalidRole => ApiError::BadRequest("invalid role".to_string()),
            StoreError::UserExists => ApiError::Conflict("username already taken".to_string()),
            StoreError::InvalidCredentials => ApiError::Unauthorized("invalid username or password".to_string()),
            StoreError::UserNotFound => ApiError::NotFound("user not found".to_string()),
            StoreError::ItemNotFound => ApiError::NotFound("item not found".to_string()),
            StoreError::Forbidden => {
                ApiError::Forbidden("you do not have permission to update this item".to_string())
            }
            StoreError::HashingFailure(reason) => {
                tracing::error!("Password hashing failed: {}", reason);
                ApiError::Internal("internal error".to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Unauthenticated => ApiError::Unauthorized("invalid or missing token".to_string()),
            AuthError::Forbidden => ApiError::Forbidden("insufficient permissions".to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Signing(inner) => {
                tracing::error!("Failed to sign token: {}", inner);
                ApiError::Internal("failed to issue token".to_string())
            }
            TokenError::Invalid(_) | TokenError::Expired => {
                ApiError::Unauthorized("invalid or missing token".to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        ApiError::BadRequest("invalid request payload".to_string())
    }
}
