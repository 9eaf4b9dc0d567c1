//! Turns a presented bearer credential into an `Identity` and checks roles against it.

use crate::auth::token::TokenService;
use itemvault_shared::Role;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("insufficient permissions")]
    Forbidden,
}

/// The authenticated caller for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[derive(Debug, Clone)]
pub struct AuthGate {
    tokens: Arc<TokenService>,
}

/// Split `Bearer <token>` into the token. The scheme is matched case-insensitively.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Resolve the raw `Authorization` header value. Missing, malformed and unverifiable
    /// credentials all come back as `Unauthenticated`.
    pub fn authenticate_request(&self, authorization: Option<&str>) -> Result<Identity, AuthError> {
        let header = authorization.ok_or(AuthError::Unauthenticated)?;
        let token = bearer_token(header).ok_or_else(|| {
            tracing::debug!("Rejected malformed authorization header");
            AuthError::Unauthenticated
        })?;
        let claims = self.tokens.verify(token).map_err(|e| {
            tracing::warn!("Rejected bearer token: {}", e);
            AuthError::Unauthenticated
        })?;
        Ok(Identity {
            id: claims.user_id,
            username: claims.username,
            role: claims.role,
        })
    }

    /// Succeeds when `identity` is present and holds one of `allowed`.
    pub fn require_role(&self, identity: Option<&Identity>, allowed: &[Role]) -> Result<(), AuthError> {
        let identity = identity.ok_or(AuthError::Unauthenticated)?;
        if allowed.contains(&identity.role) {
            Ok(())
        } else {
            tracing::warn!(username = %identity.username, role = %identity.role, "Role check failed");
            Err(AuthError::Forbidden)
        }
    }
}
