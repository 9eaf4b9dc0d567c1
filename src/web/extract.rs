//! Request extractor that runs the authorization gate and hands the handler an `Identity`.

use crate::auth::Identity;
use crate::web::api::AppState;
use crate::web::error::ApiError;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// The authenticated caller. Handlers that take this parameter reject anonymous requests.
pub struct CurrentUser(pub Identity);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
        let identity = state.gate.authenticate_request(header)?;
        Ok(CurrentUser(identity))
    }
}
