//! Authentication extractor
//!
//! Resolves the calling user from an access token.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use axum_extra::extract::CookieJar;

use super::token::{TokenKind, verify_token};
use crate::AppState;
use crate::data::User;
use crate::error::AppError;

/// Cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.trim().to_owned())
        .filter(|token| !token.is_empty())
        .or_else(|| {
            let jar = CookieJar::from_headers(headers);
            jar.get(ACCESS_TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_owned())
        })
}

async fn authenticate_token(token: &str, state: &AppState) -> Result<User, AppError> {
    let claims = verify_token(token, TokenKind::Access, &state.config.auth.token_secret)?;

    state
        .db
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid access token"))
}

/// Extractor for current authenticated user
///
/// Use in handlers to get the user the access token belongs to.
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>().cloned() {
            return Ok(CurrentUser(user));
        }

        let state = AppState::from_ref(state);
        let token = extract_token_from_headers(&parts.headers)
            .ok_or_else(|| AppError::unauthorized("Unauthorized request"))?;
        let user = authenticate_token(&token, &state).await?;
        parts.extensions.insert(user.clone());

        Ok(CurrentUser(user))
    }
}
