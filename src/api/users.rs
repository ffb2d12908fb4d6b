//! User endpoints

use axum::{
    Router,
    extract::State,
    http::HeaderMap,
    routing::{get, patch, post},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use super::extract::{ApiJson, ApiMultipart, ApiPath};
use super::response::ApiResponse;
use super::upload::MultipartForm;
use crate::AppState;
use crate::auth::{ACCESS_TOKEN_COOKIE, CurrentUser, REFRESH_TOKEN_COOKIE, TokenPair};
use crate::data::{ChannelProfile, PublicUser, VideoWithOwner};
use crate::error::AppError;
use crate::service::{RegisterUser, UserService};
use crate::storage::MediaKind;

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Refresh request (cookie takes precedence)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// Login/refresh response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

fn user_service(state: &AppState) -> UserService {
    UserService::new(
        state.db.clone(),
        state.storage.clone(),
        state.config.auth.clone(),
    )
}

fn token_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn clear_token_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).path("/").http_only(true).build();
    cookie.make_removal();
    cookie
}

fn with_token_cookies(jar: CookieJar, tokens: &TokenPair, secure: bool) -> CookieJar {
    jar.add(token_cookie(
        ACCESS_TOKEN_COOKIE,
        tokens.access_token.clone(),
        secure,
    ))
    .add(token_cookie(
        REFRESH_TOKEN_COOKIE,
        tokens.refresh_token.clone(),
        secure,
    ))
}

/// POST /api/v1/users/register
pub async fn register(
    State(state): State<AppState>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let mut form = MultipartForm::read(
        multipart,
        &[
            ("avatar", MediaKind::Avatar),
            ("coverImage", MediaKind::CoverImage),
        ],
    )
    .await?;

    let registration = RegisterUser {
        full_name: form.text("fullName"),
        username: form.text("username"),
        email: form.text("email"),
        password: form.text("password"),
        avatar: form.take_file("avatar"),
        cover_image: form.take_file("coverImage"),
    };

    let user = user_service(&state).register(registration).await?;

    Ok(ApiResponse::created(
        PublicUser::from(&user),
        "User registered successfully",
    ))
}

/// POST /api/v1/users/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<SessionResponse>), AppError> {
    let (user, tokens) = user_service(&state)
        .login(
            req.username.as_deref(),
            req.email.as_deref(),
            req.password.as_deref(),
        )
        .await?;

    let jar = with_token_cookies(jar, &tokens, state.config.should_use_secure_cookies());
    let body = SessionResponse {
        user: PublicUser::from(&user),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    };

    Ok((jar, ApiResponse::ok(body, "User logged in successfully")))
}

/// POST /api/v1/users/logout
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<()>), AppError> {
    user_service(&state).logout(&user).await?;

    let jar = jar
        .add(clear_token_cookie(ACCESS_TOKEN_COOKIE))
        .add(clear_token_cookie(REFRESH_TOKEN_COOKIE));

    Ok((jar, ApiResponse::ok((), "User logged out")))
}

/// POST /api/v1/users/refresh-token
///
/// The body is optional, so it is parsed leniently from raw bytes.
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<(CookieJar, ApiResponse<SessionResponse>), AppError> {
    let from_cookie = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty());

    let presented = match from_cookie {
        Some(token) => Some(token),
        None => {
            let is_json = headers
                .get(axum::http::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.starts_with("application/json"));
            if is_json && !body.is_empty() {
                serde_json::from_slice::<RefreshRequest>(&body)
                    .map_err(|e| AppError::bad_request(format!("Invalid JSON body: {e}")))?
                    .refresh_token
            } else {
                None
            }
        }
    };

    let (user, tokens) = user_service(&state).refresh(presented.as_deref()).await?;

    let jar = with_token_cookies(jar, &tokens, state.config.should_use_secure_cookies());
    let body = SessionResponse {
        user: PublicUser::from(&user),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    };

    Ok((jar, ApiResponse::ok(body, "Access token refreshed")))
}

/// PATCH /api/v1/users/change-password
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<ApiResponse<()>, AppError> {
    user_service(&state)
        .change_password(
            &user,
            req.old_password.as_deref(),
            req.new_password.as_deref(),
        )
        .await?;

    Ok(ApiResponse::ok((), "Password changed successfully"))
}

/// GET /api/v1/users/get-user
pub async fn get_current_user(
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<PublicUser>, AppError> {
    Ok(ApiResponse::ok(
        PublicUser::from(&user),
        "Current user fetched successfully",
    ))
}

/// PATCH /api/v1/users/update-user
pub async fn update_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<UpdateAccountRequest>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let updated = user_service(&state)
        .update_details(&user, req.full_name.as_deref(), req.email.as_deref())
        .await?;

    Ok(ApiResponse::ok(
        PublicUser::from(&updated),
        "Account details updated successfully",
    ))
}

/// PATCH /api/v1/users/update-avatar
pub async fn update_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let mut form = MultipartForm::read(multipart, &[("avatar", MediaKind::Avatar)]).await?;
    let updated = user_service(&state)
        .update_avatar(&user, form.take_file("avatar"))
        .await?;

    Ok(ApiResponse::ok(
        PublicUser::from(&updated),
        "Avatar updated successfully",
    ))
}

/// PATCH /api/v1/users/update-coverImage
pub async fn update_cover_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let mut form =
        MultipartForm::read(multipart, &[("coverImage", MediaKind::CoverImage)]).await?;
    let updated = user_service(&state)
        .update_cover_image(&user, form.take_file("coverImage"))
        .await?;

    Ok(ApiResponse::ok(
        PublicUser::from(&updated),
        "Cover image updated successfully",
    ))
}

/// GET /api/v1/users/c/:username
pub async fn get_channel_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(username): ApiPath<String>,
) -> Result<ApiResponse<ChannelProfile>, AppError> {
    let channel = user_service(&state)
        .channel_profile(&username, &user)
        .await?;

    Ok(ApiResponse::ok(channel, "User channel fetched successfully"))
}

/// GET /api/v1/users/get-user-watch-history
pub async fn get_watch_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<Vec<VideoWithOwner>>, AppError> {
    let history = user_service(&state).watch_history(&user).await?;

    Ok(ApiResponse::ok(history, "Watch history fetched successfully"))
}

/// Routes under /api/v1/users
pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route("/change-password", patch(change_password))
        .route("/get-user", get(get_current_user))
        .route("/update-user", patch(update_account))
        .route("/update-avatar", patch(update_avatar))
        .route("/update-coverImage", patch(update_cover_image))
        .route("/c/:username", get(get_channel_profile))
        .route("/get-user-watch-history", get(get_watch_history))
}
