//! User service
//!
//! Registration, login and token rotation, profile updates.

use std::sync::Arc;

use chrono::Utc;

use super::{non_blank, not_blank};
use crate::auth::{TokenKind, TokenPair, hash_password, hash_token, verify_password, verify_token};
use crate::config::AuthConfig;
use crate::data::{ChannelProfile, Database, EntityId, User, VideoWithOwner};
use crate::error::AppError;
use crate::metrics::USERS_REGISTERED_TOTAL;
use crate::storage::{MediaKind, MediaStorage, UploadedFile};

/// Registration form
#[derive(Debug, Default)]
pub struct RegisterUser {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<UploadedFile>,
    pub cover_image: Option<UploadedFile>,
}

async fn hash_password_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
}

async fn verify_password_blocking(password: String, stored_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(e.into()))
}

/// User service
pub struct UserService {
    db: Arc<Database>,
    storage: Arc<MediaStorage>,
    auth: AuthConfig,
}

impl UserService {
    /// Create new user service
    pub fn new(db: Arc<Database>, storage: Arc<MediaStorage>, auth: AuthConfig) -> Self {
        Self { db, storage, auth }
    }

    /// Register a new user
    ///
    /// Uploads avatar (and cover image, if any) before inserting the row.
    /// If the insert fails the uploads are removed again.
    ///
    /// # Errors
    /// - `BadRequest` if a field is blank or the avatar is missing
    /// - `Conflict` if the username or email is taken
    pub async fn register(&self, form: RegisterUser) -> Result<User, AppError> {
        let (Some(full_name), Some(username), Some(email), Some(password)) = (
            non_blank(form.full_name.as_deref()),
            non_blank(form.username.as_deref()),
            non_blank(form.email.as_deref()),
            not_blank(form.password.as_deref()),
        ) else {
            return Err(AppError::bad_request("All fields are required"));
        };

        let username = username.to_lowercase();
        let email = email.to_lowercase();
        validate_username(&username)?;
        validate_email(&email)?;

        if self.db.user_exists(&username, &email).await? {
            return Err(AppError::conflict(
                "User with email or username already exists",
            ));
        }

        let avatar_file = form
            .avatar
            .ok_or_else(|| AppError::bad_request("Avatar is required"))?;

        // Hash before any upload
        let password_hash = hash_password_blocking(password).await?;

        let avatar = self.storage.store_file(MediaKind::Avatar, avatar_file).await?;
        let cover_image = match form.cover_image {
            Some(file) => match self.storage.store_file(MediaKind::CoverImage, file).await {
                Ok(stored) => Some(stored),
                Err(e) => {
                    self.storage.remove_by_url(&avatar.url).await;
                    return Err(e);
                }
            },
            None => None,
        };

        let now = Utc::now();
        let user = User {
            id: EntityId::new().0,
            username,
            email,
            full_name,
            avatar: avatar.url.clone(),
            cover_image: cover_image
                .as_ref()
                .map(|c| c.url.clone())
                .unwrap_or_default(),
            password_hash,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.db.insert_user(&user).await {
            self.storage.remove_by_url(&avatar.url).await;
            if let Some(cover) = &cover_image {
                self.storage.remove_by_url(&cover.url).await;
            }
            return Err(e);
        }

        USERS_REGISTERED_TOTAL.inc();
        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(user)
    }

    /// Log in with username or email
    ///
    /// # Errors
    /// - `BadRequest` if neither identifier is given
    /// - `NotFound` for an unknown user
    /// - `Unauthorized` for a wrong password
    pub async fn login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<(User, TokenPair), AppError> {
        let username = non_blank(username).map(|u| u.to_lowercase());
        let email = non_blank(email).map(|e| e.to_lowercase());
        if username.is_none() && email.is_none() {
            return Err(AppError::bad_request("username or email is required"));
        }
        let password =
            not_blank(password).ok_or_else(|| AppError::bad_request("Password is required"))?;

        let user = self
            .db
            .find_user_by_login(username.as_deref(), email.as_deref())
            .await?
            .ok_or_else(|| AppError::not_found("User does not exist"))?;

        if !verify_password_blocking(password, user.password_hash.clone()).await? {
            return Err(AppError::unauthorized("Invalid user credentials"));
        }

        let tokens = TokenPair::issue(&user.id, &self.auth)?;
        self.db
            .set_refresh_token_hash(&user.id, Some(&hash_token(&tokens.refresh_token)))
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok((user, tokens))
    }

    /// Forget the stored refresh token
    pub async fn logout(&self, user: &User) -> Result<(), AppError> {
        self.db.set_refresh_token_hash(&user.id, None).await?;
        tracing::debug!(user_id = %user.id, "User logged out");
        Ok(())
    }

    /// Exchange a refresh token for a new token pair
    ///
    /// The presented token must be the one most recently issued; it is
    /// invalid afterwards.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<(User, TokenPair), AppError> {
        let refresh_token = non_blank(refresh_token)
            .ok_or_else(|| AppError::unauthorized("Unauthorized request"))?;

        let claims = verify_token(&refresh_token, TokenKind::Refresh, &self.auth.token_secret)
            .map_err(|_| AppError::unauthorized("Invalid refresh token"))?;

        let user = self
            .db
            .get_user(&claims.sub)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;

        let presented_hash = hash_token(&refresh_token);
        if user.refresh_token_hash.as_deref() != Some(presented_hash.as_str()) {
            return Err(AppError::unauthorized("Refresh token is expired or used"));
        }

        let tokens = TokenPair::issue(&user.id, &self.auth)?;
        let rotated = self
            .db
            .rotate_refresh_token_hash(&user.id, &presented_hash, &hash_token(&tokens.refresh_token))
            .await?;
        if !rotated {
            return Err(AppError::unauthorized("Refresh token is expired or used"));
        }

        Ok((user, tokens))
    }

    /// Change password after checking the old one
    pub async fn change_password(
        &self,
        user: &User,
        old_password: Option<&str>,
        new_password: Option<&str>,
    ) -> Result<(), AppError> {
        let (Some(old_password), Some(new_password)) = (not_blank(old_password), not_blank(new_password))
        else {
            return Err(AppError::bad_request(
                "Old password and new password are required",
            ));
        };

        if !verify_password_blocking(old_password, user.password_hash.clone()).await? {
            return Err(AppError::bad_request("Invalid old password"));
        }

        let password_hash = hash_password_blocking(new_password).await?;
        self.db
            .update_user_password(&user.id, &password_hash, Utc::now())
            .await?;

        Ok(())
    }

    /// Update full name and email
    pub async fn update_details(
        &self,
        user: &User,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, AppError> {
        let (Some(full_name), Some(email)) = (non_blank(full_name), non_blank(email)) else {
            return Err(AppError::bad_request("All fields are required"));
        };
        let email = email.to_lowercase();
        validate_email(&email)?;

        self.db
            .update_user_details(&user.id, &full_name, &email, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Replace the avatar, removing the old file
    pub async fn update_avatar(
        &self,
        user: &User,
        file: Option<UploadedFile>,
    ) -> Result<User, AppError> {
        let file = file.ok_or_else(|| AppError::bad_request("Avatar file is missing"))?;
        let stored = self.storage.store_file(MediaKind::Avatar, file).await?;

        let updated = self
            .db
            .update_user_avatar(&user.id, &stored.url, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        self.storage.remove_by_url(&user.avatar).await;
        Ok(updated)
    }

    /// Replace the cover image, removing the old file
    pub async fn update_cover_image(
        &self,
        user: &User,
        file: Option<UploadedFile>,
    ) -> Result<User, AppError> {
        let file = file.ok_or_else(|| AppError::bad_request("Cover image file is missing"))?;
        let stored = self.storage.store_file(MediaKind::CoverImage, file).await?;

        let updated = self
            .db
            .update_user_cover_image(&user.id, &stored.url, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if !user.cover_image.is_empty() {
            self.storage.remove_by_url(&user.cover_image).await;
        }
        Ok(updated)
    }

    /// Channel page by username
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer: &User,
    ) -> Result<ChannelProfile, AppError> {
        let username = non_blank(Some(username))
            .ok_or_else(|| AppError::bad_request("username is missing"))?
            .to_lowercase();

        self.db
            .get_channel_profile(&username, &viewer.id)
            .await?
            .ok_or_else(|| AppError::not_found("Channel does not exist"))
    }

    /// Videos the user has watched, most recent first
    pub async fn watch_history(&self, user: &User) -> Result<Vec<VideoWithOwner>, AppError> {
        self.db.get_watch_history(&user.id).await
    }
}

fn validate_username(username: &str) -> Result<(), AppError> {
    let valid = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-');
    if !valid {
        return Err(AppError::bad_request(
            "Username may only contain letters, digits, '_', '.' and '-'",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AppError::bad_request("Invalid email address")),
    }
}
