//! Playlist service

use std::sync::Arc;

use chrono::Utc;

use super::{ensure_owner, non_blank};
use crate::data::{Database, EntityId, Playlist, PlaylistDetails, User};
use crate::error::AppError;

/// Playlist service
pub struct PlaylistService {
    db: Arc<Database>,
}

impl PlaylistService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create an empty playlist owned by `actor`
    pub async fn create(
        &self,
        actor: &User,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Playlist, AppError> {
        let (Some(name), Some(description)) = (non_blank(name), non_blank(description)) else {
            return Err(AppError::bad_request("Name and description are required"));
        };

        let now = Utc::now();
        let playlist = Playlist {
            id: EntityId::new().0,
            name,
            description,
            owner_id: actor.id.clone(),
            created_at: now,
            updated_at: now,
        };
        self.db.insert_playlist(&playlist).await?;

        Ok(playlist)
    }

    /// Playlist with the videos `viewer` may see
    pub async fn get(&self, playlist_id: &str, viewer: &User) -> Result<PlaylistDetails, AppError> {
        self.db
            .get_playlist_details(playlist_id, &viewer.id)
            .await?
            .ok_or_else(|| AppError::not_found("Playlist not found"))
    }

    /// All playlists of a user (possibly none)
    pub async fn user_playlists(
        &self,
        user_id: &str,
        viewer: &User,
    ) -> Result<Vec<PlaylistDetails>, AppError> {
        if self.db.get_user(user_id).await?.is_none() {
            return Err(AppError::not_found("User not found"));
        }
        self.db.get_user_playlists(user_id, &viewer.id).await
    }

    async fn load_owned(&self, playlist_id: &str, actor: &User) -> Result<Playlist, AppError> {
        let playlist = self
            .db
            .get_playlist(playlist_id)
            .await?
            .ok_or_else(|| AppError::not_found("Playlist not found"))?;
        ensure_owner(
            &playlist.owner_id,
            &actor.id,
            "You are not allowed to modify this playlist",
        )?;
        Ok(playlist)
    }

    pub async fn update(
        &self,
        actor: &User,
        playlist_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Playlist, AppError> {
        let playlist = self.load_owned(playlist_id, actor).await?;
        let (Some(name), Some(description)) = (non_blank(name), non_blank(description)) else {
            return Err(AppError::bad_request("Name and description are required"));
        };

        self.db
            .update_playlist(&playlist.id, &name, &description, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found("Playlist not found"))
    }

    pub async fn delete(&self, actor: &User, playlist_id: &str) -> Result<(), AppError> {
        let playlist = self.load_owned(playlist_id, actor).await?;
        if !self.db.delete_playlist(&playlist.id).await? {
            return Err(AppError::not_found("Playlist not found"));
        }
        Ok(())
    }

    /// Append a video
    ///
    /// # Errors
    /// `Conflict` if the video is already in the playlist
    pub async fn add_video(
        &self,
        actor: &User,
        video_id: &str,
        playlist_id: &str,
    ) -> Result<PlaylistDetails, AppError> {
        let playlist = self.load_owned(playlist_id, actor).await?;

        let visible = self
            .db
            .get_video(video_id)
            .await?
            .is_some_and(|video| video.is_published || video.owner_id == actor.id);
        if !visible {
            return Err(AppError::not_found("Video not found"));
        }

        if !self.db.add_video_to_playlist(&playlist.id, video_id).await? {
            return Err(AppError::conflict("Video already in playlist"));
        }

        self.get(&playlist.id, actor).await
    }

    /// Remove a video
    ///
    /// # Errors
    /// `NotFound` if the video is not in the playlist
    pub async fn remove_video(
        &self,
        actor: &User,
        video_id: &str,
        playlist_id: &str,
    ) -> Result<PlaylistDetails, AppError> {
        let playlist = self.load_owned(playlist_id, actor).await?;

        if !self
            .db
            .remove_video_from_playlist(&playlist.id, video_id)
            .await?
        {
            return Err(AppError::not_found("Video not found in playlist"));
        }

        self.get(&playlist.id, actor).await
    }
}
