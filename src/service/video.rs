//! Video service
//!
//! Publishing, viewing and owner-only mutations of videos.

use std::sync::Arc;

use chrono::Utc;

use super::{ensure_owner, non_blank};
use crate::data::{
    Database, EntityId, LikeTarget, Page, PageRequest, User, Video, VideoDetails, VideoQuery,
    VideoWithOwner,
};
use crate::error::AppError;
use crate::metrics::{VIDEO_VIEWS_TOTAL, VIDEOS_PUBLISHED_TOTAL};
use crate::storage::{MediaKind, MediaStorage, UploadedFile};

/// Publish form
#[derive(Debug, Default)]
pub struct PublishVideo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_file: Option<UploadedFile>,
    pub thumbnail: Option<UploadedFile>,
}

/// Update form
#[derive(Debug, Default)]
pub struct UpdateVideo {
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<UploadedFile>,
}

fn visible_to(video: &Video, viewer: &User) -> bool {
    video.is_published || video.owner_id == viewer.id
}

/// Video service
pub struct VideoService {
    db: Arc<Database>,
    storage: Arc<MediaStorage>,
}

impl VideoService {
    /// Create new video service
    pub fn new(db: Arc<Database>, storage: Arc<MediaStorage>) -> Self {
        Self { db, storage }
    }

    /// Page of videos visible to `viewer`
    pub async fn list(
        &self,
        viewer: &User,
        query: &VideoQuery,
        page: PageRequest,
    ) -> Result<Page<VideoWithOwner>, AppError> {
        self.db.list_videos(query, &viewer.id, page).await
    }

    /// Upload a video with its thumbnail and create the record
    pub async fn publish(&self, owner: &User, form: PublishVideo) -> Result<Video, AppError> {
        let (Some(title), Some(description)) = (
            non_blank(form.title.as_deref()),
            non_blank(form.description.as_deref()),
        ) else {
            return Err(AppError::bad_request("All fields are required"));
        };
        let video_file = form
            .video_file
            .ok_or_else(|| AppError::bad_request("Video file is required"))?;
        let thumbnail_file = form
            .thumbnail
            .ok_or_else(|| AppError::bad_request("Thumbnail is required"))?;

        let (stored_video, duration) = self.storage.store_video_file(video_file).await?;
        let thumbnail = match self
            .storage
            .store_file(MediaKind::Thumbnail, thumbnail_file)
            .await
        {
            Ok(stored) => stored,
            Err(e) => {
                self.storage.remove_by_url(&stored_video.url).await;
                return Err(e);
            }
        };

        let now = Utc::now();
        let video = Video {
            id: EntityId::new().0,
            title,
            description,
            video_file: stored_video.url,
            thumbnail: thumbnail.url,
            duration,
            views: 0,
            is_published: true,
            owner_id: owner.id.clone(),
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.db.insert_video(&video).await {
            self.storage.remove_by_url(&video.video_file).await;
            self.storage.remove_by_url(&video.thumbnail).await;
            return Err(e);
        }

        VIDEOS_PUBLISHED_TOTAL.inc();
        tracing::info!(video_id = %video.id, owner_id = %owner.id, duration, "Video published");

        Ok(video)
    }

    /// Fetch a video for `viewer`, recording the view
    ///
    /// The first fetch by a viewer appends to their watch history and
    /// counts one view; later fetches count nothing.
    pub async fn watch(&self, video_id: &str, viewer: &User) -> Result<VideoDetails, AppError> {
        let video = self
            .db
            .get_video(video_id)
            .await?
            .filter(|video| visible_to(video, viewer))
            .ok_or_else(|| AppError::not_found("Video not found"))?;

        if self.db.record_video_view(&viewer.id, &video.id).await? {
            VIDEO_VIEWS_TOTAL.inc();
        }

        let video = self
            .db
            .get_video_with_owner(&video.id)
            .await?
            .ok_or_else(|| AppError::not_found("Video not found"))?;
        let likes_count = self.db.count_likes(LikeTarget::Video, &video.video.id).await?;
        let is_liked = self
            .db
            .is_liked(&viewer.id, LikeTarget::Video, &video.video.id)
            .await?;

        Ok(VideoDetails {
            video,
            likes_count,
            is_liked,
        })
    }

    async fn load_owned(&self, video_id: &str, actor: &User, action: &str) -> Result<Video, AppError> {
        let video = self
            .db
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::not_found("Video not found"))?;
        ensure_owner(
            &video.owner_id,
            &actor.id,
            &format!("You are not allowed to {action} this video"),
        )?;
        Ok(video)
    }

    /// Replace title, description and thumbnail
    pub async fn update(&self, actor: &User, form: UpdateVideo) -> Result<Video, AppError> {
        let video_id = non_blank(form.video_id.as_deref())
            .ok_or_else(|| AppError::bad_request("videoId is required"))?;
        let video = self.load_owned(&video_id, actor, "update").await?;

        let (Some(title), Some(description), Some(thumbnail_file)) = (
            non_blank(form.title.as_deref()),
            non_blank(form.description.as_deref()),
            form.thumbnail,
        ) else {
            return Err(AppError::bad_request("All fields are required"));
        };

        let thumbnail = self
            .storage
            .store_file(MediaKind::Thumbnail, thumbnail_file)
            .await?;

        let updated = match self
            .db
            .update_video_details(&video.id, &title, &description, &thumbnail.url, Utc::now())
            .await
        {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                self.storage.remove_by_url(&thumbnail.url).await;
                return Err(AppError::not_found("Video not found"));
            }
            Err(e) => {
                self.storage.remove_by_url(&thumbnail.url).await;
                return Err(e);
            }
        };

        self.storage.remove_by_url(&video.thumbnail).await;
        Ok(updated)
    }

    /// Delete a video and its media files
    pub async fn delete(&self, actor: &User, video_id: &str) -> Result<(), AppError> {
        let video = self.load_owned(video_id, actor, "delete").await?;

        if !self.db.delete_video(&video.id).await? {
            return Err(AppError::not_found("Video not found"));
        }

        self.storage.remove_by_url(&video.video_file).await;
        self.storage.remove_by_url(&video.thumbnail).await;
        tracing::info!(video_id = %video.id, "Video deleted");

        Ok(())
    }

    /// Flip the published flag
    pub async fn toggle_publish(&self, actor: &User, video_id: &str) -> Result<Video, AppError> {
        let mut video = self.load_owned(video_id, actor, "modify").await?;

        let now = Utc::now();
        video.is_published = self
            .db
            .toggle_video_published(&video.id, now)
            .await?
            .ok_or_else(|| AppError::not_found("Video not found"))?;
        video.updated_at = now;

        Ok(video)
    }
}
