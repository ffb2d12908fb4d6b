//! Video endpoints

use axum::{
    Router,
    extract::State,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;

use super::extract::{ApiMultipart, ApiPath, ApiQuery};
use super::response::ApiResponse;
use super::upload::MultipartForm;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{
    Page, PageRequest, SortDirection, Video, VideoDetails, VideoQuery, VideoSortField,
    VideoWithOwner,
};
use crate::error::AppError;
use crate::service::{PublishVideo, UpdateVideo, VideoService};
use crate::storage::MediaKind;

/// Query parameters for GET /videos
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub user_id: Option<String>,
}

impl VideoListParams {
    fn into_query(self) -> Result<(VideoQuery, PageRequest), AppError> {
        let page = PageRequest::new(self.page, self.limit)?;
        let sort_by = match self.sort_by.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => VideoSortField::parse(raw)?,
            None => VideoSortField::default(),
        };
        let sort_direction = match self.sort_type.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => SortDirection::parse(raw)?,
            None => SortDirection::default(),
        };
        let owner_id = self
            .user_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        Ok((
            VideoQuery {
                owner_id,
                sort_by,
                sort_direction,
            },
            page,
        ))
    }
}

fn video_service(state: &AppState) -> VideoService {
    VideoService::new(state.db.clone(), state.storage.clone())
}

/// GET /api/v1/videos
pub async fn list_videos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(params): ApiQuery<VideoListParams>,
) -> Result<ApiResponse<Page<VideoWithOwner>>, AppError> {
    let (query, page) = params.into_query()?;
    let videos = video_service(&state).list(&user, &query, page).await?;

    Ok(ApiResponse::ok(videos, "Videos fetched successfully"))
}

/// POST /api/v1/videos/publish-video
pub async fn publish_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<ApiResponse<Video>, AppError> {
    let mut form = MultipartForm::read(
        multipart,
        &[
            ("videoFile", MediaKind::Video),
            ("thumbnail", MediaKind::Thumbnail),
        ],
    )
    .await?;

    let video = video_service(&state)
        .publish(
            &user,
            PublishVideo {
                title: form.text("title"),
                description: form.text("description"),
                video_file: form.take_file("videoFile"),
                thumbnail: form.take_file("thumbnail"),
            },
        )
        .await?;

    Ok(ApiResponse::created(video, "Video published successfully"))
}

/// GET /api/v1/videos/:videoId
pub async fn get_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(video_id): ApiPath<String>,
) -> Result<ApiResponse<VideoDetails>, AppError> {
    let video = video_service(&state).watch(&video_id, &user).await?;

    Ok(ApiResponse::ok(video, "Video fetched successfully"))
}

/// PATCH /api/v1/videos/update-video
pub async fn update_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<ApiResponse<Video>, AppError> {
    let mut form =
        MultipartForm::read(multipart, &[("thumbnail", MediaKind::Thumbnail)]).await?;

    let video = video_service(&state)
        .update(
            &user,
            UpdateVideo {
                video_id: form.text("videoId"),
                title: form.text("title"),
                description: form.text("description"),
                thumbnail: form.take_file("thumbnail"),
            },
        )
        .await?;

    Ok(ApiResponse::ok(video, "Video updated successfully"))
}

/// DELETE /api/v1/videos/delete-video/:videoId
pub async fn delete_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(video_id): ApiPath<String>,
) -> Result<ApiResponse<()>, AppError> {
    video_service(&state).delete(&user, &video_id).await?;

    Ok(ApiResponse::ok((), "Video deleted successfully"))
}

/// PATCH /api/v1/videos/toggle-publish/:videoId
pub async fn toggle_publish(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(video_id): ApiPath<String>,
) -> Result<ApiResponse<Video>, AppError> {
    let video = video_service(&state).toggle_publish(&user, &video_id).await?;
    let message = if video.is_published {
        "Video is now published"
    } else {
        "Video is now unpublished"
    };

    Ok(ApiResponse::ok(video, message))
}

/// Routes under /api/v1/videos
pub fn videos_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_videos))
        .route("/publish-video", post(publish_video))
        .route("/update-video", patch(update_video))
        .route("/delete-video/:videoId", delete(delete_video))
        .route("/toggle-publish/:videoId", patch(toggle_publish))
        .route("/:videoId", get(get_video))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_defaults() {
        let (query, page) = VideoListParams::default().into_query().unwrap();
        assert_eq!(query.sort_by, VideoSortField::CreatedAt);
        assert_eq!(query.sort_direction, SortDirection::Desc);
        assert!(query.owner_id.is_none());
        assert_eq!(page, PageRequest::default());
    }

    #[test]
    fn list_params_reject_unknown_sort() {
        let params = VideoListParams {
            sort_by: Some("passwordHash".to_string()),
            ..Default::default()
        };
        assert!(matches!(params.into_query(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn list_params_parse_sort_and_owner() {
        let params = VideoListParams {
            page: Some(2),
            limit: Some(5),
            sort_by: Some("views".to_string()),
            sort_type: Some("1".to_string()),
            user_id: Some(" abc ".to_string()),
        };
        let (query, page) = params.into_query().unwrap();
        assert_eq!(query.sort_by, VideoSortField::Views);
        assert_eq!(query.sort_direction, SortDirection::Asc);
        assert_eq!(query.owner_id.as_deref(), Some("abc"));
        assert_eq!(page.offset(), 5);
    }
}
