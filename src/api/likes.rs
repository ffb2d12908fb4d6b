//! Like endpoints

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use super::extract::ApiPath;
use super::response::ApiResponse;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{Like, LikeTarget, Toggle, VideoWithOwner};
use crate::error::AppError;
use crate::service::RelationService;

async fn toggle(
    state: &AppState,
    user: &crate::data::User,
    target: LikeTarget,
    target_id: &str,
) -> Result<ApiResponse<Option<Like>>, AppError> {
    let toggle = RelationService::new(state.db.clone())
        .toggle_like(user, target, target_id)
        .await?;

    Ok(match toggle {
        Toggle::Added(like) => ApiResponse::new(
            StatusCode::CREATED,
            Some(like),
            format!("You liked this {}", target.as_str()),
        ),
        Toggle::Removed => ApiResponse::ok(
            None,
            format!("Like removed from this {}", target.as_str()),
        ),
    })
}

/// POST /api/v1/likes/toggle/v/:videoId
pub async fn toggle_video_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(video_id): ApiPath<String>,
) -> Result<ApiResponse<Option<Like>>, AppError> {
    toggle(&state, &user, LikeTarget::Video, &video_id).await
}

/// POST /api/v1/likes/toggle/c/:commentId
pub async fn toggle_comment_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(comment_id): ApiPath<String>,
) -> Result<ApiResponse<Option<Like>>, AppError> {
    toggle(&state, &user, LikeTarget::Comment, &comment_id).await
}

/// POST /api/v1/likes/toggle/t/:tweetId
pub async fn toggle_tweet_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(tweet_id): ApiPath<String>,
) -> Result<ApiResponse<Option<Like>>, AppError> {
    toggle(&state, &user, LikeTarget::Tweet, &tweet_id).await
}

/// GET /api/v1/likes/videos
pub async fn get_liked_videos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<Vec<VideoWithOwner>>, AppError> {
    let videos = RelationService::new(state.db.clone())
        .liked_videos(&user)
        .await?;

    Ok(ApiResponse::ok(videos, "Liked videos fetched successfully"))
}

/// Routes under /api/v1/likes
pub fn likes_router() -> Router<AppState> {
    Router::new()
        .route("/toggle/v/:videoId", post(toggle_video_like))
        .route("/toggle/c/:commentId", post(toggle_comment_like))
        .route("/toggle/t/:tweetId", post(toggle_tweet_like))
        .route("/videos", get(get_liked_videos))
}
