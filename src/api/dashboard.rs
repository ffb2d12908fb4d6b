//! Channel dashboard

use axum::{Router, extract::State, routing::get};

use super::response::ApiResponse;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{ChannelStats, Video};
use crate::error::AppError;

/// GET /api/v1/dashboard/stats
pub async fn get_channel_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<ChannelStats>, AppError> {
    let stats = state.db.get_channel_stats(&user.id).await?;

    Ok(ApiResponse::ok(stats, "Channel stats fetched successfully"))
}

/// GET /api/v1/dashboard/videos
///
/// All of the caller's videos, unpublished included.
pub async fn get_channel_videos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<Vec<Video>>, AppError> {
    let videos = state.db.get_channel_videos(&user.id).await?;

    Ok(ApiResponse::ok(videos, "Channel videos fetched successfully"))
}

/// Routes under /api/v1/dashboard
pub fn dashboard_router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_channel_stats))
        .route("/videos", get(get_channel_videos))
}
