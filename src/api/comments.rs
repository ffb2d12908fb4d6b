//! Comment endpoints

use axum::{
    Router,
    extract::State,
    routing::{get, patch},
};
use serde::Deserialize;

use super::PageParams;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::response::ApiResponse;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{Comment, CommentWithOwner, Page};
use crate::error::AppError;
use crate::service::ContentService;

/// Body of comment create/update
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: Option<String>,
}

/// GET /api/v1/comments/:videoId
pub async fn list_comments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(video_id): ApiPath<String>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<ApiResponse<Page<CommentWithOwner>>, AppError> {
    let page = params.into_page_request()?;
    let comments = ContentService::new(state.db.clone())
        .list_comments(&video_id, &user, page)
        .await?;

    Ok(ApiResponse::ok(comments, "Comments fetched successfully"))
}

/// POST /api/v1/comments/:videoId
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(video_id): ApiPath<String>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> Result<ApiResponse<Comment>, AppError> {
    let comment = ContentService::new(state.db.clone())
        .add_comment(&user, &video_id, req.content.as_deref())
        .await?;

    Ok(ApiResponse::created(comment, "Comment added successfully"))
}

/// PATCH /api/v1/comments/c/:commentId
pub async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(comment_id): ApiPath<String>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> Result<ApiResponse<Comment>, AppError> {
    let comment = ContentService::new(state.db.clone())
        .update_comment(&user, &comment_id, req.content.as_deref())
        .await?;

    Ok(ApiResponse::ok(comment, "Comment updated successfully"))
}

/// DELETE /api/v1/comments/c/:commentId
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(comment_id): ApiPath<String>,
) -> Result<ApiResponse<()>, AppError> {
    ContentService::new(state.db.clone())
        .delete_comment(&user, &comment_id)
        .await?;

    Ok(ApiResponse::ok((), "Comment deleted successfully"))
}

/// Routes under /api/v1/comments
pub fn comments_router() -> Router<AppState> {
    Router::new()
        .route("/:videoId", get(list_comments).post(add_comment))
        .route("/c/:commentId", patch(update_comment).delete(delete_comment))
}
