//! Playlist endpoints

use axum::{
    Router,
    extract::State,
    routing::{get, patch, post},
};
use serde::Deserialize;

use super::extract::{ApiJson, ApiPath};
use super::response::ApiResponse;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{Playlist, PlaylistDetails};
use crate::error::AppError;
use crate::service::PlaylistService;

/// Body of playlist create/update
#[derive(Debug, Deserialize)]
pub struct PlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// POST /api/v1/playlist
pub async fn create_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<PlaylistRequest>,
) -> Result<ApiResponse<Playlist>, AppError> {
    let playlist = PlaylistService::new(state.db.clone())
        .create(&user, req.name.as_deref(), req.description.as_deref())
        .await?;

    Ok(ApiResponse::created(playlist, "Playlist created successfully"))
}

/// GET /api/v1/playlist/:playlistId
pub async fn get_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(playlist_id): ApiPath<String>,
) -> Result<ApiResponse<PlaylistDetails>, AppError> {
    let playlist = PlaylistService::new(state.db.clone())
        .get(&playlist_id, &user)
        .await?;

    Ok(ApiResponse::ok(playlist, "Playlist fetched successfully"))
}

/// GET /api/v1/playlist/user/:userId
pub async fn get_user_playlists(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(user_id): ApiPath<String>,
) -> Result<ApiResponse<Vec<PlaylistDetails>>, AppError> {
    let playlists = PlaylistService::new(state.db.clone())
        .user_playlists(&user_id, &user)
        .await?;

    Ok(ApiResponse::ok(playlists, "User playlists fetched successfully"))
}

/// PATCH /api/v1/playlist/:playlistId
pub async fn update_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(playlist_id): ApiPath<String>,
    ApiJson(req): ApiJson<PlaylistRequest>,
) -> Result<ApiResponse<Playlist>, AppError> {
    let playlist = PlaylistService::new(state.db.clone())
        .update(
            &user,
            &playlist_id,
            req.name.as_deref(),
            req.description.as_deref(),
        )
        .await?;

    Ok(ApiResponse::ok(playlist, "Playlist updated successfully"))
}

/// DELETE /api/v1/playlist/:playlistId
pub async fn delete_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(playlist_id): ApiPath<String>,
) -> Result<ApiResponse<()>, AppError> {
    PlaylistService::new(state.db.clone())
        .delete(&user, &playlist_id)
        .await?;

    Ok(ApiResponse::ok((), "Playlist deleted successfully"))
}

/// PATCH /api/v1/playlist/add/:videoId/:playlistId
pub async fn add_video_to_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath((video_id, playlist_id)): ApiPath<(String, String)>,
) -> Result<ApiResponse<PlaylistDetails>, AppError> {
    let playlist = PlaylistService::new(state.db.clone())
        .add_video(&user, &video_id, &playlist_id)
        .await?;

    Ok(ApiResponse::ok(playlist, "Video added to playlist"))
}

/// PATCH /api/v1/playlist/remove/:videoId/:playlistId
pub async fn remove_video_from_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath((video_id, playlist_id)): ApiPath<(String, String)>,
) -> Result<ApiResponse<PlaylistDetails>, AppError> {
    let playlist = PlaylistService::new(state.db.clone())
        .remove_video(&user, &video_id, &playlist_id)
        .await?;

    Ok(ApiResponse::ok(playlist, "Video removed from playlist"))
}

/// Routes under /api/v1/playlist
pub fn playlists_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_playlist))
        .route("/user/:userId", get(get_user_playlists))
        .route("/add/:videoId/:playlistId", patch(add_video_to_playlist))
        .route(
            "/remove/:videoId/:playlistId",
            patch(remove_video_from_playlist),
        )
        .route(
            "/:playlistId",
            get(get_playlist)
                .patch(update_playlist)
                .delete(delete_playlist),
        )
}
