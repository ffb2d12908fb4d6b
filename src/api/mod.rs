//! API layer
//!
//! HTTP handlers for:
//! - The VidTube REST API (`/api/v1`)
//! - Metrics (Prometheus)

mod comments;
mod dashboard;
mod extract;
mod likes;
pub mod metrics;
mod playlists;
mod response;
mod subscriptions;
mod tweets;
mod upload;
mod users;
mod videos;

use axum::{Router, routing::get};
use serde::Deserialize;

pub use metrics::metrics_router;
pub use response::ApiResponse;

use crate::AppState;
use crate::data::PageRequest;
use crate::error::AppError;

/// `page` / `limit` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn into_page_request(self) -> Result<PageRequest, AppError> {
        PageRequest::new(self.page, self.limit)
    }
}

/// GET /api/v1/healthcheck
async fn healthcheck() -> ApiResponse<serde_json::Value> {
    ApiResponse::ok(serde_json::json!({ "status": "OK" }), "Health check passed")
}

/// Create the `/api/v1` router
pub fn v1_router() -> Router<AppState> {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .nest("/users", users::users_router())
        .nest("/videos", videos::videos_router())
        .nest("/comments", comments::comments_router())
        .nest("/tweets", tweets::tweets_router())
        .nest("/likes", likes::likes_router())
        .nest("/subscriptions", subscriptions::subscriptions_router())
        .nest("/playlist", playlists::playlists_router())
        .nest("/dashboard", dashboard::dashboard_router())
}
