//! Tweet endpoints

use axum::{
    Router,
    extract::State,
    routing::{get, patch, post},
};
use serde::Deserialize;

use super::PageParams;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::response::ApiResponse;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{Page, Tweet, TweetWithOwner};
use crate::error::AppError;
use crate::service::ContentService;

#[derive(Debug, Deserialize)]
pub struct TweetRequest {
    pub content: Option<String>,
}

/// POST /api/v1/tweets
pub async fn create_tweet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<TweetRequest>,
) -> Result<ApiResponse<Tweet>, AppError> {
    let tweet = ContentService::new(state.db.clone())
        .create_tweet(&user, req.content.as_deref())
        .await?;

    Ok(ApiResponse::created(tweet, "Tweet created successfully"))
}

/// GET /api/v1/tweets/user/:userId
pub async fn get_user_tweets(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(user_id): ApiPath<String>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<ApiResponse<Page<TweetWithOwner>>, AppError> {
    let page = params.into_page_request()?;
    let tweets = ContentService::new(state.db.clone())
        .list_user_tweets(&user_id, page)
        .await?;

    Ok(ApiResponse::ok(tweets, "Tweets fetched successfully"))
}

/// PATCH /api/v1/tweets/:tweetId
pub async fn update_tweet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(tweet_id): ApiPath<String>,
    ApiJson(req): ApiJson<TweetRequest>,
) -> Result<ApiResponse<Tweet>, AppError> {
    let tweet = ContentService::new(state.db.clone())
        .update_tweet(&user, &tweet_id, req.content.as_deref())
        .await?;

    Ok(ApiResponse::ok(tweet, "Tweet updated successfully"))
}

/// DELETE /api/v1/tweets/:tweetId
pub async fn delete_tweet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(tweet_id): ApiPath<String>,
) -> Result<ApiResponse<()>, AppError> {
    ContentService::new(state.db.clone())
        .delete_tweet(&user, &tweet_id)
        .await?;

    Ok(ApiResponse::ok((), "Tweet deleted successfully"))
}

/// Routes under /api/v1/tweets
pub fn tweets_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_tweet))
        .route("/user/:userId", get(get_user_tweets))
        .route("/:tweetId", patch(update_tweet).delete(delete_tweet))
}
