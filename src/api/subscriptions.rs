//! Subscription endpoints

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde::Serialize;

use super::extract::ApiPath;
use super::response::ApiResponse;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{Subscription, SubscriptionEntry, Toggle};
use crate::error::AppError;
use crate::service::RelationService;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSubscribers {
    pub channel_id: String,
    pub subscriber_count: usize,
    pub subscribers: Vec<SubscriptionEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedChannels {
    pub subscriber_id: String,
    pub subscribed_to_count: usize,
    pub subscribed_to: Vec<SubscriptionEntry>,
}

/// POST /api/v1/subscriptions/c/:channelId
pub async fn toggle_subscription(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(channel_id): ApiPath<String>,
) -> Result<ApiResponse<Option<Subscription>>, AppError> {
    let toggle = RelationService::new(state.db.clone())
        .toggle_subscription(&user, &channel_id)
        .await?;

    Ok(match toggle {
        Toggle::Added(subscription) => ApiResponse::new(
            StatusCode::CREATED,
            Some(subscription),
            "Subscribed successfully",
        ),
        Toggle::Removed => ApiResponse::ok(None, "Unsubscribed successfully"),
    })
}

/// GET /api/v1/subscriptions/c/:channelId
pub async fn get_channel_subscribers(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(channel_id): ApiPath<String>,
) -> Result<ApiResponse<ChannelSubscribers>, AppError> {
    let subscribers = RelationService::new(state.db.clone())
        .channel_subscribers(&channel_id)
        .await?;

    Ok(ApiResponse::ok(
        ChannelSubscribers {
            channel_id,
            subscriber_count: subscribers.len(),
            subscribers,
        },
        "Subscribers fetched successfully",
    ))
}

/// GET /api/v1/subscriptions/u/:subscriberId
pub async fn get_subscribed_channels(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(subscriber_id): ApiPath<String>,
) -> Result<ApiResponse<SubscribedChannels>, AppError> {
    let channels = RelationService::new(state.db.clone())
        .subscribed_channels(&subscriber_id)
        .await?;

    Ok(ApiResponse::ok(
        SubscribedChannels {
            subscriber_id,
            subscribed_to_count: channels.len(),
            subscribed_to: channels,
        },
        "Subscribed channels fetched successfully",
    ))
}

/// Routes under /api/v1/subscriptions
pub fn subscriptions_router() -> Router<AppState> {
    Router::new()
        .route(
            "/c/:channelId",
            get(get_channel_subscribers).post(toggle_subscription),
        )
        .route("/u/:subscriberId", get(get_subscribed_channels))
}
