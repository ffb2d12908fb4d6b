//! Likes and subscriptions (toggle relations)

use std::sync::Arc;

use crate::data::{
    Database, Like, LikeTarget, Subscription, SubscriptionEntry, Toggle, User, VideoWithOwner,
};
use crate::error::AppError;
use crate::metrics::RELATION_TOGGLES_TOTAL;

fn record_toggle<T>(relation: &str, toggle: &Toggle<T>) {
    let outcome = if toggle.is_added() { "added" } else { "removed" };
    RELATION_TOGGLES_TOTAL
        .with_label_values(&[relation, outcome])
        .inc();
}

/// Like and subscription service
pub struct RelationService {
    db: Arc<Database>,
}

impl RelationService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Like or unlike a video, comment or tweet
    ///
    /// # Errors
    /// `NotFound` if the target does not exist
    pub async fn toggle_like(
        &self,
        actor: &User,
        target: LikeTarget,
        target_id: &str,
    ) -> Result<Toggle<Like>, AppError> {
        let exists = match target {
            LikeTarget::Video => self
                .db
                .get_video(target_id)
                .await?
                .is_some_and(|video| video.is_published || video.owner_id == actor.id),
            LikeTarget::Comment | LikeTarget::Tweet => {
                self.db.like_target_exists(target, target_id).await?
            }
        };
        if !exists {
            return Err(AppError::not_found(match target {
                LikeTarget::Video => "Video not found",
                LikeTarget::Comment => "Comment not found",
                LikeTarget::Tweet => "Tweet not found",
            }));
        }

        let toggle = self.db.toggle_like(&actor.id, target, target_id).await?;
        record_toggle(target.as_str(), &toggle);
        tracing::debug!(
            user_id = %actor.id,
            target = target.as_str(),
            target_id,
            added = toggle.is_added(),
            "Like toggled"
        );

        Ok(toggle)
    }

    /// Videos the actor has liked
    pub async fn liked_videos(&self, actor: &User) -> Result<Vec<VideoWithOwner>, AppError> {
        self.db.get_liked_videos(&actor.id).await
    }

    /// Subscribe to or unsubscribe from a channel
    ///
    /// # Errors
    /// - `BadRequest` when subscribing to oneself
    /// - `NotFound` if the channel does not exist
    pub async fn toggle_subscription(
        &self,
        actor: &User,
        channel_id: &str,
    ) -> Result<Toggle<Subscription>, AppError> {
        if channel_id == actor.id {
            return Err(AppError::bad_request("You cannot subscribe to yourself"));
        }
        self.ensure_user(channel_id, "Channel not found").await?;

        let toggle = self.db.toggle_subscription(&actor.id, channel_id).await?;
        record_toggle("subscription", &toggle);

        Ok(toggle)
    }

    /// Subscribers of a channel
    pub async fn channel_subscribers(
        &self,
        channel_id: &str,
    ) -> Result<Vec<SubscriptionEntry>, AppError> {
        self.ensure_user(channel_id, "Channel not found").await?;
        self.db.get_channel_subscribers(channel_id).await
    }

    /// Channels a user subscribes to
    pub async fn subscribed_channels(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<SubscriptionEntry>, AppError> {
        self.ensure_user(subscriber_id, "Subscriber not found").await?;
        self.db.get_subscribed_channels(subscriber_id).await
    }

    async fn ensure_user(&self, user_id: &str, message: &str) -> Result<(), AppError> {
        if self.db.get_user(user_id).await?.is_none() {
            return Err(AppError::not_found(message));
        }
        Ok(())
    }
}
