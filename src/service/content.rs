//! Comments and tweets

use std::sync::Arc;

use chrono::Utc;

use super::{ensure_owner, non_blank};
use crate::data::{
    Comment, CommentWithOwner, Database, EntityId, Page, PageRequest, Tweet, TweetWithOwner, User,
};
use crate::error::AppError;

/// Comment and tweet service
pub struct ContentService {
    db: Arc<Database>,
}

impl ContentService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn ensure_video_visible(&self, video_id: &str, viewer: &User) -> Result<(), AppError> {
        match self.db.get_video(video_id).await? {
            Some(video) if video.is_published || video.owner_id == viewer.id => Ok(()),
            _ => Err(AppError::not_found("Video not found")),
        }
    }

    // =========================================================================
    // Comments
    // =========================================================================

    pub async fn list_comments(
        &self,
        video_id: &str,
        viewer: &User,
        page: PageRequest,
    ) -> Result<Page<CommentWithOwner>, AppError> {
        self.ensure_video_visible(video_id, viewer).await?;
        self.db.list_video_comments(video_id, page).await
    }

    pub async fn add_comment(
        &self,
        actor: &User,
        video_id: &str,
        content: Option<&str>,
    ) -> Result<Comment, AppError> {
        let content =
            non_blank(content).ok_or_else(|| AppError::bad_request("Content is required"))?;
        self.ensure_video_visible(video_id, actor).await?;

        let now = Utc::now();
        let comment = Comment {
            id: EntityId::new().0,
            content,
            video_id: video_id.to_string(),
            owner_id: actor.id.clone(),
            created_at: now,
            updated_at: now,
        };
        self.db.insert_comment(&comment).await?;

        Ok(comment)
    }

    async fn load_owned_comment(&self, comment_id: &str, actor: &User) -> Result<Comment, AppError> {
        let comment = self
            .db
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment not found"))?;
        ensure_owner(
            &comment.owner_id,
            &actor.id,
            "You are not allowed to modify this comment",
        )?;
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        actor: &User,
        comment_id: &str,
        content: Option<&str>,
    ) -> Result<Comment, AppError> {
        let comment = self.load_owned_comment(comment_id, actor).await?;
        let content =
            non_blank(content).ok_or_else(|| AppError::bad_request("Content is required"))?;

        self.db
            .update_comment_content(&comment.id, &content, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found("Comment not found"))
    }

    pub async fn delete_comment(&self, actor: &User, comment_id: &str) -> Result<(), AppError> {
        let comment = self.load_owned_comment(comment_id, actor).await?;
        if !self.db.delete_comment(&comment.id).await? {
            return Err(AppError::not_found("Comment not found"));
        }
        Ok(())
    }

    // =========================================================================
    // Tweets
    // =========================================================================

    pub async fn create_tweet(&self, actor: &User, content: Option<&str>) -> Result<Tweet, AppError> {
        let content =
            non_blank(content).ok_or_else(|| AppError::bad_request("Content is required"))?;

        let now = Utc::now();
        let tweet = Tweet {
            id: EntityId::new().0,
            content,
            owner_id: actor.id.clone(),
            created_at: now,
            updated_at: now,
        };
        self.db.insert_tweet(&tweet).await?;

        Ok(tweet)
    }

    pub async fn list_user_tweets(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<Page<TweetWithOwner>, AppError> {
        if self.db.get_user(user_id).await?.is_none() {
            return Err(AppError::not_found("User not found"));
        }
        self.db.list_user_tweets(user_id, page).await
    }

    async fn load_owned_tweet(&self, tweet_id: &str, actor: &User) -> Result<Tweet, AppError> {
        let tweet = self
            .db
            .get_tweet(tweet_id)
            .await?
            .ok_or_else(|| AppError::not_found("Tweet not found"))?;
        ensure_owner(
            &tweet.owner_id,
            &actor.id,
            "You are not allowed to modify this tweet",
        )?;
        Ok(tweet)
    }

    pub async fn update_tweet(
        &self,
        actor: &User,
        tweet_id: &str,
        content: Option<&str>,
    ) -> Result<Tweet, AppError> {
        let tweet = self.load_owned_tweet(tweet_id, actor).await?;
        let content =
            non_blank(content).ok_or_else(|| AppError::bad_request("Content is required"))?;

        self.db
            .update_tweet_content(&tweet.id, &content, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found("Tweet not found"))
    }

    pub async fn delete_tweet(&self, actor: &User, tweet_id: &str) -> Result<(), AppError> {
        let tweet = self.load_owned_tweet(tweet_id, actor).await?;
        if !self.db.delete_tweet(&tweet.id).await? {
            return Err(AppError::not_found("Tweet not found"));
        }
        Ok(())
    }
}
