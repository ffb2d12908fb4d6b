//! SQLite database operations
//!
//! All database access goes through this module.
//! Uses SQLx with runtime-checked queries.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use std::path::Path;

use super::models::*;
use super::page::{Page, PageRequest, VideoQuery};
use crate::error::AppError;

/// Video columns plus the owner's public profile, aliased for
/// [`OwnerProfile::from_joined_row`].
const VIDEO_WITH_OWNER_COLUMNS: &str =
    "v.*, u.full_name AS owner_full_name, u.username AS owner_username, u.avatar AS owner_avatar";

const CONFLICTING_USER_MESSAGE: &str = "User with email or username already exists";

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db_error) if db_error.is_unique_violation())
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user
    ///
    /// # Errors
    /// `Conflict` if the username or email is already taken
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, full_name, avatar, cover_image,
                password_hash, refresh_token_hash, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar)
        .bind(&user.cover_image)
        .bind(&user.password_hash)
        .bind(&user.refresh_token_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(CONFLICTING_USER_MESSAGE)
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(())
    }

    /// Get user by ID
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find a user by username or email (either may be omitted)
    pub async fn find_user_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = ? OR email = ? LIMIT 1",
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Check whether a username or email is already registered
    pub async fn user_exists(&self, username: &str, email: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? OR email = ?)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Update display name and email
    ///
    /// # Returns
    /// The updated user, or None if no such user
    pub async fn update_user_details(
        &self,
        id: &str,
        full_name: &str,
        email: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET full_name = ?, email = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(full_name)
        .bind(email)
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("Email is already in use")
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(user)
    }

    /// Replace the avatar URL
    pub async fn update_user_avatar(
        &self,
        id: &str,
        avatar: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET avatar = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(avatar)
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Replace the cover image URL
    pub async fn update_user_cover_image(
        &self,
        id: &str,
        cover_image: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET cover_image = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(cover_image)
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Replace the password hash
    pub async fn update_user_password(
        &self,
        id: &str,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(updated_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Store (or clear with `None`) the hash of the user's refresh token
    pub async fn set_refresh_token_hash(
        &self,
        id: &str,
        refresh_token_hash: Option<&str>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET refresh_token_hash = ? WHERE id = ?")
            .bind(refresh_token_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Swap the refresh token hash only if it still equals `expected`.
    ///
    /// Makes refresh-token rotation single-use under concurrent refreshes.
    pub async fn rotate_refresh_token_hash(
        &self,
        id: &str,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = ? WHERE id = ? AND refresh_token_hash = ?",
        )
        .bind(replacement)
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Channel page for `username` as seen by `viewer_id`
    pub async fn get_channel_profile(
        &self,
        username: &str,
        viewer_id: &str,
    ) -> Result<Option<ChannelProfile>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT
                u.id, u.full_name, u.username, u.email, u.avatar, u.cover_image,
                (SELECT COUNT(*) FROM subscriptions WHERE channel_id = u.id) AS subscribers_count,
                (SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = u.id)
                    AS channels_subscribed_to_count,
                EXISTS(
                    SELECT 1 FROM subscriptions WHERE channel_id = u.id AND subscriber_id = ?
                ) AS is_subscribed
            FROM users u
            WHERE u.username = ?
            "#,
        )
        .bind(viewer_id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(ChannelProfile {
            id: row.try_get("id")?,
            full_name: row.try_get("full_name")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            avatar: row.try_get("avatar")?,
            cover_image: row.try_get("cover_image")?,
            subscribers_count: row.try_get("subscribers_count")?,
            channels_subscribed_to_count: row.try_get("channels_subscribed_to_count")?,
            is_subscribed: row.try_get("is_subscribed")?,
        }))
    }

    /// Videos in the user's watch history, most recently watched first.
    /// Videos unpublished since are dropped unless the user owns them.
    pub async fn get_watch_history(&self, user_id: &str) -> Result<Vec<VideoWithOwner>, AppError> {
        let query = format!(
            r#"
            SELECT {VIDEO_WITH_OWNER_COLUMNS}
            FROM watch_history wh
            INNER JOIN videos v ON v.id = wh.video_id
            INNER JOIN users u ON u.id = v.owner_id
            WHERE wh.user_id = ? AND (v.is_published = 1 OR v.owner_id = ?)
            ORDER BY wh.watched_at DESC, v.id DESC
            "#
        );

        let videos = sqlx::query_as::<_, VideoWithOwner>(&query)
            .bind(user_id)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(videos)
    }

    // =========================================================================
    // Videos
    // =========================================================================

    /// Insert a new video
    pub async fn insert_video(&self, video: &Video) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO videos (
                id, title, description, video_file, thumbnail, duration,
                views, is_published, owner_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&video.id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.video_file)
        .bind(&video.thumbnail)
        .bind(video.duration)
        .bind(video.views)
        .bind(video.is_published)
        .bind(&video.owner_id)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get video by ID
    pub async fn get_video(&self, id: &str) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    /// Get video by ID with its owner's profile
    pub async fn get_video_with_owner(&self, id: &str) -> Result<Option<VideoWithOwner>, AppError> {
        let query = format!(
            r#"
            SELECT {VIDEO_WITH_OWNER_COLUMNS}
            FROM videos v
            INNER JOIN users u ON u.id = v.owner_id
            WHERE v.id = ?
            "#
        );

        let video = sqlx::query_as::<_, VideoWithOwner>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    /// List videos visible to `viewer_id` (published ones plus the viewer's own)
    ///
    /// # Arguments
    /// * `query` - Optional owner filter and sort order
    /// * `viewer_id` - Requesting user
    /// * `page` - Page to return
    pub async fn list_videos(
        &self,
        query: &VideoQuery,
        viewer_id: &str,
        page: PageRequest,
    ) -> Result<Page<VideoWithOwner>, AppError> {
        fn push_filter<'a>(
            builder: &mut QueryBuilder<'a, Sqlite>,
            query: &'a VideoQuery,
            viewer_id: &'a str,
        ) {
            builder
                .push(" WHERE (v.is_published = 1 OR v.owner_id = ")
                .push_bind(viewer_id)
                .push(")");
            if let Some(owner_id) = query.owner_id.as_deref() {
                builder.push(" AND v.owner_id = ").push_bind(owner_id);
            }
        }

        let mut count_builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM videos v");
        push_filter(&mut count_builder, query, viewer_id);
        let total_items: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {VIDEO_WITH_OWNER_COLUMNS} FROM videos v INNER JOIN users u ON u.id = v.owner_id"
        ));
        push_filter(&mut builder, query, viewer_id);
        let direction = query.sort_direction.as_sql();
        builder.push(format!(
            " ORDER BY {} {direction}, v.id {direction} LIMIT ",
            query.sort_by.column()
        ));
        builder.push_bind(page.limit() as i64);
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());

        let items = builder
            .build_query_as::<VideoWithOwner>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, total_items, page))
    }

    /// Update title, description and thumbnail
    pub async fn update_video_details(
        &self,
        id: &str,
        title: &str,
        description: &str,
        thumbnail: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<_, Video>(
            r#"
            UPDATE videos
            SET title = ?, description = ?, thumbnail = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(thumbnail)
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    /// Flip the published flag
    ///
    /// # Returns
    /// The new flag value, or None if no such video
    pub async fn toggle_video_published(
        &self,
        id: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<bool>, AppError> {
        let is_published = sqlx::query_scalar::<_, bool>(
            r#"
            UPDATE videos
            SET is_published = NOT is_published, updated_at = ?
            WHERE id = ?
            RETURNING is_published
            "#,
        )
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(is_published)
    }

    /// Delete a video; comments, likes, playlist entries and
    /// watch-history entries go with it.
    pub async fn delete_video(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Record that `user_id` watched `video_id`.
    ///
    /// Appends to the watch history and increments the view counter in one
    /// transaction, only the first time this user watches this video.
    ///
    /// # Returns
    /// `true` if this was a new (counted) view
    pub async fn record_video_view(&self, user_id: &str, video_id: &str) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO watch_history (user_id, video_id, watched_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(video_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let counted = inserted.rows_affected() == 1;
        if counted {
            sqlx::query("UPDATE videos SET views = views + 1 WHERE id = ?")
                .bind(video_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(counted)
    }

    /// All videos owned by a channel, newest first (unpublished included)
    pub async fn get_channel_videos(&self, owner_id: &str) -> Result<Vec<Video>, AppError> {
        let videos = sqlx::query_as::<_, Video>(
            "SELECT * FROM videos WHERE owner_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    /// Aggregate counters for a channel's dashboard
    pub async fn get_channel_stats(&self, owner_id: &str) -> Result<ChannelStats, AppError> {
        let row: SqliteRow = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM videos WHERE owner_id = ?) AS total_channel_videos,
                (SELECT COALESCE(SUM(views), 0) FROM videos WHERE owner_id = ?)
                    AS total_channel_views,
                (SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?)
                    AS total_channel_subscribers,
                (SELECT COUNT(*) FROM likes l
                    INNER JOIN videos v ON v.id = l.video_id
                    WHERE v.owner_id = ?) AS total_channel_likes
            "#,
        )
        .bind(owner_id)
        .bind(owner_id)
        .bind(owner_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ChannelStats {
            total_channel_videos: row.try_get("total_channel_videos")?,
            total_channel_views: row.try_get("total_channel_views")?,
            total_channel_subscribers: row.try_get("total_channel_subscribers")?,
            total_channel_likes: row.try_get("total_channel_likes")?,
        })
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Insert a new comment
    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, content, video_id, owner_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.content)
        .bind(&comment.video_id)
        .bind(&comment.owner_id)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get comment by ID
    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    /// Replace comment content
    pub async fn update_comment_content(
        &self,
        id: &str,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>(
            "UPDATE comments SET content = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(content)
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Delete comment (its likes go with it)
    pub async fn delete_comment(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Comments on a video with author profiles, newest first
    pub async fn list_video_comments(
        &self,
        video_id: &str,
        page: PageRequest,
    ) -> Result<Page<CommentWithOwner>, AppError> {
        let total_items: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE video_id = ?")
                .bind(video_id)
                .fetch_one(&self.pool)
                .await?;

        let items = sqlx::query_as::<_, CommentWithOwner>(
            r#"
            SELECT c.*, u.full_name AS owner_full_name, u.username AS owner_username,
                   u.avatar AS owner_avatar
            FROM comments c
            INNER JOIN users u ON u.id = c.owner_id
            WHERE c.video_id = ?
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(video_id)
        .bind(page.limit() as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, total_items, page))
    }

    // =========================================================================
    // Tweets
    // =========================================================================

    /// Insert a new tweet
    pub async fn insert_tweet(&self, tweet: &Tweet) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO tweets (id, content, owner_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&tweet.id)
        .bind(&tweet.content)
        .bind(&tweet.owner_id)
        .bind(tweet.created_at)
        .bind(tweet.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get tweet by ID
    pub async fn get_tweet(&self, id: &str) -> Result<Option<Tweet>, AppError> {
        let tweet = sqlx::query_as::<_, Tweet>("SELECT * FROM tweets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tweet)
    }

    /// Replace tweet content
    pub async fn update_tweet_content(
        &self,
        id: &str,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Tweet>, AppError> {
        let tweet = sqlx::query_as::<_, Tweet>(
            "UPDATE tweets SET content = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(content)
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tweet)
    }

    /// Delete tweet (its likes go with it)
    pub async fn delete_tweet(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tweets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Tweets by a user with the author's profile, newest first
    pub async fn list_user_tweets(
        &self,
        owner_id: &str,
        page: PageRequest,
    ) -> Result<Page<TweetWithOwner>, AppError> {
        let total_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tweets WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, TweetWithOwner>(
            r#"
            SELECT t.*, u.full_name AS owner_full_name, u.username AS owner_username,
                   u.avatar AS owner_avatar
            FROM tweets t
            INNER JOIN users u ON u.id = t.owner_id
            WHERE t.owner_id = ?
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(owner_id)
        .bind(page.limit() as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, total_items, page))
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Check that a like target exists
    pub async fn like_target_exists(
        &self,
        target: LikeTarget,
        target_id: &str,
    ) -> Result<bool, AppError> {
        let query = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", target.table());
        let exists: bool = sqlx::query_scalar(&query)
            .bind(target_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    /// Flip the like of `user_id` on a target.
    ///
    /// The delete-then-insert runs in one transaction and the insert is
    /// guarded by the `(liked_by, target)` unique index, so concurrent
    /// toggles can never create two like rows.
    pub async fn toggle_like(
        &self,
        user_id: &str,
        target: LikeTarget,
        target_id: &str,
    ) -> Result<Toggle<Like>, AppError> {
        let column = target.column();
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(&format!(
            "DELETE FROM likes WHERE liked_by = ? AND {column} = ?"
        ))
        .bind(user_id)
        .bind(target_id)
        .execute(&mut *tx)
        .await?;

        if deleted.rows_affected() > 0 {
            tx.commit().await?;
            return Ok(Toggle::Removed);
        }

        sqlx::query(&format!(
            "INSERT INTO likes (id, liked_by, {column}, created_at) VALUES (?, ?, ?, ?) ON CONFLICT DO NOTHING"
        ))
        .bind(EntityId::new().0)
        .bind(user_id)
        .bind(target_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let like = sqlx::query_as::<_, Like>(&format!(
            "SELECT * FROM likes WHERE liked_by = ? AND {column} = ?"
        ))
        .bind(user_id)
        .bind(target_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Toggle::Added(like))
    }

    /// Number of likes on a target
    pub async fn count_likes(&self, target: LikeTarget, target_id: &str) -> Result<i64, AppError> {
        let query = format!("SELECT COUNT(*) FROM likes WHERE {} = ?", target.column());
        let count: i64 = sqlx::query_scalar(&query)
            .bind(target_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Check whether `user_id` likes a target
    pub async fn is_liked(
        &self,
        user_id: &str,
        target: LikeTarget,
        target_id: &str,
    ) -> Result<bool, AppError> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE liked_by = ? AND {} = ?)",
            target.column()
        );
        let liked: bool = sqlx::query_scalar(&query)
            .bind(user_id)
            .bind(target_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(liked)
    }

    /// Videos liked by a user with owner profiles, most recently liked first
    pub async fn get_liked_videos(&self, user_id: &str) -> Result<Vec<VideoWithOwner>, AppError> {
        let query = format!(
            r#"
            SELECT {VIDEO_WITH_OWNER_COLUMNS}
            FROM likes l
            INNER JOIN videos v ON v.id = l.video_id
            INNER JOIN users u ON u.id = v.owner_id
            WHERE l.liked_by = ? AND (v.is_published = 1 OR v.owner_id = l.liked_by)
            ORDER BY l.created_at DESC, l.id DESC
            "#
        );

        let videos = sqlx::query_as::<_, VideoWithOwner>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(videos)
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Flip the subscription of `subscriber_id` to `channel_id`.
    ///
    /// Same shape as [`Database::toggle_like`], guarded by the
    /// `(subscriber_id, channel_id)` unique index.
    pub async fn toggle_subscription(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<Toggle<Subscription>, AppError> {
        let mut tx = self.pool.begin().await?;

        let deleted =
            sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?")
                .bind(subscriber_id)
                .bind(channel_id)
                .execute(&mut *tx)
                .await?;

        if deleted.rows_affected() > 0 {
            tx.commit().await?;
            return Ok(Toggle::Removed);
        }

        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, subscriber_id, channel_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(subscriber_id, channel_id) DO NOTHING
            "#,
        )
        .bind(EntityId::new().0)
        .bind(subscriber_id)
        .bind(channel_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let subscription = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Toggle::Added(subscription))
    }

    /// Users subscribed to a channel, newest subscription first
    pub async fn get_channel_subscribers(
        &self,
        channel_id: &str,
    ) -> Result<Vec<SubscriptionEntry>, AppError> {
        let subscribers = sqlx::query_as::<_, SubscriptionEntry>(
            r#"
            SELECT s.id, s.created_at, u.id AS owner_id, u.full_name AS owner_full_name,
                   u.username AS owner_username, u.avatar AS owner_avatar
            FROM subscriptions s
            INNER JOIN users u ON u.id = s.subscriber_id
            WHERE s.channel_id = ?
            ORDER BY s.created_at DESC, s.id DESC
            "#,
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subscribers)
    }

    /// Channels a user is subscribed to, newest subscription first
    pub async fn get_subscribed_channels(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<SubscriptionEntry>, AppError> {
        let channels = sqlx::query_as::<_, SubscriptionEntry>(
            r#"
            SELECT s.id, s.created_at, u.id AS owner_id, u.full_name AS owner_full_name,
                   u.username AS owner_username, u.avatar AS owner_avatar
            FROM subscriptions s
            INNER JOIN users u ON u.id = s.channel_id
            WHERE s.subscriber_id = ?
            ORDER BY s.created_at DESC, s.id DESC
            "#,
        )
        .bind(subscriber_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(channels)
    }

    // =========================================================================
    // Playlists
    // =========================================================================

    /// Insert a new playlist
    pub async fn insert_playlist(&self, playlist: &Playlist) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO playlists (id, name, description, owner_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&playlist.id)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(&playlist.owner_id)
        .bind(playlist.created_at)
        .bind(playlist.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get playlist by ID
    pub async fn get_playlist(&self, id: &str) -> Result<Option<Playlist>, AppError> {
        let playlist = sqlx::query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(playlist)
    }

    /// Videos in a playlist visible to `viewer_id`, in the order they were added
    pub async fn get_playlist_videos(
        &self,
        playlist_id: &str,
        viewer_id: &str,
    ) -> Result<Vec<VideoWithOwner>, AppError> {
        let query = format!(
            r#"
            SELECT {VIDEO_WITH_OWNER_COLUMNS}
            FROM playlist_videos pv
            INNER JOIN videos v ON v.id = pv.video_id
            INNER JOIN users u ON u.id = v.owner_id
            WHERE pv.playlist_id = ? AND (v.is_published = 1 OR v.owner_id = ?)
            ORDER BY pv.position ASC, pv.added_at ASC, pv.video_id ASC
            "#
        );

        let videos = sqlx::query_as::<_, VideoWithOwner>(&query)
            .bind(playlist_id)
            .bind(viewer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(videos)
    }

    /// Playlist with owner profile and videos
    pub async fn get_playlist_details(
        &self,
        id: &str,
        viewer_id: &str,
    ) -> Result<Option<PlaylistDetails>, AppError> {
        let Some(playlist) = self.get_playlist(id).await? else {
            return Ok(None);
        };

        self.expand_playlist(playlist, viewer_id).await.map(Some)
    }

    /// All playlists of a user, newest first. Empty when the user has none.
    pub async fn get_user_playlists(
        &self,
        owner_id: &str,
        viewer_id: &str,
    ) -> Result<Vec<PlaylistDetails>, AppError> {
        let playlists = sqlx::query_as::<_, Playlist>(
            "SELECT * FROM playlists WHERE owner_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        let mut details = Vec::with_capacity(playlists.len());
        for playlist in playlists {
            details.push(self.expand_playlist(playlist, viewer_id).await?);
        }

        Ok(details)
    }

    async fn expand_playlist(
        &self,
        playlist: Playlist,
        viewer_id: &str,
    ) -> Result<PlaylistDetails, AppError> {
        let owner = self
            .get_user(&playlist.owner_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "playlist {} references missing owner",
                    playlist.id
                ))
            })?;
        let videos = self.get_playlist_videos(&playlist.id, viewer_id).await?;

        Ok(PlaylistDetails {
            owner: OwnerProfile::from(&owner),
            total_videos: videos.len(),
            videos,
            playlist,
        })
    }

    /// Update playlist name and description
    pub async fn update_playlist(
        &self,
        id: &str,
        name: &str,
        description: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Playlist>, AppError> {
        let playlist = sqlx::query_as::<_, Playlist>(
            r#"
            UPDATE playlists
            SET name = ?, description = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(playlist)
    }

    /// Delete a playlist (entries go with it, videos stay)
    pub async fn delete_playlist(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM playlists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Append a video to the end of a playlist
    ///
    /// # Returns
    /// `false` if the video was already in the playlist
    pub async fn add_video_to_playlist(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO playlist_videos (playlist_id, video_id, position, added_at)
            SELECT ?, ?, COALESCE(MAX(position), 0) + 1, ?
            FROM playlist_videos
            WHERE playlist_id = ?
            ON CONFLICT(playlist_id, video_id) DO NOTHING
            "#,
        )
        .bind(playlist_id)
        .bind(video_id)
        .bind(Utc::now())
        .bind(playlist_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Remove a video from a playlist
    ///
    /// # Returns
    /// `false` if the video was not in the playlist
    pub async fn remove_video_from_playlist(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = ? AND video_id = ?")
                .bind(playlist_id)
                .bind(video_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }
}
