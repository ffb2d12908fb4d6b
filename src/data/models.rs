//! Data models
//!
//! Rust structs representing database rows and the denormalized
//! read models built from them. All models use ULID for IDs and
//! chrono for timestamps. Wire names are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Users
// =============================================================================

/// A registered user (also a channel)
///
/// Never serialized directly: use [`PublicUser`] or [`OwnerProfile`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    /// Lowercase, unique
    pub username: String,
    /// Lowercase, unique
    pub email: String,
    pub full_name: String,
    /// Avatar URL (required)
    pub avatar: String,
    /// Cover image URL, empty when not set
    pub cover_image: String,
    /// Argon2 PHC string
    pub password_hash: String,
    /// SHA-256 of the current refresh token
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User fields safe to return to the user themself
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            avatar: user.avatar.clone(),
            cover_image: user.cover_image.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Public profile subset joined into denormalized reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProfile {
    pub id: String,
    pub full_name: String,
    pub username: String,
    pub avatar: String,
}

impl OwnerProfile {
    /// Read `owner_id`, `owner_full_name`, `owner_username`, `owner_avatar`
    /// columns from a joined row.
    pub(crate) fn from_joined_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("owner_id")?,
            full_name: row.try_get("owner_full_name")?,
            username: row.try_get("owner_username")?,
            avatar: row.try_get("owner_avatar")?,
        })
    }
}

impl From<&User> for OwnerProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            full_name: user.full_name.clone(),
            username: user.username.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// Channel page: a profile plus subscription counters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: String,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub cover_image: String,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
}

// =============================================================================
// Videos
// =============================================================================

/// A video row
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Public URL of the media file
    pub video_file: String,
    /// Public URL of the thumbnail
    pub thumbnail: String,
    /// Duration in seconds
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Video joined with its owner's public profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoWithOwner {
    #[serde(flatten)]
    pub video: Video,
    pub owner: OwnerProfile,
}

impl<'r> FromRow<'r, SqliteRow> for VideoWithOwner {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            video: Video::from_row(row)?,
            owner: OwnerProfile::from_joined_row(row)?,
        })
    }
}

/// Single-video view for a specific viewer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    #[serde(flatten)]
    pub video: VideoWithOwner,
    pub likes_count: i64,
    pub is_liked: bool,
}

// =============================================================================
// Comments / Tweets
// =============================================================================

/// A comment row
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub video_id: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment joined with its author's public profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithOwner {
    #[serde(flatten)]
    pub comment: Comment,
    pub owner: OwnerProfile,
}

impl<'r> FromRow<'r, SqliteRow> for CommentWithOwner {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            comment: Comment::from_row(row)?,
            owner: OwnerProfile::from_joined_row(row)?,
        })
    }
}

/// A tweet-style post
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    pub id: String,
    pub content: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tweet joined with its author's public profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetWithOwner {
    #[serde(flatten)]
    pub tweet: Tweet,
    pub owner: OwnerProfile,
}

impl<'r> FromRow<'r, SqliteRow> for TweetWithOwner {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            tweet: Tweet::from_row(row)?,
            owner: OwnerProfile::from_joined_row(row)?,
        })
    }
}

// =============================================================================
// Relations
// =============================================================================

/// What a like points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Video,
    Comment,
    Tweet,
}

impl LikeTarget {
    /// Column holding the target id in the `likes` table
    pub fn column(&self) -> &'static str {
        match self {
            Self::Video => "video_id",
            Self::Comment => "comment_id",
            Self::Tweet => "tweet_id",
        }
    }

    /// Table the target id refers to
    pub fn table(&self) -> &'static str {
        match self {
            Self::Video => "videos",
            Self::Comment => "comments",
            Self::Tweet => "tweets",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Comment => "comment",
            Self::Tweet => "tweet",
        }
    }
}

/// Like join record; exactly one target is set
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: String,
    pub liked_by: String,
    pub video_id: Option<String>,
    pub comment_id: Option<String>,
    pub tweet_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Subscription join record
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub subscriber_id: String,
    pub channel_id: String,
    pub created_at: DateTime<Utc>,
}

/// Result of flipping a toggle relation
#[derive(Debug, Clone)]
pub enum Toggle<T> {
    /// Relation did not exist and now does
    Added(T),
    /// Relation existed and was removed
    Removed,
}

impl<T> Toggle<T> {
    pub fn is_added(&self) -> bool {
        matches!(self, Toggle::Added(_))
    }
}

/// Subscriber or subscribed-to channel, with the time of subscribing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEntry {
    pub subscription_id: String,
    pub user: OwnerProfile,
    pub subscribed_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for SubscriptionEntry {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            subscription_id: row.try_get("id")?,
            user: OwnerProfile::from_joined_row(row)?,
            subscribed_at: row.try_get("created_at")?,
        })
    }
}

// =============================================================================
// Playlists
// =============================================================================

/// A playlist row
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Playlist with owner profile and its videos in insertion order
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetails {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub owner: OwnerProfile,
    pub videos: Vec<VideoWithOwner>,
    pub total_videos: usize,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Aggregate counters for a channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_channel_videos: i64,
    pub total_channel_views: i64,
    pub total_channel_subscribers: i64,
    pub total_channel_likes: i64,
}
