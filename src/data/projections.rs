//! Read-model projections
//!
//! Statically-defined response shapes for every composed view. Each struct
//! is built by exactly one query in the database layer; derived fields
//! (counts, membership flags) are computed in SQL relative to the
//! requesting viewer, never by follow-up round trips.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::query::Page;

/// Denormalized owner info attached to videos and comments
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerDetails {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
}

/// One entry of the public video feed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFeedItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub owner: OwnerDetails,
}

pub type VideoFeedPage = Page<VideoFeedItem>;

/// Channel info embedded in the video detail view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCard {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub subscribers_count: i64,
    pub is_subscribed: bool,
}

/// Full video detail view
///
/// `likes_count` is the cardinality of the like-edge set for this video;
/// `is_liked`/`is_subscribed` are membership tests of the viewer's id in
/// the joined edge sets and are always false for an anonymous viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub is_liked: bool,
    pub owner: ChannelCard,
}

/// One comment in a video's thread
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadItem {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub is_liked: bool,
    pub owner: OwnerDetails,
}

/// Public channel profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
    pub created_at: DateTime<Utc>,
}

/// Channel dashboard aggregates
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_videos: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_subscribers: i64,
}

/// One of the channel's own videos on the dashboard (drafts included)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelVideoItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
}

/// One subscriber of a channel
///
/// `subscribed_to_subscriber` is the mutual flag: does the channel being
/// listed subscribe back to this subscriber.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberEntry {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub subscribed_to_subscriber: bool,
    pub subscribers_count: i64,
}

/// Compact video card for "latest upload" slots
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestVideo {
    pub id: String,
    pub title: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
}

/// One channel a user subscribes to, with its most recent upload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedChannelEntry {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub latest_video: Option<LatestVideo>,
}

/// One entry of the liked-videos list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideoItem {
    pub liked_at: DateTime<Utc>,
    pub video: VideoFeedItem,
}

/// One entry of the watch history
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryItem {
    pub watched_at: DateTime<Utc>,
    pub video: VideoFeedItem,
}

/// Playlist with its videos resolved, in playlist order
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetail {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub videos: Vec<VideoFeedItem>,
}

/// One of a user's tweets with engagement
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetItem {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub is_liked: bool,
    pub owner: OwnerDetails,
}
