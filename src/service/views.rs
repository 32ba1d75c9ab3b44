//! Composed read views
//!
//! Thin orchestration over the database projections. The one piece of
//! real logic here is the video-detail side effects: the view bump and
//! the watch-history append happen after the projection succeeds, and a
//! failure in either is logged and swallowed so a read never turns into
//! a 500 because of its own bookkeeping.

use std::sync::Arc;

use crate::data::projections::*;
use crate::data::Database;
use crate::error::AppError;
use crate::query::{FeedQuery, Page};

pub struct ViewService {
    db: Arc<Database>,
}

impl ViewService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Public feed of published videos
    pub async fn feed(&self, query: &FeedQuery) -> Result<VideoFeedPage, AppError> {
        self.db.list_videos(query).await
    }

    /// Video detail relative to `viewer`.
    ///
    /// On success, bumps the view counter and, for a signed-in viewer,
    /// records the video in their watch history. Both are best-effort.
    pub async fn video_detail(
        &self,
        viewer: Option<&str>,
        video_id: &str,
    ) -> Result<VideoDetail, AppError> {
        let detail = self
            .db
            .video_detail(viewer, video_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if let Err(e) = self.db.increment_views(video_id).await {
            tracing::warn!(%video_id, error = %e, "Failed to bump view counter");
        }
        if let Some(viewer_id) = viewer {
            if let Err(e) = self.db.append_watch_history(viewer_id, video_id).await {
                tracing::warn!(%video_id, error = %e, "Failed to append watch history");
            }
        }

        Ok(detail)
    }

    /// Comment thread for a video, paged
    pub async fn video_comments(
        &self,
        viewer: Option<&str>,
        video_id: &str,
        query: &FeedQuery,
    ) -> Result<Page<CommentThreadItem>, AppError> {
        if self.db.get_video(video_id).await?.is_none() {
            return Err(AppError::NotFound);
        }
        let (items, total) = self
            .db
            .video_comments(viewer, video_id, i64::from(query.per_page), query.offset())
            .await?;
        Ok(Page::new(items, query.page, query.per_page, total))
    }

    /// Public channel profile by username
    pub async fn channel_profile(
        &self,
        viewer: Option<&str>,
        username: &str,
    ) -> Result<ChannelProfile, AppError> {
        self.db
            .channel_profile(viewer, &username.trim().to_lowercase())
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Dashboard aggregates for the channel owner
    pub async fn channel_stats(&self, channel_id: &str) -> Result<ChannelStats, AppError> {
        self.db.channel_stats(channel_id).await
    }

    /// All of the channel's own videos, drafts included
    pub async fn channel_videos(&self, channel_id: &str) -> Result<Vec<ChannelVideoItem>, AppError> {
        self.db.channel_videos(channel_id).await
    }

    /// Subscribers of a channel with the mutual flag
    pub async fn channel_subscribers(
        &self,
        channel_id: &str,
    ) -> Result<Vec<SubscriberEntry>, AppError> {
        if self.db.get_account_by_id(channel_id).await?.is_none() {
            return Err(AppError::NotFound);
        }
        self.db.channel_subscribers(channel_id).await
    }

    /// Channels a user subscribes to, each with its latest upload
    pub async fn subscribed_channels(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<SubscribedChannelEntry>, AppError> {
        self.db.subscribed_channels(subscriber_id).await
    }

    /// Videos the user has liked, most recent like first
    pub async fn liked_videos(&self, actor_id: &str) -> Result<Vec<LikedVideoItem>, AppError> {
        self.db.liked_videos(actor_id).await
    }

    /// The user's watch history, most recent first-watch first
    pub async fn watch_history(&self, account_id: &str) -> Result<Vec<WatchHistoryItem>, AppError> {
        self.db.watch_history(account_id).await
    }

    /// A user's tweets with engagement
    pub async fn user_tweets(
        &self,
        viewer: Option<&str>,
        user_id: &str,
    ) -> Result<Vec<TweetItem>, AppError> {
        if self.db.get_account_by_id(user_id).await?.is_none() {
            return Err(AppError::NotFound);
        }
        self.db.list_user_tweets(viewer, user_id).await
    }

    /// Playlist with its videos in playlist order
    pub async fn playlist_detail(&self, playlist_id: &str) -> Result<PlaylistDetail, AppError> {
        self.db
            .playlist_detail(playlist_id)
            .await?
            .ok_or(AppError::NotFound)
    }
}
