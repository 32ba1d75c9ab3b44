//! SQLite database operations
//!
//! All database access goes through this module. Edge tables (likes,
//! subscriptions) are guarded by UNIQUE indexes in the schema; the insert
//! helpers here use `INSERT OR IGNORE` so a losing concurrent insert is
//! reported as "not inserted" instead of an error or a duplicate edge.
//!
//! View queries compute counts and viewer-membership flags as SQL
//! subqueries, one statement per view. A NULL viewer bind makes every
//! membership flag false, which is exactly the anonymous case.

use std::path::Path;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};

use super::models::*;
use super::projections::*;
use crate::error::AppError;
use crate::query::FeedQuery;

/// Database connection pool wrapper
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
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Database(sqlx::Error::Migrate(Box::new(e))))?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    pub async fn insert_account(&self, account: &Account) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO accounts (id, username, email, full_name, password_hash, avatar_url, cover_image_url, refresh_token, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.full_name)
        .bind(&account.password_hash)
        .bind(&account.avatar_url)
        .bind(&account.cover_image_url)
        .bind(&account.refresh_token)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_account_by_id(&self, id: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    pub async fn get_account_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    /// Look up by username or email, for login.
    ///
    /// Usernames are stored lowercase, so the username side of the match
    /// lowercases the identifier; the email side stays byte-equal.
    pub async fn get_account_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE username = LOWER(?) OR email = ?",
        )
        .bind(identifier)
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    /// Overwrite the account's single live refresh token (NULL = logged out)
    pub async fn set_refresh_token(
        &self,
        account_id: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE accounts SET refresh_token = ?, updated_at = ? WHERE id = ?")
            .bind(refresh_token)
            .bind(Utc::now())
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_password_hash(
        &self,
        account_id: &str,
        password_hash: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE accounts SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_account_details(
        &self,
        account_id: &str,
        full_name: &str,
        email: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE accounts SET full_name = ?, email = ?, updated_at = ? WHERE id = ?")
            .bind(full_name)
            .bind(email)
            .bind(Utc::now())
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_avatar_url(&self, account_id: &str, url: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE accounts SET avatar_url = ?, updated_at = ? WHERE id = ?")
            .bind(url)
            .bind(Utc::now())
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_cover_image_url(&self, account_id: &str, url: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE accounts SET cover_image_url = ?, updated_at = ? WHERE id = ?")
            .bind(url)
            .bind(Utc::now())
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Watch history
    // =========================================================================

    /// Set-semantics append: already-watched videos keep their original slot
    pub async fn append_watch_history(
        &self,
        account_id: &str,
        video_id: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT OR IGNORE INTO watch_history (account_id, video_id, added_at) VALUES (?, ?, ?)",
        )
        .bind(account_id)
        .bind(video_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn watch_history(&self, account_id: &str) -> Result<Vec<WatchHistoryItem>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT w.added_at, {FEED_ITEM_COLUMNS}
             FROM watch_history w
             JOIN videos v ON v.id = w.video_id
             JOIN accounts a ON a.id = v.owner_id
             WHERE w.account_id = ?
             ORDER BY w.added_at DESC"
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(WatchHistoryItem {
                    watched_at: row.try_get("added_at")?,
                    video: feed_item_from_row(row)?,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(AppError::Database)
    }

    // =========================================================================
    // Videos
    // =========================================================================

    pub async fn insert_video(&self, video: &Video) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO videos (id, owner_id, title, description, video_url, video_key, thumbnail_url, thumbnail_key, duration, views, is_published, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&video.id)
        .bind(&video.owner_id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.video_url)
        .bind(&video.video_key)
        .bind(&video.thumbnail_url)
        .bind(&video.thumbnail_key)
        .bind(video.duration)
        .bind(video.views)
        .bind(video.is_published)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_video(&self, id: &str) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    /// Update mutable video fields from an already-loaded record
    pub async fn update_video(&self, video: &Video) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE videos SET title = ?, description = ?, thumbnail_url = ?, thumbnail_key = ?, is_published = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(&video.thumbnail_key)
        .bind(video.is_published)
        .bind(Utc::now())
        .bind(&video.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Best-effort view bump, one per successful detail projection
    pub async fn increment_views(&self, video_id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE videos SET views = views + 1 WHERE id = ?")
            .bind(video_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a video and everything referencing it, atomically:
    /// likes on its comments, the comments, likes on the video itself,
    /// playlist entries and watch-history rows.
    pub async fn delete_video_cascade(&self, video_id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM likes WHERE target_kind = 'comment'
             AND target_id IN (SELECT id FROM comments WHERE video_id = ?)",
        )
        .bind(video_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM comments WHERE video_id = ?")
            .bind(video_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM likes WHERE target_kind = 'video' AND target_id = ?")
            .bind(video_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM playlist_videos WHERE video_id = ?")
            .bind(video_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM watch_history WHERE video_id = ?")
            .bind(video_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(video_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Video feed
    // =========================================================================

    /// Published-video feed: visibility filter first, then the optional
    /// text/owner filters, sort, and pagination, all in one statement.
    pub async fn list_videos(&self, feed: &FeedQuery) -> Result<VideoFeedPage, AppError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {FEED_ITEM_COLUMNS} FROM videos v JOIN accounts a ON a.id = v.owner_id"
        ));
        FeedQuery::push_visibility(&mut qb);
        feed.push_filters(&mut qb);
        feed.push_sort(&mut qb);
        feed.push_pagination(&mut qb);

        let rows = qb.build().fetch_all(&self.pool).await?;
        let items = rows
            .iter()
            .map(feed_item_from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        // Matching count query shares the visibility + filter stages
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM videos v");
        FeedQuery::push_visibility(&mut count_qb);
        feed.push_filters(&mut count_qb);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok(VideoFeedPage::new(items, feed.page, feed.per_page, total))
    }

    // =========================================================================
    // Video detail view
    // =========================================================================

    /// Video ⋈ owner ⋈ likes ⋈ subscriptions, relative to `viewer`
    pub async fn video_detail(
        &self,
        viewer: Option<&str>,
        video_id: &str,
    ) -> Result<Option<VideoDetail>, AppError> {
        let row = sqlx::query(
            "SELECT v.id, v.title, v.description, v.video_url, v.thumbnail_url, v.duration, v.views, v.created_at,
                    a.id AS owner_id, a.username AS owner_username, a.full_name AS owner_full_name, a.avatar_url AS owner_avatar_url,
                    (SELECT COUNT(*) FROM likes l WHERE l.target_kind = 'video' AND l.target_id = v.id) AS likes_count,
                    EXISTS(SELECT 1 FROM likes l WHERE l.target_kind = 'video' AND l.target_id = v.id AND l.actor_id = ?1) AS is_liked,
                    (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = a.id) AS subscribers_count,
                    EXISTS(SELECT 1 FROM subscriptions s WHERE s.channel_id = a.id AND s.subscriber_id = ?1) AS is_subscribed
             FROM videos v
             JOIN accounts a ON a.id = v.owner_id
             WHERE v.id = ?2",
        )
        .bind(viewer)
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(VideoDetail {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            video_url: row.try_get("video_url")?,
            thumbnail_url: row.try_get("thumbnail_url")?,
            duration: row.try_get("duration")?,
            views: row.try_get("views")?,
            created_at: row.try_get("created_at")?,
            likes_count: row.try_get("likes_count")?,
            is_liked: row.try_get("is_liked")?,
            owner: ChannelCard {
                id: row.try_get("owner_id")?,
                username: row.try_get("owner_username")?,
                full_name: row.try_get("owner_full_name")?,
                avatar_url: row.try_get("owner_avatar_url")?,
                subscribers_count: row.try_get("subscribers_count")?,
                is_subscribed: row.try_get("is_subscribed")?,
            },
        }))
    }

    // =========================================================================
    // Comments
    // =========================================================================

    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO comments (id, video_id, owner_id, content, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&comment.id)
        .bind(&comment.video_id)
        .bind(&comment.owner_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    pub async fn update_comment_content(&self, id: &str, content: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
            .bind(content)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a comment and its like edges atomically
    pub async fn delete_comment_cascade(&self, comment_id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM likes WHERE target_kind = 'comment' AND target_id = ?")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Comment thread for a video, newest first, with per-comment
    /// engagement relative to `viewer`
    pub async fn video_comments(
        &self,
        viewer: Option<&str>,
        video_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<CommentThreadItem>, i64), AppError> {
        let rows = sqlx::query(
            "SELECT c.id, c.content, c.created_at,
                    a.id AS owner_id, a.username AS owner_username, a.full_name AS owner_full_name, a.avatar_url AS owner_avatar_url,
                    (SELECT COUNT(*) FROM likes l WHERE l.target_kind = 'comment' AND l.target_id = c.id) AS likes_count,
                    EXISTS(SELECT 1 FROM likes l WHERE l.target_kind = 'comment' AND l.target_id = c.id AND l.actor_id = ?1) AS is_liked
             FROM comments c
             JOIN accounts a ON a.id = c.owner_id
             WHERE c.video_id = ?2
             ORDER BY c.created_at DESC
             LIMIT ?3 OFFSET ?4",
        )
        .bind(viewer)
        .bind(video_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(|row| {
                Ok(CommentThreadItem {
                    id: row.try_get("id")?,
                    content: row.try_get("content")?,
                    created_at: row.try_get("created_at")?,
                    likes_count: row.try_get("likes_count")?,
                    is_liked: row.try_get("is_liked")?,
                    owner: owner_from_row(row)?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE video_id = ?")
            .bind(video_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((items, total))
    }

    // =========================================================================
    // Tweets
    // =========================================================================

    pub async fn insert_tweet(&self, tweet: &Tweet) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO tweets (id, owner_id, content, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&tweet.id)
        .bind(&tweet.owner_id)
        .bind(&tweet.content)
        .bind(tweet.created_at)
        .bind(tweet.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_tweet(&self, id: &str) -> Result<Option<Tweet>, AppError> {
        let tweet = sqlx::query_as::<_, Tweet>("SELECT * FROM tweets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tweet)
    }

    pub async fn update_tweet_content(&self, id: &str, content: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE tweets SET content = ?, updated_at = ? WHERE id = ?")
            .bind(content)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a tweet and its like edges atomically
    pub async fn delete_tweet_cascade(&self, tweet_id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM likes WHERE target_kind = 'tweet' AND target_id = ?")
            .bind(tweet_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM tweets WHERE id = ?")
            .bind(tweet_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// A user's tweets with engagement, newest first
    pub async fn list_user_tweets(
        &self,
        viewer: Option<&str>,
        user_id: &str,
    ) -> Result<Vec<TweetItem>, AppError> {
        let rows = sqlx::query(
            "SELECT t.id, t.content, t.created_at,
                    a.id AS owner_id, a.username AS owner_username, a.full_name AS owner_full_name, a.avatar_url AS owner_avatar_url,
                    (SELECT COUNT(*) FROM likes l WHERE l.target_kind = 'tweet' AND l.target_id = t.id) AS likes_count,
                    EXISTS(SELECT 1 FROM likes l WHERE l.target_kind = 'tweet' AND l.target_id = t.id AND l.actor_id = ?1) AS is_liked
             FROM tweets t
             JOIN accounts a ON a.id = t.owner_id
             WHERE t.owner_id = ?2
             ORDER BY t.created_at DESC",
        )
        .bind(viewer)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(TweetItem {
                    id: row.try_get("id")?,
                    content: row.try_get("content")?,
                    created_at: row.try_get("created_at")?,
                    likes_count: row.try_get("likes_count")?,
                    is_liked: row.try_get("is_liked")?,
                    owner: owner_from_row(row)?,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(AppError::Database)
    }

    // =========================================================================
    // Like edges
    // =========================================================================

    /// Insert a like edge unless one already exists.
    ///
    /// Returns true if this call created the edge. The UNIQUE index decides
    /// the winner under concurrent inserts; the loser gets false, never a
    /// duplicate.
    pub async fn try_insert_like(
        &self,
        actor_id: &str,
        target: LikeTarget,
        target_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO likes (id, actor_id, target_kind, target_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(EntityId::new().0)
        .bind(actor_id)
        .bind(target.as_str())
        .bind(target_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Delete a like edge. Returns true if an edge was removed; a losing
    /// concurrent delete affects zero rows and is reported as false.
    pub async fn delete_like(
        &self,
        actor_id: &str,
        target: LikeTarget,
        target_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM likes WHERE actor_id = ? AND target_kind = ? AND target_id = ?",
        )
        .bind(actor_id)
        .bind(target.as_str())
        .bind(target_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_likes(&self, target: LikeTarget, target_id: &str) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE target_kind = ? AND target_id = ?")
                .bind(target.as_str())
                .bind(target_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Videos the actor has liked, most recent like first
    pub async fn liked_videos(&self, actor_id: &str) -> Result<Vec<LikedVideoItem>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT l.created_at AS liked_at, {FEED_ITEM_COLUMNS}
             FROM likes l
             JOIN videos v ON v.id = l.target_id
             JOIN accounts a ON a.id = v.owner_id
             WHERE l.actor_id = ? AND l.target_kind = 'video'
             ORDER BY l.created_at DESC"
        ))
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(LikedVideoItem {
                    liked_at: row.try_get("liked_at")?,
                    video: feed_item_from_row(row)?,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(AppError::Database)
    }

    // =========================================================================
    // Subscription edges
    // =========================================================================

    /// Insert a subscription edge unless one already exists.
    /// Same winner-takes-the-constraint contract as [`Self::try_insert_like`].
    pub async fn try_insert_subscription(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO subscriptions (id, subscriber_id, channel_id, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(EntityId::new().0)
        .bind(subscriber_id)
        .bind(channel_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_subscription(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?")
                .bind(subscriber_id)
                .bind(channel_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_subscribers(&self, channel_id: &str) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?")
                .bind(channel_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Subscribers of a channel with the mutual-subscription flag:
    /// for each subscriber, does the channel subscribe back to them.
    pub async fn channel_subscribers(
        &self,
        channel_id: &str,
    ) -> Result<Vec<SubscriberEntry>, AppError> {
        let rows = sqlx::query(
            "SELECT a.id, a.username, a.full_name, a.avatar_url,
                    EXISTS(SELECT 1 FROM subscriptions s2 WHERE s2.subscriber_id = ?1 AND s2.channel_id = a.id) AS subscribed_to_subscriber,
                    (SELECT COUNT(*) FROM subscriptions s3 WHERE s3.channel_id = a.id) AS subscribers_count
             FROM subscriptions s
             JOIN accounts a ON a.id = s.subscriber_id
             WHERE s.channel_id = ?1
             ORDER BY s.created_at DESC",
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(SubscriberEntry {
                    id: row.try_get("id")?,
                    username: row.try_get("username")?,
                    full_name: row.try_get("full_name")?,
                    avatar_url: row.try_get("avatar_url")?,
                    subscribed_to_subscriber: row.try_get("subscribed_to_subscriber")?,
                    subscribers_count: row.try_get("subscribers_count")?,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(AppError::Database)
    }

    /// Channels a user subscribes to, each with its latest upload
    pub async fn subscribed_channels(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<SubscribedChannelEntry>, AppError> {
        let rows = sqlx::query(
            "SELECT a.id, a.username, a.full_name, a.avatar_url,
                    v.id AS latest_id, v.title AS latest_title, v.thumbnail_url AS latest_thumbnail_url,
                    v.duration AS latest_duration, v.views AS latest_views, v.created_at AS latest_created_at
             FROM subscriptions s
             JOIN accounts a ON a.id = s.channel_id
             LEFT JOIN videos v ON v.id = (
                 SELECT id FROM videos
                 WHERE owner_id = a.id AND is_published = 1
                 ORDER BY created_at DESC LIMIT 1
             )
             WHERE s.subscriber_id = ?
             ORDER BY s.created_at DESC",
        )
        .bind(subscriber_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let latest_id: Option<String> = row.try_get("latest_id")?;
                let latest_video = match latest_id {
                    Some(id) => Some(LatestVideo {
                        id,
                        title: row.try_get("latest_title")?,
                        thumbnail_url: row.try_get("latest_thumbnail_url")?,
                        duration: row.try_get("latest_duration")?,
                        views: row.try_get("latest_views")?,
                        created_at: row.try_get("latest_created_at")?,
                    }),
                    None => None,
                };
                Ok(SubscribedChannelEntry {
                    id: row.try_get("id")?,
                    username: row.try_get("username")?,
                    full_name: row.try_get("full_name")?,
                    avatar_url: row.try_get("avatar_url")?,
                    latest_video,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(AppError::Database)
    }

    // =========================================================================
    // Channel profile and dashboard
    // =========================================================================

    pub async fn channel_profile(
        &self,
        viewer: Option<&str>,
        username: &str,
    ) -> Result<Option<ChannelProfile>, AppError> {
        let row = sqlx::query(
            "SELECT a.id, a.username, a.full_name, a.avatar_url, a.cover_image_url, a.created_at,
                    (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = a.id) AS subscribers_count,
                    (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = a.id) AS channels_subscribed_to_count,
                    EXISTS(SELECT 1 FROM subscriptions s WHERE s.channel_id = a.id AND s.subscriber_id = ?1) AS is_subscribed
             FROM accounts a
             WHERE a.username = ?2",
        )
        .bind(viewer)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(ChannelProfile {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            full_name: row.try_get("full_name")?,
            avatar_url: row.try_get("avatar_url")?,
            cover_image_url: row.try_get("cover_image_url")?,
            subscribers_count: row.try_get("subscribers_count")?,
            channels_subscribed_to_count: row.try_get("channels_subscribed_to_count")?,
            is_subscribed: row.try_get("is_subscribed")?,
            created_at: row.try_get("created_at")?,
        }))
    }

    /// Dashboard aggregates, recomputed from the edge and video sets on
    /// every read
    pub async fn channel_stats(&self, channel_id: &str) -> Result<ChannelStats, AppError> {
        let row = sqlx::query(
            "SELECT
                (SELECT COUNT(*) FROM videos v WHERE v.owner_id = ?1) AS total_videos,
                (SELECT COALESCE(SUM(v.views), 0) FROM videos v WHERE v.owner_id = ?1) AS total_views,
                (SELECT COUNT(*) FROM likes l JOIN videos v ON v.id = l.target_id
                 WHERE l.target_kind = 'video' AND v.owner_id = ?1) AS total_likes,
                (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = ?1) AS total_subscribers",
        )
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ChannelStats {
            total_videos: row.try_get("total_videos")?,
            total_views: row.try_get("total_views")?,
            total_likes: row.try_get("total_likes")?,
            total_subscribers: row.try_get("total_subscribers")?,
        })
    }

    /// All of the channel's own videos (drafts included), newest first
    pub async fn channel_videos(&self, channel_id: &str) -> Result<Vec<ChannelVideoItem>, AppError> {
        let rows = sqlx::query(
            "SELECT v.id, v.title, v.description, v.thumbnail_url, v.duration, v.views, v.is_published, v.created_at,
                    (SELECT COUNT(*) FROM likes l WHERE l.target_kind = 'video' AND l.target_id = v.id) AS likes_count
             FROM videos v
             WHERE v.owner_id = ?
             ORDER BY v.created_at DESC",
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ChannelVideoItem {
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    description: row.try_get("description")?,
                    thumbnail_url: row.try_get("thumbnail_url")?,
                    duration: row.try_get("duration")?,
                    views: row.try_get("views")?,
                    is_published: row.try_get("is_published")?,
                    likes_count: row.try_get("likes_count")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(AppError::Database)
    }

    // =========================================================================
    // Playlists
    // =========================================================================

    pub async fn insert_playlist(&self, playlist: &Playlist) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO playlists (id, owner_id, name, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&playlist.id)
        .bind(&playlist.owner_id)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(playlist.created_at)
        .bind(playlist.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_playlist(&self, id: &str) -> Result<Option<Playlist>, AppError> {
        let playlist = sqlx::query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(playlist)
    }

    pub async fn list_playlists_by_owner(&self, owner_id: &str) -> Result<Vec<Playlist>, AppError> {
        let playlists = sqlx::query_as::<_, Playlist>(
            "SELECT * FROM playlists WHERE owner_id = ? ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(playlists)
    }

    pub async fn update_playlist(&self, playlist: &Playlist) -> Result<(), AppError> {
        sqlx::query("UPDATE playlists SET name = ?, description = ?, updated_at = ? WHERE id = ?")
            .bind(&playlist.name)
            .bind(&playlist.description)
            .bind(Utc::now())
            .bind(&playlist.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_playlist(&self, playlist_id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = ?")
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM playlists WHERE id = ?")
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Set-semantics append at the tail of the playlist order
    pub async fn add_video_to_playlist(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO playlist_videos (playlist_id, video_id, position, added_at)
             VALUES (?1, ?2,
                     COALESCE((SELECT MAX(position) + 1 FROM playlist_videos WHERE playlist_id = ?1), 0),
                     ?3)",
        )
        .bind(playlist_id)
        .bind(video_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

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
        Ok(result.rows_affected() > 0)
    }

    /// Playlist with its videos resolved in playlist order
    pub async fn playlist_detail(&self, playlist_id: &str) -> Result<Option<PlaylistDetail>, AppError> {
        let Some(playlist) = self.get_playlist(playlist_id).await? else {
            return Ok(None);
        };

        let rows = sqlx::query(&format!(
            "SELECT {FEED_ITEM_COLUMNS}
             FROM playlist_videos pv
             JOIN videos v ON v.id = pv.video_id
             JOIN accounts a ON a.id = v.owner_id
             WHERE pv.playlist_id = ?
             ORDER BY pv.position ASC"
        ))
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;

        let videos = rows
            .iter()
            .map(feed_item_from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(Some(PlaylistDetail {
            id: playlist.id,
            owner_id: playlist.owner_id,
            name: playlist.name,
            description: playlist.description,
            created_at: playlist.created_at,
            videos,
        }))
    }
}

/// Shared column list for queries that produce a [`VideoFeedItem`]
const FEED_ITEM_COLUMNS: &str = "v.id AS video_id, v.title AS video_title, v.description AS video_description, \
     v.thumbnail_url AS video_thumbnail_url, v.duration AS video_duration, v.views AS video_views, \
     v.created_at AS video_created_at, \
     a.id AS owner_id, a.username AS owner_username, a.full_name AS owner_full_name, a.avatar_url AS owner_avatar_url";

fn feed_item_from_row(row: &SqliteRow) -> Result<VideoFeedItem, sqlx::Error> {
    Ok(VideoFeedItem {
        id: row.try_get("video_id")?,
        title: row.try_get("video_title")?,
        description: row.try_get("video_description")?,
        thumbnail_url: row.try_get("video_thumbnail_url")?,
        duration: row.try_get("video_duration")?,
        views: row.try_get("video_views")?,
        created_at: row.try_get("video_created_at")?,
        owner: owner_from_row(row)?,
    })
}

fn owner_from_row(row: &SqliteRow) -> Result<OwnerDetails, sqlx::Error> {
    Ok(OwnerDetails {
        id: row.try_get("owner_id")?,
        username: row.try_get("owner_username")?,
        full_name: row.try_get("owner_full_name")?,
        avatar_url: row.try_get("owner_avatar_url")?,
    })
}
