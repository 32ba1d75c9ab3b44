//! Database layer tests
//!
//! Runs against a real temporary SQLite database.

use std::sync::Arc;

use chrono::Utc;

use super::database::Database;
use super::models::*;
use crate::query::FeedQuery;

async fn test_db() -> (Database, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = Database::connect(&dir.path().join("test.db"))
        .await
        .expect("database connects");
    (db, dir)
}

fn make_account(username: &str) -> Account {
    let now = Utc::now();
    Account {
        id: EntityId::new().0,
        username: username.to_string(),
        email: format!("{username}@example.com"),
        full_name: format!("User {username}"),
        password_hash: "$argon2id$fake".to_string(),
        avatar_url: None,
        cover_image_url: None,
        refresh_token: None,
        created_at: now,
        updated_at: now,
    }
}

fn make_video(owner_id: &str, title: &str, published: bool) -> Video {
    let now = Utc::now();
    Video {
        id: EntityId::new().0,
        owner_id: owner_id.to_string(),
        title: title.to_string(),
        description: format!("about {title}"),
        video_url: format!("https://media.test/videos/{title}.mp4"),
        video_key: format!("videos/{title}.mp4"),
        thumbnail_url: format!("https://media.test/thumbnails/{title}.png"),
        thumbnail_key: format!("thumbnails/{title}.png"),
        duration: 42.0,
        views: 0,
        is_published: published,
        created_at: now,
        updated_at: now,
    }
}

fn make_comment(video_id: &str, owner_id: &str, content: &str) -> Comment {
    let now = Utc::now();
    Comment {
        id: EntityId::new().0,
        video_id: video_id.to_string(),
        owner_id: owner_id.to_string(),
        content: content.to_string(),
        created_at: now,
        updated_at: now,
    }
}

// =============================================================================
// Edge toggles
// =============================================================================

#[tokio::test]
async fn like_insert_is_idempotent() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    let bob = make_account("bob");
    db.insert_account(&alice).await.unwrap();
    db.insert_account(&bob).await.unwrap();
    let video = make_video(&bob.id, "ferris", true);
    db.insert_video(&video).await.unwrap();

    let first = db
        .try_insert_like(&alice.id, LikeTarget::Video, &video.id)
        .await
        .unwrap();
    let second = db
        .try_insert_like(&alice.id, LikeTarget::Video, &video.id)
        .await
        .unwrap();

    assert!(first);
    assert!(!second);
    assert_eq!(db.count_likes(LikeTarget::Video, &video.id).await.unwrap(), 1);
}

#[tokio::test]
async fn like_delete_reports_whether_edge_existed() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    db.insert_account(&alice).await.unwrap();
    let video = make_video(&alice.id, "self", true);
    db.insert_video(&video).await.unwrap();

    db.try_insert_like(&alice.id, LikeTarget::Video, &video.id)
        .await
        .unwrap();

    assert!(db
        .delete_like(&alice.id, LikeTarget::Video, &video.id)
        .await
        .unwrap());
    // Second delete finds nothing, still succeeds
    assert!(!db
        .delete_like(&alice.id, LikeTarget::Video, &video.id)
        .await
        .unwrap());
}

#[tokio::test]
async fn concurrent_like_inserts_produce_one_edge() {
    let (db, _dir) = test_db().await;
    let db = Arc::new(db);
    let alice = make_account("alice");
    db.insert_account(&alice).await.unwrap();
    let video = make_video(&alice.id, "race", true);
    db.insert_video(&video).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let db = Arc::clone(&db);
            let actor = alice.id.clone();
            let target = video.id.clone();
            tokio::spawn(async move {
                db.try_insert_like(&actor, LikeTarget::Video, &target).await
            })
        })
        .collect();

    let results = futures::future::join_all(handles).await;
    let inserted = results
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .filter(|created| *created)
        .count();

    assert_eq!(inserted, 1);
    assert_eq!(db.count_likes(LikeTarget::Video, &video.id).await.unwrap(), 1);
}

#[tokio::test]
async fn subscription_insert_is_idempotent() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    let bob = make_account("bob");
    db.insert_account(&alice).await.unwrap();
    db.insert_account(&bob).await.unwrap();

    assert!(db.try_insert_subscription(&alice.id, &bob.id).await.unwrap());
    assert!(!db.try_insert_subscription(&alice.id, &bob.id).await.unwrap());
    assert_eq!(db.count_subscribers(&bob.id).await.unwrap(), 1);

    assert!(db.delete_subscription(&alice.id, &bob.id).await.unwrap());
    assert!(!db.delete_subscription(&alice.id, &bob.id).await.unwrap());
    assert_eq!(db.count_subscribers(&bob.id).await.unwrap(), 0);
}

// =============================================================================
// Feed
// =============================================================================

#[tokio::test]
async fn feed_excludes_unpublished_videos() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    db.insert_account(&alice).await.unwrap();
    db.insert_video(&make_video(&alice.id, "public clip", true))
        .await
        .unwrap();
    db.insert_video(&make_video(&alice.id, "secret draft", false))
        .await
        .unwrap();

    let page = db.list_videos(&FeedQuery::default()).await.unwrap();
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].title, "public clip");

    // Even a direct text match cannot surface a draft
    let q = FeedQuery::from_raw(Some("secret"), None, None, None, None, None);
    let page = db.list_videos(&q).await.unwrap();
    assert_eq!(page.total_items, 0);
}

#[tokio::test]
async fn feed_filters_by_text_and_owner() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    let bob = make_account("bob");
    db.insert_account(&alice).await.unwrap();
    db.insert_account(&bob).await.unwrap();
    db.insert_video(&make_video(&alice.id, "rust tutorial", true))
        .await
        .unwrap();
    db.insert_video(&make_video(&alice.id, "cooking show", true))
        .await
        .unwrap();
    db.insert_video(&make_video(&bob.id, "rust streams", true))
        .await
        .unwrap();

    let q = FeedQuery::from_raw(Some("rust"), None, None, None, None, None);
    assert_eq!(db.list_videos(&q).await.unwrap().total_items, 2);

    let q = FeedQuery::from_raw(Some("rust"), Some(&alice.id), None, None, None, None);
    let page = db.list_videos(&q).await.unwrap();
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].owner.username, "alice");
}

#[tokio::test]
async fn feed_paginates_with_total_counts() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    db.insert_account(&alice).await.unwrap();
    for i in 0..5 {
        db.insert_video(&make_video(&alice.id, &format!("clip{i}"), true))
            .await
            .unwrap();
    }

    let q = FeedQuery::from_raw(None, None, None, None, Some("2"), Some("2"));
    let page = db.list_videos(&q).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.page, 2);
    assert_eq!(page.total_items, 5);
    assert_eq!(page.total_pages, 3);
}

#[tokio::test]
async fn feed_sorts_by_views() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    db.insert_account(&alice).await.unwrap();
    let a = make_video(&alice.id, "quiet", true);
    let b = make_video(&alice.id, "popular", true);
    db.insert_video(&a).await.unwrap();
    db.insert_video(&b).await.unwrap();
    for _ in 0..3 {
        db.increment_views(&b.id).await.unwrap();
    }

    let q = FeedQuery::from_raw(None, None, Some("views"), Some("desc"), None, None);
    let page = db.list_videos(&q).await.unwrap();
    assert_eq!(page.items[0].title, "popular");
    assert_eq!(page.items[0].views, 3);
}

// =============================================================================
// Composed views
// =============================================================================

#[tokio::test]
async fn video_detail_is_viewer_relative() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    let bob = make_account("bob");
    db.insert_account(&alice).await.unwrap();
    db.insert_account(&bob).await.unwrap();
    let video = make_video(&bob.id, "flags", true);
    db.insert_video(&video).await.unwrap();

    db.try_insert_like(&alice.id, LikeTarget::Video, &video.id)
        .await
        .unwrap();
    db.try_insert_subscription(&alice.id, &bob.id).await.unwrap();

    // Anonymous: counts visible, flags always false
    let detail = db.video_detail(None, &video.id).await.unwrap().unwrap();
    assert_eq!(detail.likes_count, 1);
    assert!(!detail.is_liked);
    assert_eq!(detail.owner.subscribers_count, 1);
    assert!(!detail.owner.is_subscribed);

    // The liker sees their own edges
    let detail = db
        .video_detail(Some(&alice.id), &video.id)
        .await
        .unwrap()
        .unwrap();
    assert!(detail.is_liked);
    assert!(detail.owner.is_subscribed);

    // A third party sees the counts but no flags
    let carol = make_account("carol");
    db.insert_account(&carol).await.unwrap();
    let detail = db
        .video_detail(Some(&carol.id), &video.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.likes_count, 1);
    assert!(!detail.is_liked);
    assert!(!detail.owner.is_subscribed);
}

#[tokio::test]
async fn comment_thread_carries_engagement() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    let bob = make_account("bob");
    db.insert_account(&alice).await.unwrap();
    db.insert_account(&bob).await.unwrap();
    let video = make_video(&alice.id, "threaded", true);
    db.insert_video(&video).await.unwrap();

    let comment = make_comment(&video.id, &bob.id, "first!");
    db.insert_comment(&comment).await.unwrap();
    db.try_insert_like(&alice.id, LikeTarget::Comment, &comment.id)
        .await
        .unwrap();

    let (items, total) = db
        .video_comments(Some(&alice.id), &video.id, 10, 0)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].likes_count, 1);
    assert!(items[0].is_liked);
    assert_eq!(items[0].owner.username, "bob");

    let (items, _) = db.video_comments(None, &video.id, 10, 0).await.unwrap();
    assert!(!items[0].is_liked);
}

#[tokio::test]
async fn channel_profile_counts_both_directions() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    let bob = make_account("bob");
    let carol = make_account("carol");
    db.insert_account(&alice).await.unwrap();
    db.insert_account(&bob).await.unwrap();
    db.insert_account(&carol).await.unwrap();

    db.try_insert_subscription(&bob.id, &alice.id).await.unwrap();
    db.try_insert_subscription(&carol.id, &alice.id).await.unwrap();
    db.try_insert_subscription(&alice.id, &bob.id).await.unwrap();

    let profile = db
        .channel_profile(Some(&bob.id), "alice")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.subscribers_count, 2);
    assert_eq!(profile.channels_subscribed_to_count, 1);
    assert!(profile.is_subscribed);

    let profile = db.channel_profile(None, "alice").await.unwrap().unwrap();
    assert!(!profile.is_subscribed);

    assert!(db.channel_profile(None, "nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn subscriber_list_has_mutual_flag() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    let bob = make_account("bob");
    let carol = make_account("carol");
    db.insert_account(&alice).await.unwrap();
    db.insert_account(&bob).await.unwrap();
    db.insert_account(&carol).await.unwrap();

    db.try_insert_subscription(&bob.id, &alice.id).await.unwrap();
    db.try_insert_subscription(&carol.id, &alice.id).await.unwrap();
    // Alice subscribes back to bob only
    db.try_insert_subscription(&alice.id, &bob.id).await.unwrap();

    let subscribers = db.channel_subscribers(&alice.id).await.unwrap();
    assert_eq!(subscribers.len(), 2);
    let bob_entry = subscribers.iter().find(|s| s.username == "bob").unwrap();
    let carol_entry = subscribers.iter().find(|s| s.username == "carol").unwrap();
    assert!(bob_entry.subscribed_to_subscriber);
    assert!(!carol_entry.subscribed_to_subscriber);
}

#[tokio::test]
async fn subscribed_channels_surface_latest_published_upload() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    let bob = make_account("bob");
    let carol = make_account("carol");
    db.insert_account(&alice).await.unwrap();
    db.insert_account(&bob).await.unwrap();
    db.insert_account(&carol).await.unwrap();

    db.try_insert_subscription(&alice.id, &bob.id).await.unwrap();
    db.try_insert_subscription(&alice.id, &carol.id).await.unwrap();

    let mut old = make_video(&bob.id, "old", true);
    old.created_at = old.created_at - chrono::Duration::hours(2);
    db.insert_video(&old).await.unwrap();
    db.insert_video(&make_video(&bob.id, "new", true)).await.unwrap();
    // Drafts never show up as the latest upload
    db.insert_video(&make_video(&carol.id, "draft", false))
        .await
        .unwrap();

    let channels = db.subscribed_channels(&alice.id).await.unwrap();
    assert_eq!(channels.len(), 2);
    let bob_entry = channels.iter().find(|c| c.username == "bob").unwrap();
    let carol_entry = channels.iter().find(|c| c.username == "carol").unwrap();
    assert_eq!(bob_entry.latest_video.as_ref().unwrap().title, "new");
    assert!(carol_entry.latest_video.is_none());
}

#[tokio::test]
async fn channel_stats_aggregate_over_videos() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    let bob = make_account("bob");
    db.insert_account(&alice).await.unwrap();
    db.insert_account(&bob).await.unwrap();

    let a = make_video(&alice.id, "one", true);
    let b = make_video(&alice.id, "two", false);
    db.insert_video(&a).await.unwrap();
    db.insert_video(&b).await.unwrap();
    db.increment_views(&a.id).await.unwrap();
    db.increment_views(&a.id).await.unwrap();
    db.try_insert_like(&bob.id, LikeTarget::Video, &a.id).await.unwrap();
    db.try_insert_subscription(&bob.id, &alice.id).await.unwrap();

    let stats = db.channel_stats(&alice.id).await.unwrap();
    assert_eq!(stats.total_videos, 2);
    assert_eq!(stats.total_views, 2);
    assert_eq!(stats.total_likes, 1);
    assert_eq!(stats.total_subscribers, 1);

    // Empty channel aggregates to zeros, not NULLs
    let stats = db.channel_stats(&bob.id).await.unwrap();
    assert_eq!(stats.total_videos, 0);
    assert_eq!(stats.total_views, 0);
}

#[tokio::test]
async fn liked_videos_newest_like_first() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    let bob = make_account("bob");
    db.insert_account(&alice).await.unwrap();
    db.insert_account(&bob).await.unwrap();
    let a = make_video(&bob.id, "first", true);
    let b = make_video(&bob.id, "second", true);
    db.insert_video(&a).await.unwrap();
    db.insert_video(&b).await.unwrap();

    db.try_insert_like(&alice.id, LikeTarget::Video, &a.id).await.unwrap();
    db.try_insert_like(&alice.id, LikeTarget::Video, &b.id).await.unwrap();
    // Comment likes must not leak into the liked-videos list
    let comment = make_comment(&a.id, &alice.id, "nice");
    db.insert_comment(&comment).await.unwrap();
    db.try_insert_like(&alice.id, LikeTarget::Comment, &comment.id)
        .await
        .unwrap();

    let liked = db.liked_videos(&alice.id).await.unwrap();
    assert_eq!(liked.len(), 2);
    assert_eq!(liked[0].video.title, "second");
}

// =============================================================================
// Watch history
// =============================================================================

#[tokio::test]
async fn watch_history_keeps_first_watch_slot() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    db.insert_account(&alice).await.unwrap();
    let a = make_video(&alice.id, "one", true);
    let b = make_video(&alice.id, "two", true);
    db.insert_video(&a).await.unwrap();
    db.insert_video(&b).await.unwrap();

    db.append_watch_history(&alice.id, &a.id).await.unwrap();
    db.append_watch_history(&alice.id, &b.id).await.unwrap();
    // Rewatching does not duplicate or reorder
    db.append_watch_history(&alice.id, &a.id).await.unwrap();

    let history = db.watch_history(&alice.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].video.title, "two");
    assert_eq!(history[1].video.title, "one");
}

// =============================================================================
// Cascades
// =============================================================================

#[tokio::test]
async fn video_delete_cascades_to_all_references() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    let bob = make_account("bob");
    db.insert_account(&alice).await.unwrap();
    db.insert_account(&bob).await.unwrap();
    let video = make_video(&alice.id, "doomed", true);
    db.insert_video(&video).await.unwrap();

    let comment = make_comment(&video.id, &bob.id, "rip");
    db.insert_comment(&comment).await.unwrap();
    db.try_insert_like(&bob.id, LikeTarget::Video, &video.id).await.unwrap();
    db.try_insert_like(&alice.id, LikeTarget::Comment, &comment.id)
        .await
        .unwrap();
    db.append_watch_history(&bob.id, &video.id).await.unwrap();

    let playlist = Playlist {
        id: EntityId::new().0,
        owner_id: bob.id.clone(),
        name: "faves".to_string(),
        description: String::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    db.insert_playlist(&playlist).await.unwrap();
    db.add_video_to_playlist(&playlist.id, &video.id).await.unwrap();

    db.delete_video_cascade(&video.id).await.unwrap();

    assert!(db.get_video(&video.id).await.unwrap().is_none());
    assert!(db.get_comment(&comment.id).await.unwrap().is_none());
    assert_eq!(db.count_likes(LikeTarget::Video, &video.id).await.unwrap(), 0);
    assert_eq!(
        db.count_likes(LikeTarget::Comment, &comment.id).await.unwrap(),
        0
    );
    assert!(db.watch_history(&bob.id).await.unwrap().is_empty());
    let detail = db.playlist_detail(&playlist.id).await.unwrap().unwrap();
    assert!(detail.videos.is_empty());
}

#[tokio::test]
async fn comment_delete_removes_its_likes() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    db.insert_account(&alice).await.unwrap();
    let video = make_video(&alice.id, "host", true);
    db.insert_video(&video).await.unwrap();
    let comment = make_comment(&video.id, &alice.id, "bye");
    db.insert_comment(&comment).await.unwrap();
    db.try_insert_like(&alice.id, LikeTarget::Comment, &comment.id)
        .await
        .unwrap();

    db.delete_comment_cascade(&comment.id).await.unwrap();

    assert!(db.get_comment(&comment.id).await.unwrap().is_none());
    assert_eq!(
        db.count_likes(LikeTarget::Comment, &comment.id).await.unwrap(),
        0
    );
}

// =============================================================================
// Playlists
// =============================================================================

#[tokio::test]
async fn playlist_keeps_insertion_order_and_dedups() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    db.insert_account(&alice).await.unwrap();
    let a = make_video(&alice.id, "one", true);
    let b = make_video(&alice.id, "two", true);
    db.insert_video(&a).await.unwrap();
    db.insert_video(&b).await.unwrap();

    let playlist = Playlist {
        id: EntityId::new().0,
        owner_id: alice.id.clone(),
        name: "mix".to_string(),
        description: "assorted".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    db.insert_playlist(&playlist).await.unwrap();

    assert!(db.add_video_to_playlist(&playlist.id, &a.id).await.unwrap());
    assert!(db.add_video_to_playlist(&playlist.id, &b.id).await.unwrap());
    assert!(!db.add_video_to_playlist(&playlist.id, &a.id).await.unwrap());

    let detail = db.playlist_detail(&playlist.id).await.unwrap().unwrap();
    assert_eq!(detail.videos.len(), 2);
    assert_eq!(detail.videos[0].title, "one");
    assert_eq!(detail.videos[1].title, "two");

    assert!(db.remove_video_from_playlist(&playlist.id, &a.id).await.unwrap());
    assert!(!db.remove_video_from_playlist(&playlist.id, &a.id).await.unwrap());
}

// =============================================================================
// Accounts
// =============================================================================

#[tokio::test]
async fn duplicate_username_is_rejected_by_schema() {
    let (db, _dir) = test_db().await;
    db.insert_account(&make_account("alice")).await.unwrap();

    let err = db.insert_account(&make_account("alice")).await.unwrap_err();
    assert!(err
        .as_database_error()
        .is_some_and(|e| e.is_unique_violation()));
}

#[tokio::test]
async fn identifier_lookup_ignores_username_case() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    db.insert_account(&alice).await.unwrap();

    let found = db.get_account_by_identifier("Alice").await.unwrap();
    assert_eq!(found.map(|a| a.id), Some(alice.id.clone()));

    let found = db
        .get_account_by_identifier("alice@example.com")
        .await
        .unwrap();
    assert_eq!(found.map(|a| a.id), Some(alice.id));
}

#[tokio::test]
async fn refresh_token_round_trip() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    db.insert_account(&alice).await.unwrap();

    db.set_refresh_token(&alice.id, Some("token-1")).await.unwrap();
    let loaded = db.get_account_by_id(&alice.id).await.unwrap().unwrap();
    assert_eq!(loaded.refresh_token.as_deref(), Some("token-1"));

    db.set_refresh_token(&alice.id, None).await.unwrap();
    let loaded = db.get_account_by_id(&alice.id).await.unwrap().unwrap();
    assert!(loaded.refresh_token.is_none());
}

// =============================================================================
// Tweets
// =============================================================================

#[tokio::test]
async fn tweet_list_carries_engagement() {
    let (db, _dir) = test_db().await;
    let alice = make_account("alice");
    let bob = make_account("bob");
    db.insert_account(&alice).await.unwrap();
    db.insert_account(&bob).await.unwrap();

    let tweet = Tweet {
        id: EntityId::new().0,
        owner_id: alice.id.clone(),
        content: "hello".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    db.insert_tweet(&tweet).await.unwrap();
    db.try_insert_like(&bob.id, LikeTarget::Tweet, &tweet.id).await.unwrap();

    let tweets = db.list_user_tweets(Some(&bob.id), &alice.id).await.unwrap();
    assert_eq!(tweets.len(), 1);
    assert_eq!(tweets[0].likes_count, 1);
    assert!(tweets[0].is_liked);

    let tweets = db.list_user_tweets(None, &alice.id).await.unwrap();
    assert!(!tweets[0].is_liked);
}
