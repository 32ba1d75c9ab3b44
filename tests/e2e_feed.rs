//! E2E tests for the video feed, comments, dashboard and ownership checks

mod common;

use common::{bearer, TestServer};
use serde_json::{json, Value};

#[tokio::test]
async fn feed_hides_drafts_and_paginates() {
    let server = TestServer::new().await;
    let alice = server.create_account("alice").await;
    for i in 0..3 {
        server
            .create_video(&alice.id, &format!("clip{i}"), true)
            .await;
    }
    server.create_video(&alice.id, "draft", false).await;

    let response = server
        .client
        .get(server.url("/api/v1/videos?page=1&limit=2"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["totalItems"], 3);
    assert_eq!(body["data"]["totalPages"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);

    // Junk pagination falls back to defaults instead of erroring
    let response = server
        .client
        .get(server.url("/api/v1/videos?page=banana&limit=-5"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["perPage"], 10);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn feed_text_search_cannot_surface_drafts() {
    let server = TestServer::new().await;
    let alice = server.create_account("alice").await;
    server.create_video(&alice.id, "published rust talk", true).await;
    server.create_video(&alice.id, "secret rust draft", false).await;

    let response = server
        .client
        .get(server.url("/api/v1/videos?query=rust"))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "published rust talk");
}

#[tokio::test]
async fn comment_flow_with_ownership() {
    let server = TestServer::new().await;
    let alice = server.create_account("alice").await;
    let bob = server.create_account("bob").await;
    let video = server.create_video(&alice.id, "discussed", true).await;
    let (alice_token, _) = server.login("alice").await;
    let (bob_token, _) = server.login("bob").await;
    let _ = bob;

    // Bob comments
    let response = server
        .client
        .post(server.url(&format!("/api/v1/comments/{}", video.id)))
        .header("Authorization", bearer(&bob_token))
        .json(&json!({ "content": "great video" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    let comment_id = body["data"]["id"].as_str().unwrap().to_string();

    // Thread is public
    let response = server
        .client
        .get(server.url(&format!("/api/v1/comments/{}", video.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["totalItems"], 1);
    assert_eq!(body["data"]["items"][0]["owner"]["username"], "bob");

    // Alice cannot edit bob's comment
    let response = server
        .client
        .patch(server.url(&format!("/api/v1/comments/c/{comment_id}")))
        .header("Authorization", bearer(&alice_token))
        .json(&json!({ "content": "hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // Bob can delete his own
    let response = server
        .client
        .delete(server.url(&format!("/api/v1/comments/c/{comment_id}")))
        .header("Authorization", bearer(&bob_token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn video_mutations_are_owner_only() {
    let server = TestServer::new().await;
    let alice = server.create_account("alice").await;
    server.create_account("bob").await;
    let video = server.create_video(&alice.id, "guarded", true).await;
    let (bob_token, _) = server.login("bob").await;

    let response = server
        .client
        .patch(server.url(&format!("/api/v1/videos/{}", video.id)))
        .header("Authorization", bearer(&bob_token))
        .json(&json!({ "title": "stolen" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = server
        .client
        .delete(server.url(&format!("/api/v1/videos/{}", video.id)))
        .header("Authorization", bearer(&bob_token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = server
        .client
        .patch(server.url(&format!("/api/v1/videos/{}/toggle-publish", video.id)))
        .header("Authorization", bearer(&bob_token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn toggle_publish_removes_from_feed() {
    let server = TestServer::new().await;
    let alice = server.create_account("alice").await;
    let video = server.create_video(&alice.id, "now you see me", true).await;
    let (access, _) = server.login("alice").await;

    let response = server
        .client
        .patch(server.url(&format!("/api/v1/videos/{}/toggle-publish", video.id)))
        .header("Authorization", bearer(&access))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["isPublished"], false);

    let response = server
        .client
        .get(server.url("/api/v1/videos"))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["totalItems"], 0);
}

#[tokio::test]
async fn dashboard_aggregates_for_owner() {
    let server = TestServer::new().await;
    let alice = server.create_account("alice").await;
    let bob = server.create_account("bob").await;
    let video = server.create_video(&alice.id, "published", true).await;
    server.create_video(&alice.id, "draft", false).await;
    let (alice_token, _) = server.login("alice").await;

    server
        .state
        .db
        .try_insert_like(&bob.id, clipstream::data::LikeTarget::Video, &video.id)
        .await
        .unwrap();
    server
        .state
        .db
        .try_insert_subscription(&bob.id, &alice.id)
        .await
        .unwrap();
    server.state.db.increment_views(&video.id).await.unwrap();

    let response = server
        .client
        .get(server.url("/api/v1/dashboard/stats"))
        .header("Authorization", bearer(&alice_token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["totalVideos"], 2);
    assert_eq!(body["data"]["totalViews"], 1);
    assert_eq!(body["data"]["totalLikes"], 1);
    assert_eq!(body["data"]["totalSubscribers"], 1);

    // Dashboard video list includes drafts
    let response = server
        .client
        .get(server.url("/api/v1/dashboard/videos"))
        .header("Authorization", bearer(&alice_token))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn tweets_and_playlists_round_trip() {
    let server = TestServer::new().await;
    let alice = server.create_account("alice").await;
    let video = server.create_video(&alice.id, "queued", true).await;
    let (access, _) = server.login("alice").await;

    // Tweet
    let response = server
        .client
        .post(server.url("/api/v1/tweets"))
        .header("Authorization", bearer(&access))
        .json(&json!({ "content": "hello world" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let response = server
        .client
        .get(server.url(&format!("/api/v1/tweets/user/{}", alice.id)))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["content"], "hello world");

    // Playlist
    let response = server
        .client
        .post(server.url("/api/v1/playlists"))
        .header("Authorization", bearer(&access))
        .json(&json!({ "name": "favorites", "description": "the good stuff" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    let playlist_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = server
        .client
        .patch(server.url(&format!(
            "/api/v1/playlists/add/{}/{playlist_id}",
            video.id
        )))
        .header("Authorization", bearer(&access))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = server
        .client
        .get(server.url(&format!("/api/v1/playlists/{playlist_id}")))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["videos"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["videos"][0]["title"], "queued");
}
