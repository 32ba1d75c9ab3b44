//! Tweet endpoints (short channel posts)

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::envelope::ApiResponse;
use crate::auth::{ensure_owner, CurrentUser, MaybeUser};
use crate::data::{EntityId, Tweet};
use crate::error::AppError;
use crate::AppState;

pub fn tweets_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_tweet))
        .route("/user/:user_id", get(user_tweets))
        .route("/:tweet_id", patch(update_tweet).delete(delete_tweet))
}

#[derive(Debug, Deserialize)]
pub struct TweetRequest {
    pub content: String,
}

/// POST /api/v1/tweets
async fn create_tweet(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Json(req): Json<TweetRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }

    let now = Utc::now();
    let tweet = Tweet {
        id: EntityId::new().0,
        owner_id: account.id,
        content,
        created_at: now,
        updated_at: now,
    };
    state.db.insert_tweet(&tweet).await?;

    Ok(ApiResponse::created(tweet, "tweet created"))
}

/// GET /api/v1/tweets/user/:user_id
async fn user_tweets(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(user_id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let tweets = state
        .views
        .user_tweets(viewer.viewer_id(), &user_id)
        .await?;
    Ok(ApiResponse::ok(tweets, "user tweets"))
}

/// PATCH /api/v1/tweets/:tweet_id
async fn update_tweet(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Path(tweet_id): Path<String>,
    Json(req): Json<TweetRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }

    let tweet = state
        .db
        .get_tweet(&tweet_id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(&account, &tweet.owner_id)?;

    state.db.update_tweet_content(&tweet.id, &content).await?;
    Ok(ApiResponse::ok(json!({ "content": content }), "tweet updated"))
}

/// DELETE /api/v1/tweets/:tweet_id
async fn delete_tweet(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Path(tweet_id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let tweet = state
        .db
        .get_tweet(&tweet_id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(&account, &tweet.owner_id)?;

    state.db.delete_tweet_cascade(&tweet.id).await?;
    Ok(ApiResponse::ok(json!({}), "tweet deleted"))
}
