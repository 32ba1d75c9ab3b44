//! Like toggle endpoints
//!
//! Toggles are idempotent: repeating a call flips the edge back, and a
//! concurrent duplicate is a no-op. The response always reports the
//! edge's final state and recomputed count.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;

use super::envelope::ApiResponse;
use crate::auth::CurrentUser;
use crate::data::LikeTarget;
use crate::error::AppError;
use crate::AppState;

pub fn likes_router() -> Router<AppState> {
    Router::new()
        .route("/toggle/v/:video_id", post(toggle_video_like))
        .route("/toggle/c/:comment_id", post(toggle_comment_like))
        .route("/toggle/t/:tweet_id", post(toggle_tweet_like))
        .route("/videos", get(liked_videos))
}

/// POST /api/v1/likes/toggle/v/:video_id
async fn toggle_video_like(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let outcome = state
        .engagement
        .toggle_like(&account.id, LikeTarget::Video, &video_id)
        .await?;
    Ok(ApiResponse::ok(outcome, "like toggled"))
}

/// POST /api/v1/likes/toggle/c/:comment_id
async fn toggle_comment_like(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Path(comment_id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let outcome = state
        .engagement
        .toggle_like(&account.id, LikeTarget::Comment, &comment_id)
        .await?;
    Ok(ApiResponse::ok(outcome, "like toggled"))
}

/// POST /api/v1/likes/toggle/t/:tweet_id
async fn toggle_tweet_like(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Path(tweet_id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let outcome = state
        .engagement
        .toggle_like(&account.id, LikeTarget::Tweet, &tweet_id)
        .await?;
    Ok(ApiResponse::ok(outcome, "like toggled"))
}

/// GET /api/v1/likes/videos
async fn liked_videos(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let videos = state.views.liked_videos(&account.id).await?;
    Ok(ApiResponse::ok(videos, "liked videos"))
}
