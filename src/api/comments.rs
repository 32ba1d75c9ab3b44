//! Comment endpoints

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::envelope::ApiResponse;
use super::videos::FeedParams;
use crate::auth::{ensure_owner, CurrentUser, MaybeUser};
use crate::data::{Comment, EntityId};
use crate::error::AppError;
use crate::AppState;

pub fn comments_router() -> Router<AppState> {
    Router::new()
        .route("/:video_id", get(video_comments).post(add_comment))
        .route(
            "/c/:comment_id",
            axum::routing::patch(update_comment).delete(delete_comment),
        )
}

/// GET /api/v1/comments/:video_id
///
/// Public comment thread, viewer-relative when a session is presented.
async fn video_comments(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(video_id): Path<String>,
    Query(params): Query<FeedParams>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let page = state
        .views
        .video_comments(viewer.viewer_id(), &video_id, &params.normalize())
        .await?;
    Ok(ApiResponse::ok(page, "comment thread"))
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

/// POST /api/v1/comments/:video_id
async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Path(video_id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }
    if state.db.get_video(&video_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let now = Utc::now();
    let comment = Comment {
        id: EntityId::new().0,
        video_id,
        owner_id: account.id,
        content,
        created_at: now,
        updated_at: now,
    };
    state.db.insert_comment(&comment).await?;

    Ok(ApiResponse::created(comment, "comment added"))
}

/// PATCH /api/v1/comments/c/:comment_id
async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Path(comment_id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }

    let comment = state
        .db
        .get_comment(&comment_id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(&account, &comment.owner_id)?;

    state.db.update_comment_content(&comment.id, &content).await?;
    Ok(ApiResponse::ok(json!({ "content": content }), "comment updated"))
}

/// DELETE /api/v1/comments/c/:comment_id
///
/// Removes the comment and its like edges.
async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Path(comment_id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let comment = state
        .db
        .get_comment(&comment_id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(&account, &comment.owner_id)?;

    state.db.delete_comment_cascade(&comment.id).await?;
    Ok(ApiResponse::ok(json!({}), "comment deleted"))
}
