//! Video endpoints: feed, publish, detail, update, delete

use axum::extract::{Multipart, Path, Query, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::envelope::ApiResponse;
use crate::auth::{ensure_owner, CurrentUser, MaybeUser};
use crate::data::{EntityId, Video};
use crate::error::AppError;
use crate::query::FeedQuery;
use crate::storage::MediaKind;
use crate::AppState;

pub fn videos_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_videos).post(publish_video))
        .route(
            "/:video_id",
            get(video_detail).patch(update_video).delete(delete_video),
        )
        .route("/:video_id/toggle-publish", patch(toggle_publish))
}

// =============================================================================
// Feed
// =============================================================================

/// Raw feed parameters; junk values fall back to defaults downstream
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedParams {
    pub query: Option<String>,
    pub user_id: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl FeedParams {
    pub fn normalize(&self) -> FeedQuery {
        FeedQuery::from_raw(
            self.query.as_deref(),
            self.user_id.as_deref(),
            self.sort_by.as_deref(),
            self.sort_type.as_deref(),
            self.page.as_deref(),
            self.limit.as_deref(),
        )
    }
}

/// GET /api/v1/videos
async fn list_videos(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let page = state.views.feed(&params.normalize()).await?;
    Ok(ApiResponse::ok(page, "video feed"))
}

// =============================================================================
// Publish
// =============================================================================

/// POST /api/v1/videos
///
/// Multipart upload: `videoFile` and `thumbnail` files plus `title`,
/// `description` and `duration` (seconds) fields. The video starts
/// published unless `isPublished` says otherwise.
async fn publish_video(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    mut multipart: Multipart,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let mut title = None;
    let mut description = None;
    let mut duration = None;
    let mut is_published = true;
    let mut video_file = None;
    let mut thumbnail_file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("title") => title = Some(read_text(field).await?),
            Some("description") => description = Some(read_text(field).await?),
            Some("duration") => duration = Some(read_text(field).await?),
            Some("isPublished") => {
                is_published = read_text(field).await?.trim() != "false";
            }
            Some("videoFile") => video_file = Some(read_file(field).await?),
            Some("thumbnail") => thumbnail_file = Some(read_file(field).await?),
            _ => {}
        }
    }

    let title = title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("title is required".to_string()))?;
    let description = description.unwrap_or_default().trim().to_string();
    let duration: f64 = duration
        .as_deref()
        .map(str::trim)
        .and_then(|d| d.parse().ok())
        .filter(|d| *d >= 0.0)
        .ok_or_else(|| AppError::Validation("duration must be a non-negative number".to_string()))?;
    let video_file =
        video_file.ok_or_else(|| AppError::Validation("videoFile is required".to_string()))?;
    let thumbnail_file =
        thumbnail_file.ok_or_else(|| AppError::Validation("thumbnail is required".to_string()))?;

    let id = EntityId::new().0;
    let (video_key, video_url) = state
        .storage
        .upload(MediaKind::Video, &id, video_file.0, &video_file.1)
        .await?;
    let (thumbnail_key, thumbnail_url) = state
        .storage
        .upload(MediaKind::Thumbnail, &id, thumbnail_file.0, &thumbnail_file.1)
        .await?;

    let now = Utc::now();
    let video = Video {
        id,
        owner_id: account.id,
        title,
        description,
        video_url,
        video_key,
        thumbnail_url,
        thumbnail_key,
        duration,
        views: 0,
        is_published,
        created_at: now,
        updated_at: now,
    };
    state.db.insert_video(&video).await?;

    tracing::info!(video_id = %video.id, "Video published");
    Ok(ApiResponse::created(video, "video published"))
}

// =============================================================================
// Detail / update / delete
// =============================================================================

/// GET /api/v1/videos/:video_id
///
/// Public, but viewer-relative when a session is presented. Bumps the
/// view counter and, for signed-in viewers, records watch history.
async fn video_detail(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(video_id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let detail = state
        .views
        .video_detail(viewer.viewer_id(), &video_id)
        .await?;
    Ok(ApiResponse::ok(detail, "video detail"))
}

#[derive(Debug, Deserialize)]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// PATCH /api/v1/videos/:video_id
async fn update_video(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Path(video_id): Path<String>,
    Json(req): Json<UpdateVideoRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let mut video = state
        .db
        .get_video(&video_id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(&account, &video.owner_id)?;

    if req.title.is_none() && req.description.is_none() {
        return Err(AppError::Validation("nothing to update".to_string()));
    }
    if let Some(title) = req.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("title cannot be empty".to_string()));
        }
        video.title = title;
    }
    if let Some(description) = req.description {
        video.description = description.trim().to_string();
    }

    state.db.update_video(&video).await?;
    Ok(ApiResponse::ok(video, "video updated"))
}

/// DELETE /api/v1/videos/:video_id
///
/// Cascades through comments, likes, playlist entries and watch history,
/// then deletes the stored media objects best-effort.
async fn delete_video(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let video = state
        .db
        .get_video(&video_id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(&account, &video.owner_id)?;

    state.db.delete_video_cascade(&video.id).await?;

    for key in [&video.video_key, &video.thumbnail_key] {
        if let Err(e) = state.storage.delete(key).await {
            tracing::warn!(%key, error = %e, "Failed to delete media object");
        }
    }

    tracing::info!(video_id = %video.id, "Video deleted");
    Ok(ApiResponse::ok(json!({}), "video deleted"))
}

/// PATCH /api/v1/videos/:video_id/toggle-publish
async fn toggle_publish(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let mut video = state
        .db
        .get_video(&video_id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(&account, &video.owner_id)?;

    video.is_published = !video.is_published;
    state.db.update_video(&video).await?;

    Ok(ApiResponse::ok(
        json!({ "isPublished": video.is_published }),
        "publish state toggled",
    ))
}

// =============================================================================
// Multipart helpers
// =============================================================================

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("failed to read field: {e}")))
}

async fn read_file(
    field: axum::extract::multipart::Field<'_>,
) -> Result<(Vec<u8>, String), AppError> {
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?
        .to_vec();
    Ok((data, content_type))
}
