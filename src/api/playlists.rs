//! Playlist endpoints

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::envelope::ApiResponse;
use crate::auth::{ensure_owner, CurrentUser};
use crate::data::{EntityId, Playlist};
use crate::error::AppError;
use crate::AppState;

pub fn playlists_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_playlist))
        .route(
            "/:playlist_id",
            get(playlist_detail)
                .patch(update_playlist)
                .delete(delete_playlist),
        )
        .route("/user/:user_id", get(user_playlists))
        .route("/add/:video_id/:playlist_id", patch(add_video))
        .route("/remove/:video_id/:playlist_id", patch(remove_video))
}

#[derive(Debug, Deserialize)]
pub struct PlaylistRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// POST /api/v1/playlists
async fn create_playlist(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Json(req): Json<PlaylistRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let now = Utc::now();
    let playlist = Playlist {
        id: EntityId::new().0,
        owner_id: account.id,
        name,
        description: req.description.trim().to_string(),
        created_at: now,
        updated_at: now,
    };
    state.db.insert_playlist(&playlist).await?;

    Ok(ApiResponse::created(playlist, "playlist created"))
}

/// GET /api/v1/playlists/:playlist_id
async fn playlist_detail(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let detail = state.views.playlist_detail(&playlist_id).await?;
    Ok(ApiResponse::ok(detail, "playlist detail"))
}

/// GET /api/v1/playlists/user/:user_id
async fn user_playlists(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let playlists = state.db.list_playlists_by_owner(&user_id).await?;
    Ok(ApiResponse::ok(playlists, "user playlists"))
}

/// PATCH /api/v1/playlists/:playlist_id
async fn update_playlist(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Path(playlist_id): Path<String>,
    Json(req): Json<PlaylistRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let mut playlist = state
        .db
        .get_playlist(&playlist_id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(&account, &playlist.owner_id)?;

    playlist.name = name;
    playlist.description = req.description.trim().to_string();
    state.db.update_playlist(&playlist).await?;

    Ok(ApiResponse::ok(playlist, "playlist updated"))
}

/// DELETE /api/v1/playlists/:playlist_id
async fn delete_playlist(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Path(playlist_id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let playlist = state
        .db
        .get_playlist(&playlist_id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(&account, &playlist.owner_id)?;

    state.db.delete_playlist(&playlist.id).await?;
    Ok(ApiResponse::ok(json!({}), "playlist deleted"))
}

/// PATCH /api/v1/playlists/add/:video_id/:playlist_id
///
/// Adding an already-present video is a no-op.
async fn add_video(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let playlist = state
        .db
        .get_playlist(&playlist_id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(&account, &playlist.owner_id)?;
    if state.db.get_video(&video_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let added = state
        .db
        .add_video_to_playlist(&playlist.id, &video_id)
        .await?;
    Ok(ApiResponse::ok(json!({ "added": added }), "video added"))
}

/// PATCH /api/v1/playlists/remove/:video_id/:playlist_id
async fn remove_video(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let playlist = state
        .db
        .get_playlist(&playlist_id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(&account, &playlist.owner_id)?;

    let removed = state
        .db
        .remove_video_from_playlist(&playlist.id, &video_id)
        .await?;
    Ok(ApiResponse::ok(json!({ "removed": removed }), "video removed"))
}
