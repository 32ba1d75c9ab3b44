//! Channel dashboard endpoints
//!
//! Owner-only views over the authenticated account's own channel.

use axum::extract::State;
use axum::routing::get;
use axum::Router;

use super::envelope::ApiResponse;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::AppState;

pub fn dashboard_router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(channel_stats))
        .route("/videos", get(channel_videos))
}

/// GET /api/v1/dashboard/stats
///
/// Totals are recomputed from the underlying sets on every read, so they
/// can never drift from the edges they summarize.
async fn channel_stats(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let stats = state.views.channel_stats(&account.id).await?;
    Ok(ApiResponse::ok(stats, "channel stats"))
}

/// GET /api/v1/dashboard/videos
///
/// All of the channel's videos, drafts included.
async fn channel_videos(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let videos = state.views.channel_videos(&account.id).await?;
    Ok(ApiResponse::ok(videos, "channel videos"))
}
