//! Subscription endpoints

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;

use super::envelope::ApiResponse;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::AppState;

pub fn subscriptions_router() -> Router<AppState> {
    Router::new()
        .route("/c/:channel_id", post(toggle_subscription).get(channel_subscribers))
        .route("/u/:subscriber_id", get(subscribed_channels))
}

/// POST /api/v1/subscriptions/c/:channel_id
///
/// Self-subscription is rejected.
async fn toggle_subscription(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let outcome = state
        .engagement
        .toggle_subscription(&account.id, &channel_id)
        .await?;
    Ok(ApiResponse::ok(outcome, "subscription toggled"))
}

/// GET /api/v1/subscriptions/c/:channel_id
///
/// Subscribers of a channel, each with the mutual flag (does the channel
/// subscribe back) and their own subscriber count.
async fn channel_subscribers(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let subscribers = state.views.channel_subscribers(&channel_id).await?;
    Ok(ApiResponse::ok(subscribers, "channel subscribers"))
}

/// GET /api/v1/subscriptions/u/:subscriber_id
///
/// Channels a user subscribes to, each with its latest published upload.
async fn subscribed_channels(
    State(state): State<AppState>,
    Path(subscriber_id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let channels = state.views.subscribed_channels(&subscriber_id).await?;
    Ok(ApiResponse::ok(channels, "subscribed channels"))
}
