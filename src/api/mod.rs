//! API layer
//!
//! HTTP handlers for:
//! - Account and session endpoints
//! - Video feed, detail and management
//! - Engagement toggles (likes, subscriptions)
//! - Dashboard, tweets and playlists
//! - Metrics (Prometheus)

mod comments;
mod dashboard;
mod envelope;
mod likes;
pub mod metrics;
mod playlists;
mod subscriptions;
mod tweets;
mod users;
mod videos;

pub use envelope::ApiResponse;
pub use metrics::metrics_router;

use axum::Router;

use crate::AppState;

/// All /api/v1 routes
pub fn api_v1_router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::users_router())
        .nest("/videos", videos::videos_router())
        .nest("/comments", comments::comments_router())
        .nest("/likes", likes::likes_router())
        .nest("/subscriptions", subscriptions::subscriptions_router())
        .nest("/dashboard", dashboard::dashboard_router())
        .nest("/tweets", tweets::tweets_router())
        .nest("/playlists", playlists::playlists_router())
}
