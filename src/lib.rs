//! Clipstream - a video sharing backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                       │
//! │  - REST endpoints under /api/v1                             │
//! │  - Uniform response envelope                                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                           │
//! │  - Session lifecycle (register/login/rotate/logout)         │
//! │  - Edge toggles (likes, subscriptions)                      │
//! │  - Composed, viewer-relative read views                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                             │
//! │  - SQLite (sqlx), unique indexes guard edge tables          │
//! │  - S3-compatible media storage                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `data`: Database models, projections and queries
//! - `storage`: S3-compatible media storage
//! - `auth`: Tokens, password hashing, request extractors
//! - `query`: Feed query normalization and SQL composition
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod query;
pub mod service;
pub mod storage;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Cloned per request; every member is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Media storage (S3-compatible)
    pub storage: Arc<storage::MediaStorage>,

    /// Session lifecycle
    pub sessions: Arc<service::SessionService>,

    /// Like/subscription toggles
    pub engagement: Arc<service::EngagementService>,

    /// Composed read views
    pub views: Arc<service::ViewService>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database (runs migrations)
    /// 2. Connect to media storage
    /// 3. Wire up the service layer
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let db = Arc::new(data::Database::connect(&config.database.path).await?);
        tracing::info!("Database connected");

        let storage = Arc::new(storage::MediaStorage::new(&config.storage)?);
        tracing::info!("Media storage initialized");

        let config = Arc::new(config);
        let sessions = Arc::new(service::SessionService::new(
            Arc::clone(&db),
            Arc::clone(&config),
        ));
        let engagement = Arc::new(service::EngagementService::new(Arc::clone(&db)));
        let views = Arc::new(service::ViewService::new(Arc::clone(&db)));

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config,
            db,
            storage,
            sessions,
            engagement,
            views,
        })
    }
}

/// Build the application router with all routes and layers
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    let cors_layer = build_cors_layer(&state.config.server);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api/v1", api::api_v1_router())
        .layer(axum::middleware::from_fn(track_http_metrics))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
        .merge(api::metrics_router())
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    if !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    let allowed_origin = server.base_url();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin from server base URL; denying cross-origin requests"
            );
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}

/// Record request count and latency per matched route
async fn track_http_metrics(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    use axum::extract::MatchedPath;

    let start = std::time::Instant::now();
    let method = req.method().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    metrics::HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &endpoint, &status])
        .inc();
    metrics::HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &endpoint])
        .observe(start.elapsed().as_secs_f64());

    response
}

async fn health_check() -> &'static str {
    "OK"
}
