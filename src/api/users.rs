//! Account and session endpoints

use axum::extract::{Multipart, Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;

use super::envelope::ApiResponse;
use crate::auth::{CurrentUser, MaybeUser, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::error::AppError;
use crate::service::TokenPair;
use crate::storage::MediaKind;
use crate::AppState;

pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .route("/logout", post(logout))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
        .route("/avatar", patch(update_avatar))
        .route("/cover-image", patch(update_cover_image))
        .route("/c/:username", get(channel_profile))
        .route("/history", get(watch_history))
}

// =============================================================================
// Registration / login
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
}

/// POST /api/v1/users/register
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let account = state
        .sessions
        .register(&req.username, &req.email, &req.full_name, &req.password)
        .await?;

    Ok(ApiResponse::created(account, "account registered"))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

/// POST /api/v1/users/login
///
/// Accepts username or email. Tokens come back both as cookies and in
/// the body, so browser and non-browser clients are served by the same
/// endpoint.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let identifier = req
        .username
        .as_deref()
        .or(req.email.as_deref())
        .ok_or_else(|| AppError::Validation("username or email is required".to_string()))?;

    let (account, pair) = state.sessions.login(identifier, &req.password).await?;
    let jar = set_auth_cookies(jar, &state, &pair);

    Ok((
        jar,
        ApiResponse::ok(
            json!({
                "user": account,
                "accessToken": pair.access_token,
                "refreshToken": pair.refresh_token,
            }),
            "logged in",
        ),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// POST /api/v1/users/refresh-token
///
/// Refresh token is read from the cookie or, failing that, the body.
/// A stale token (already rotated, or cleared by logout) is rejected.
async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let from_cookie = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string());
    let presented = from_cookie
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .ok_or(AppError::Unauthorized)?;

    let (_, pair) = state.sessions.rotate(&presented).await?;
    let jar = set_auth_cookies(jar, &state, &pair);

    Ok((
        jar,
        ApiResponse::ok(
            json!({
                "accessToken": pair.access_token,
                "refreshToken": pair.refresh_token,
            }),
            "tokens rotated",
        ),
    ))
}

/// POST /api/v1/users/logout
async fn logout(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    jar: CookieJar,
) -> Result<impl axum::response::IntoResponse, AppError> {
    state.sessions.logout(&account.id).await?;

    let jar = jar
        .remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/").build())
        .remove(Cookie::build(REFRESH_TOKEN_COOKIE).path("/").build());

    Ok((jar, ApiResponse::ok(json!({}), "logged out")))
}

// =============================================================================
// Account management
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// POST /api/v1/users/change-password
async fn change_password(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    state
        .sessions
        .change_password(&account, &req.old_password, &req.new_password)
        .await?;
    Ok(ApiResponse::ok(json!({}), "password changed"))
}

/// GET /api/v1/users/current-user
async fn current_user(
    CurrentUser(account): CurrentUser,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ApiResponse::ok(account, "current user"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: String,
    pub email: String,
}

/// PATCH /api/v1/users/update-account
async fn update_account(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let full_name = req.full_name.trim();
    let email = req.email.trim();
    if full_name.is_empty() {
        return Err(AppError::Validation("full name is required".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::Validation("email is not valid".to_string()));
    }

    state
        .db
        .update_account_details(&account.id, full_name, email)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db_err| db_err.is_unique_violation())
            {
                AppError::Conflict("email is already taken".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

    let updated = state
        .db
        .get_account_by_id(&account.id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::ok(updated, "account updated"))
}

/// PATCH /api/v1/users/avatar
async fn update_avatar(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    multipart: Multipart,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let file = read_single_file(multipart, "avatar").await?;
    let (_, url) = state
        .storage
        .upload(
            MediaKind::Avatar,
            &crate::data::EntityId::new().0,
            file.data,
            &file.content_type,
        )
        .await?;

    state.db.update_avatar_url(&account.id, &url).await?;
    Ok(ApiResponse::ok(json!({ "avatarUrl": url }), "avatar updated"))
}

/// PATCH /api/v1/users/cover-image
async fn update_cover_image(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
    multipart: Multipart,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let file = read_single_file(multipart, "coverImage").await?;
    let (_, url) = state
        .storage
        .upload(
            MediaKind::CoverImage,
            &crate::data::EntityId::new().0,
            file.data,
            &file.content_type,
        )
        .await?;

    state.db.update_cover_image_url(&account.id, &url).await?;
    Ok(ApiResponse::ok(
        json!({ "coverImageUrl": url }),
        "cover image updated",
    ))
}

// =============================================================================
// Public profile / history
// =============================================================================

/// GET /api/v1/users/c/:username
async fn channel_profile(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let profile = state
        .views
        .channel_profile(viewer.viewer_id(), &username)
        .await?;
    Ok(ApiResponse::ok(profile, "channel profile"))
}

/// GET /api/v1/users/history
async fn watch_history(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let history = state.views.watch_history(&account.id).await?;
    Ok(ApiResponse::ok(history, "watch history"))
}

// =============================================================================
// Helpers
// =============================================================================

fn set_auth_cookies(jar: CookieJar, state: &AppState, pair: &TokenPair) -> CookieJar {
    let secure = state.config.should_use_secure_cookies();
    jar.add(auth_cookie(
        ACCESS_TOKEN_COOKIE,
        pair.access_token.clone(),
        secure,
    ))
    .add(auth_cookie(
        REFRESH_TOKEN_COOKIE,
        pair.refresh_token.clone(),
        secure,
    ))
}

fn auth_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

pub(super) struct UploadedFile {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Pull one named file field out of a multipart body
pub(super) async fn read_single_file(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?
            .to_vec();
        if data.is_empty() {
            return Err(AppError::Validation(format!("{field_name} file is empty")));
        }
        return Ok(UploadedFile { data, content_type });
    }

    Err(AppError::Validation(format!("{field_name} file is required")))
}
