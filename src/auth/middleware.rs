//! Request authentication extractors
//!
//! Handlers take [`CurrentUser`] when the route requires a session and
//! [`MaybeUser`] when the view is public but viewer-relative. Tokens are
//! accepted from the `Authorization: Bearer` header or the access-token
//! cookie; the header wins when both are present.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use super::tokens::{self, TokenKind, ACCESS_TOKEN_COOKIE};
use crate::data::Account;
use crate::error::AppError;
use crate::AppState;

/// Authenticated account, required
pub struct CurrentUser(pub Account);

/// Authenticated account if a valid token was presented, `None` otherwise.
/// Never rejects: an expired or garbage token degrades to anonymous.
pub struct MaybeUser(pub Option<Account>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = extract_token(parts).ok_or(AppError::Unauthorized)?;
        let claims = tokens::verify(
            &state.config.auth.access_token_secret,
            TokenKind::Access,
            &token,
        )?;

        let account = state
            .db
            .get_account_by_id(&claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(Self(account))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(CurrentUser(account)) => Ok(Self(Some(account))),
            Err(_) => Ok(Self(None)),
        }
    }
}

impl MaybeUser {
    /// Viewer id for viewer-relative queries
    pub fn viewer_id(&self) -> Option<&str> {
        self.0.as_ref().map(|a| a.id.as_str())
    }
}

fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(value) = parts.headers.get(AUTHORIZATION) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    CookieJar::from_headers(&parts.headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// Owner check for mutations on owned resources
pub fn ensure_owner(account: &Account, owner_id: &str) -> Result<(), AppError> {
    if account.id == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
