//! Session lifecycle: registration, login, token rotation, logout
//!
//! Each account holds at most one live refresh token. Login and rotation
//! overwrite it, logout clears it, and rotation rejects any presented
//! token that does not match the stored one, so a stolen-but-already-
//! rotated token is dead on arrival.

use std::sync::Arc;

use crate::auth::{password, tokens, TokenKind};
use crate::config::AppConfig;
use crate::data::{Account, Database, EntityId};
use crate::error::AppError;
use crate::metrics::SESSION_EVENTS_TOTAL;

/// Freshly minted access + refresh pair
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct SessionService {
    db: Arc<Database>,
    config: Arc<AppConfig>,
}

impl SessionService {
    pub fn new(db: Arc<Database>, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Create a new account.
    ///
    /// Username is normalized to lowercase before storage. Uniqueness of
    /// username and email is enforced by the schema; a violation surfaces
    /// as a 409 rather than a race-prone pre-check.
    ///
    /// # Errors
    /// Returns validation error for malformed input, conflict for taken
    /// username/email
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        full_name: &str,
        raw_password: &str,
    ) -> Result<Account, AppError> {
        let username = username.trim().to_lowercase();
        let email = email.trim().to_string();
        let full_name = full_name.trim().to_string();

        if username.is_empty() || !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(AppError::Validation(
                "username must be alphanumeric (underscores allowed)".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(AppError::Validation("email is not valid".to_string()));
        }
        if full_name.is_empty() {
            return Err(AppError::Validation("full name is required".to_string()));
        }
        if raw_password.len() < 8 {
            return Err(AppError::Validation(
                "password must be at least 8 characters".to_string(),
            ));
        }

        let now = chrono::Utc::now();
        let account = Account {
            id: EntityId::new().0,
            username,
            email,
            full_name,
            password_hash: password::hash_password(raw_password)?,
            avatar_url: None,
            cover_image_url: None,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };

        self.db.insert_account(&account).await.map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db_err| db_err.is_unique_violation())
            {
                AppError::Conflict("username or email is already taken".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        tracing::info!(username = %account.username, "Account registered");
        SESSION_EVENTS_TOTAL.with_label_values(&["register"]).inc();

        Ok(account)
    }

    // =========================================================================
    // Login / logout
    // =========================================================================

    /// Authenticate by username or email and open a session.
    ///
    /// Unknown identifier and wrong password produce the same error.
    pub async fn login(
        &self,
        identifier: &str,
        raw_password: &str,
    ) -> Result<(Account, TokenPair), AppError> {
        let account = self
            .db
            .get_account_by_identifier(identifier.trim())
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !password::verify_password(raw_password, &account.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let pair = self.mint_pair(&account.id)?;
        self.db
            .set_refresh_token(&account.id, Some(&pair.refresh_token))
            .await?;

        tracing::info!(username = %account.username, "Session opened");
        SESSION_EVENTS_TOTAL.with_label_values(&["login"]).inc();

        Ok((account, pair))
    }

    /// Close the session by clearing the stored refresh token
    pub async fn logout(&self, account_id: &str) -> Result<(), AppError> {
        self.db.set_refresh_token(account_id, None).await?;
        SESSION_EVENTS_TOTAL.with_label_values(&["logout"]).inc();
        Ok(())
    }

    // =========================================================================
    // Rotation
    // =========================================================================

    /// Exchange a refresh token for a fresh pair.
    ///
    /// The presented token must match the account's stored token exactly;
    /// a previously rotated (or logged-out) token is rejected. The new
    /// refresh token replaces the old one, so each token is usable once.
    pub async fn rotate(&self, presented: &str) -> Result<(Account, TokenPair), AppError> {
        let claims = tokens::verify(
            &self.config.auth.refresh_token_secret,
            TokenKind::Refresh,
            presented,
        )?;

        let account = self
            .db
            .get_account_by_id(&claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if account.refresh_token.as_deref() != Some(presented) {
            tracing::warn!(username = %account.username, "Stale refresh token presented");
            SESSION_EVENTS_TOTAL
                .with_label_values(&["rotation_rejected"])
                .inc();
            return Err(AppError::Unauthorized);
        }

        let pair = self.mint_pair(&account.id)?;
        self.db
            .set_refresh_token(&account.id, Some(&pair.refresh_token))
            .await?;

        SESSION_EVENTS_TOTAL.with_label_values(&["rotation"]).inc();

        Ok((account, pair))
    }

    // =========================================================================
    // Password change
    // =========================================================================

    /// Change password after re-verifying the old one.
    /// Existing sessions stay valid; only the credential changes.
    pub async fn change_password(
        &self,
        account: &Account,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if !password::verify_password(old_password, &account.password_hash)? {
            return Err(AppError::Validation("old password is incorrect".to_string()));
        }
        if new_password.len() < 8 {
            return Err(AppError::Validation(
                "password must be at least 8 characters".to_string(),
            ));
        }

        let hash = password::hash_password(new_password)?;
        self.db.update_password_hash(&account.id, &hash).await?;

        tracing::info!(username = %account.username, "Password changed");
        Ok(())
    }

    fn mint_pair(&self, account_id: &str) -> Result<TokenPair, AppError> {
        let auth = &self.config.auth;
        Ok(TokenPair {
            access_token: tokens::mint(
                &auth.access_token_secret,
                TokenKind::Access,
                account_id,
                auth.access_token_ttl_seconds,
            )?,
            refresh_token: tokens::mint(
                &auth.refresh_token_secret,
                TokenKind::Refresh,
                account_id,
                auth.refresh_token_ttl_seconds,
            )?,
        })
    }
}
