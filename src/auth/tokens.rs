//! Access and refresh token minting and verification
//!
//! Both token kinds are HS256 JWTs carrying the account id as `sub`.
//! The `token_type` claim keeps the two kinds from being swapped: an
//! access token never verifies as a refresh token and vice versa, even
//! if the two secrets are configured identically.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::AppError;

/// Cookie names used by the session endpoints
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// JWT claims for both token kinds
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: String,
    pub token_type: String,
    /// Fresh ULID per mint. `iat` has second resolution, so without this
    /// two tokens minted in the same second would be byte-identical and a
    /// rotated-away refresh token could match the newly stored one.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Mint a token of the given kind for an account
///
/// # Errors
/// Returns error if JWT encoding fails
pub fn mint(
    secret: &str,
    kind: TokenKind,
    account_id: &str,
    ttl_seconds: i64,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: account_id.to_string(),
        token_type: kind.as_str().to_string(),
        jti: Ulid::new().to_string(),
        iat: now,
        exp: now + ttl_seconds,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to sign token: {e}")))
}

/// Verify a token and check it is of the expected kind.
///
/// Expired, malformed and wrong-kind tokens all come back as
/// [`AppError::Unauthorized`]; callers never learn which check failed.
pub fn verify(secret: &str, kind: TokenKind, token: &str) -> Result<Claims, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|_| AppError::Unauthorized)?;

    if data.claims.token_type != kind.as_str() {
        return Err(AppError::Unauthorized);
    }

    Ok(data.claims)
}
