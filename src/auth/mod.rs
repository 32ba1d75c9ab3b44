//! Authentication: tokens, password hashing and request extractors

pub mod middleware;
pub mod password;
pub mod tokens;

pub use middleware::{ensure_owner, CurrentUser, MaybeUser};
pub use tokens::{TokenKind, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
