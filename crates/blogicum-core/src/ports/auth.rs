//! Session and credential ports.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Who a session token speaks for, as read back from the token itself.
///
/// The user may have been deleted since the token was issued; callers
/// resolve `user_id` against the store before trusting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// A freshly signed session token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// Seconds until the token stops being accepted.
    pub expires_in: i64,
}

pub trait TokenService: Send + Sync {
    /// Sign a session for the given user.
    fn issue(&self, user_id: Uuid, username: &str) -> Result<IssuedToken, AuthError>;

    /// Check signature, issuer and expiry, and read the session back.
    fn open(&self, token: &str) -> Result<Session, AuthError>;
}

/// One-way password storage.
pub trait PasswordService: Send + Sync {
    /// Encode a raw password for storage.
    fn make_password(&self, raw: &str) -> Result<String, AuthError>;

    /// `Ok(false)` on a mismatch; `Err` only when `encoded` is unreadable.
    fn check_password(&self, raw: &str, encoded: &str) -> Result<bool, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No session credentials")]
    NoCredentials,

    #[error("Malformed credentials: {0}")]
    Malformed(String),

    #[error("Session expired")]
    Expired,

    #[error("Session rejected: {0}")]
    Rejected(String),

    #[error("Password encoding failed: {0}")]
    Encoding(String),
}
