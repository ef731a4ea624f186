//! Signed session tokens.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use blogicum_core::ports::{AuthError, IssuedToken, Session, TokenService};

const DEFAULT_SECRET: &str = "change-me-in-production";
const DEFAULT_ISSUER: &str = "blogicum";
const DEFAULT_SESSION_HOURS: i64 = 24 * 14;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub session_lifetime: TimeDelta,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            issuer: DEFAULT_ISSUER.to_string(),
            session_lifetime: TimeDelta::hours(DEFAULT_SESSION_HOURS),
        }
    }
}

impl JwtConfig {
    /// Reads `JWT_SECRET`, `JWT_ISSUER` and `SESSION_HOURS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let secret = std::env::var("JWT_SECRET").unwrap_or(defaults.secret);
        if secret == DEFAULT_SECRET {
            tracing::warn!("JWT_SECRET is not set; sessions are signed with the built-in secret");
        }

        let session_lifetime = std::env::var("SESSION_HOURS")
            .ok()
            .and_then(|hours| hours.parse::<i64>().ok())
            .filter(|hours| *hours > 0)
            .map(TimeDelta::hours)
            .unwrap_or(defaults.session_lifetime);

        Self {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
            session_lifetime,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: Uuid,
    username: String,
    iss: String,
    iat: i64,
    exp: i64,
}

/// HS256 tokens whose subject is the user id.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::default();
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(JwtConfig::from_env())
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user_id: Uuid, username: &str) -> Result<IssuedToken, AuthError> {
        let issued_at = Utc::now();
        let claims = SessionClaims {
            sub: user_id,
            username: username.to_string(),
            iss: self.config.issuer.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.config.session_lifetime).timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Rejected(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_in: self.config.session_lifetime.num_seconds(),
        })
    }

    fn open(&self, token: &str) -> Result<Session, AuthError> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Rejected(e.to_string()),
            })?
            .claims;

        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AuthError::Rejected("expiry out of range".to_string()))?;

        Ok(Session {
            user_id: claims.sub,
            username: claims.username,
            expires_at,
        })
    }
}
