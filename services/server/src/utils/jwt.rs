use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::JwtSettings;
use crate::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        ApiError::Unauthorized(e.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

fn create_token(
    user_id: i64,
    token_type: TokenType,
    lifetime: Duration,
    settings: &JwtSettings,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + lifetime).timestamp() as usize,
        iat: now.timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        token_type,
    };

    encode(
        &Header::new(settings.algorithm),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )
}

pub fn create_access_token(
    user_id: i64,
    settings: &JwtSettings,
) -> Result<String, jsonwebtoken::errors::Error> {
    create_token(
        user_id,
        TokenType::Access,
        Duration::minutes(settings.access_expire_minutes),
        settings,
    )
}

pub fn create_refresh_token(
    user_id: i64,
    settings: &JwtSettings,
) -> Result<String, jsonwebtoken::errors::Error> {
    create_token(
        user_id,
        TokenType::Refresh,
        Duration::days(settings.refresh_expire_days),
        settings,
    )
}

pub fn issue_token_pair(user_id: i64, settings: &JwtSettings) -> Result<TokenPair, ApiError> {
    let access = create_access_token(user_id, settings)
        .map_err(|e| ApiError::internal(format!("failed to sign access token: {}", e)))?;
    let refresh = create_refresh_token(user_id, settings)
        .map_err(|e| ApiError::internal(format!("failed to sign refresh token: {}", e)))?;
    Ok(TokenPair { access, refresh })
}

/// Decodes `token`, checks its type and returns the user id from `sub`.
pub fn verify_token(
    token: &str,
    expected: TokenType,
    settings: &JwtSettings,
) -> Result<i64, TokenError> {
    let mut validation = Validation::new(settings.algorithm);
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    if data.claims.token_type != expected {
        return Err(TokenError::Invalid);
    }

    data.claims.sub.parse::<i64>().map_err(|_| TokenError::Invalid)
}

#[cfg(test)]
pub(crate) fn test_settings() -> JwtSettings {
    JwtSettings {
        secret: "test-secret".to_string(),
        algorithm: jsonwebtoken::Algorithm::HS256,
        access_expire_minutes: 15,
        refresh_expire_days: 7,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_round_trips_user_id() {
        let settings = test_settings();
        let token = create_access_token(42, &settings).unwrap();
        assert_eq!(verify_token(&token, TokenType::Access, &settings), Ok(42));
    }

    #[test]
    fn token_type_is_enforced() {
        let settings = test_settings();
        let refresh = create_refresh_token(7, &settings).unwrap();
        assert_eq!(
            verify_token(&refresh, TokenType::Access, &settings),
            Err(TokenError::Invalid)
        );
        assert_eq!(verify_token(&refresh, TokenType::Refresh, &settings), Ok(7));
    }

    #[test]
    fn garbage_is_invalid() {
        let settings = test_settings();
        assert_eq!(
            verify_token("not.a.valid.token", TokenType::Refresh, &settings),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let settings = test_settings();
        let token = create_access_token(1, &settings).unwrap();
        let other = JwtSettings {
            secret: "other".to_string(),
            ..test_settings()
        };
        assert_eq!(
            verify_token(&token, TokenType::Access, &other),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn expired_token_is_classified() {
        let settings = test_settings();
        let expired = JwtSettings {
            refresh_expire_days: 0,
            access_expire_minutes: -1,
            ..test_settings()
        };
        let token = create_access_token(3, &expired).unwrap();
        assert_eq!(
            verify_token(&token, TokenType::Access, &settings),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn pairs_never_repeat() {
        let settings = test_settings();
        let first = issue_token_pair(5, &settings).unwrap();
        let second = issue_token_pair(5, &settings).unwrap();
        assert_ne!(first.access, second.access);
        assert_ne!(first.refresh, second.refresh);
    }
}
