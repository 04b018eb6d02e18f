use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthConfig;

/// Claims carried by both access and refresh tokens. Refresh tokens carry no
/// `exp`; their validity is governed by session-store membership instead.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // User ID
    pub name: String,
    pub iat: i64,     // Issued at
    pub jti: String,  // Unique per issuance, so repeated logins yield distinct tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// The identity embedded in a token, as seen by callers of the codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub user_id: Uuid,
    pub name: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        }
    }
}

/// Signs and verifies both token kinds. The two secrets are independent so a
/// compromised access secret cannot be used to mint refresh tokens.
pub struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl: Duration::seconds(config.access_token_ttl_secs),
        }
    }

    pub fn issue_access(&self, payload: &TokenPayload) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: payload.user_id.to_string(),
            name: payload.name.clone(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            exp: Some((now + self.access_ttl).timestamp()),
        };

        Ok(encode(&Header::default(), &claims, &self.access_encoding)?)
    }

    pub fn issue_refresh(&self, payload: &TokenPayload) -> Result<String, TokenError> {
        let claims = Claims {
            sub: payload.user_id.to_string(),
            name: payload.name.clone(),
            iat: Utc::now().timestamp(),
            jti: Uuid::new_v4().to_string(),
            exp: None,
        };

        Ok(encode(&Header::default(), &claims, &self.refresh_encoding)?)
    }

    pub fn verify_access(&self, token: &str) -> Result<TokenPayload, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // The default 60s leeway would keep a 20s token alive for over a
        // minute; expiry must be exact.
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.access_decoding, &validation)?;
        Self::payload_from_claims(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<TokenPayload, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &self.refresh_decoding, &validation)?;
        Self::payload_from_claims(data.claims)
    }

    fn payload_from_claims(claims: Claims) -> Result<TokenPayload, TokenError> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| TokenError::Invalid)?;
        Ok(TokenPayload {
            user_id,
            name: claims.name,
        })
    }
}
