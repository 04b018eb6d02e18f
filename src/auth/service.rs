use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::password;
use crate::auth::session::SessionStore;
use crate::auth::token::{TokenCodec, TokenPayload};
use crate::db::models::User;
use crate::db::repository::UserRepository;
use crate::error::{AppError, DatabaseError};

/// Both tokens handed out on successful registration or login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Orchestrates credential verification, token issuance, and revocation.
///
/// Refresh tokens are NOT rotated on refresh: a refresh token stays valid
/// until explicit logout, and every login adds an independent one (one per
/// device). Access tokens are stateless and expire on their own.
pub struct SessionManager {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionStore>,
    codec: TokenCodec,
}

impl SessionManager {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionStore>,
        codec: TokenCodec,
    ) -> Self {
        Self {
            users,
            sessions,
            codec,
        }
    }

    pub async fn register(&self, name: &str, password: &str) -> Result<TokenPair, AppError> {
        let name = validate_name(name)?;
        let password = validate_password(password)?;

        let password_hash = password::hash(password)?;
        let user = self
            .users
            .create(&User::new(name.to_string(), password_hash))
            .await
            .map_err(map_repo_error)?;

        // The user row stands even if issuance below fails; the caller may
        // retry by logging in.
        self.issue_pair(&user).await
    }

    pub async fn login(&self, name: &str, password: &str) -> Result<TokenPair, AppError> {
        let name = validate_name(name)?;
        let password = validate_password(password)?;

        let user = self
            .users
            .find_by_name(name)
            .await
            .map_err(map_repo_error)?
            .ok_or_else(|| AppError::NotFound("user not found".into()))?;

        if !password::verify(password, &user.password_hash)? {
            return Err(AppError::Unauthorized("incorrect password".into()));
        }

        self.issue_pair(&user).await
    }

    /// Trades a valid refresh token for a fresh access token. Membership is
    /// checked before signature verification so revoked tokens are rejected
    /// uniformly, without reaching the verifier.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        if refresh_token.trim().is_empty() {
            return Err(AppError::Unauthorized("no refresh token provided".into()));
        }

        if !self
            .sessions
            .contains(refresh_token)
            .await
            .map_err(map_repo_error)?
        {
            return Err(AppError::Forbidden("refresh token revoked or unknown".into()));
        }

        let payload = self
            .codec
            .verify_refresh(refresh_token)
            .map_err(|_| AppError::Forbidden("invalid refresh token".into()))?;

        self.codec
            .issue_access(&payload)
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Revokes a refresh token. Idempotent; revoking an unknown token is
    /// indistinguishable from revoking a live one.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        self.sessions
            .remove(refresh_token)
            .await
            .map_err(map_repo_error)
    }

    /// Verifies an access token. Stateless: no store lookup, so a token stays
    /// usable until its 20 second expiry even after logout.
    pub fn authorize(&self, access_token: &str) -> Result<TokenPayload, AppError> {
        self.codec
            .verify_access(access_token)
            .map_err(|e| AppError::Forbidden(e.to_string()))
    }

    pub async fn current_user(&self, access_token: &str) -> Result<User, AppError> {
        let payload = self.authorize(access_token)?;
        self.users
            .find_by_id(payload.user_id)
            .await
            .map_err(map_repo_error)?
            .ok_or_else(|| AppError::NotFound("user not found".into()))
    }

    pub async fn get_user(&self, id: &str) -> Result<User, AppError> {
        let id = parse_user_id(id)?;
        self.users
            .find_by_id(id)
            .await
            .map_err(map_repo_error)?
            .ok_or_else(|| AppError::NotFound("user not found".into()))
    }

    pub async fn edit_user(&self, id: &str, name: &str) -> Result<User, AppError> {
        let id = parse_user_id(id)?;
        let name = validate_name(name)?;
        self.users
            .update_name(id, name)
            .await
            .map_err(map_repo_error)
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        let id = parse_user_id(id)?;
        self.users.delete(id).await.map_err(map_repo_error)
    }

    async fn issue_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        let payload = TokenPayload {
            user_id: user.id,
            name: user.name.clone(),
        };

        let access_token = self
            .codec
            .issue_access(&payload)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let refresh_token = self
            .codec
            .issue_refresh(&payload)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        self.sessions
            .add(&refresh_token)
            .await
            .map_err(map_repo_error)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

// Limits are defined in characters, not UTF-8 bytes; a 10-character
// Cyrillic name is 20 bytes and must still pass.
fn validate_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() >= 20 {
        return Err(AppError::Validation(
            "Name should be string up to 20 characters".into(),
        ));
    }
    Ok(name)
}

fn validate_password(password: &str) -> Result<&str, AppError> {
    let password = password.trim();
    let length = password.chars().count();
    if !(6..=30).contains(&length) {
        return Err(AppError::Validation(
            "Password should be string from 6 to 30 characters".into(),
        ));
    }
    Ok(password)
}

fn parse_user_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::Validation("Invalid id".into()))
}

/// Collaborator failures surface as infrastructure errors unless the
/// repository reported a uniqueness or missing-row condition. A database
/// hiccup must never be reported as an auth failure.
fn map_repo_error(err: AppError) -> AppError {
    match err {
        AppError::Database(DatabaseError::Duplicate) => {
            AppError::Conflict("name already taken".into())
        }
        AppError::Database(DatabaseError::NotFound) => AppError::NotFound("user not found".into()),
        AppError::Database(e) => AppError::Internal(e.to_string()),
        other => other,
    }
}
