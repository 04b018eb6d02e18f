use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::error::AppError;

/// The authoritative set of currently-valid refresh tokens. A refresh token
/// is usable iff it is a member; logout removes it, and removal is the only
/// way a refresh token stops working.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Marks a refresh token as valid. Idempotent.
    async fn add(&self, token: &str) -> Result<(), AppError>;
    async fn contains(&self, token: &str) -> Result<bool, AppError>;
    /// Revokes a refresh token. Removing an absent token is a no-op.
    async fn remove(&self, token: &str) -> Result<(), AppError>;
}

/// In-process store. Mutations serialize on the write lock; membership
/// checks share the read lock. The lock is never held across an await into
/// other components, and a remove completed before a contains begins is
/// always observed by that contains.
#[derive(Default)]
pub struct MemorySessionStore {
    tokens: RwLock<HashSet<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn add(&self, token: &str) -> Result<(), AppError> {
        let mut tokens = self.tokens.write().await;
        tokens.insert(token.to_string());
        Ok(())
    }

    async fn contains(&self, token: &str) -> Result<bool, AppError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.contains(token))
    }

    async fn remove(&self, token: &str) -> Result<(), AppError> {
        let mut tokens = self.tokens.write().await;
        tokens.remove(token);
        Ok(())
    }
}

/// Postgres-backed store. Revocations survive restarts and are visible to
/// every instance of the service, which the in-process store cannot offer.
pub struct PgSessionStore {
    pool: Arc<PgPool>,
}

impl PgSessionStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn add(&self, token: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO refresh_tokens (token) VALUES ($1) ON CONFLICT (token) DO NOTHING",
        )
        .bind(token)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn contains(&self, token: &str) -> Result<bool, AppError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT token FROM refresh_tokens WHERE token = $1")
                .bind(token)
                .fetch_optional(self.pool.as_ref())
                .await?;

        Ok(row.is_some())
    }

    async fn remove(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }
}
