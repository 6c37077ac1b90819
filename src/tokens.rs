use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use rand::{RngCore, rngs::OsRng};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::models::PersistentToken;

/// Remember-me tokens are 256 bits of OS randomness.
pub const TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// The generated token already exists. Never resolved by overwriting.
    #[error("remember-me token collision")]
    Collision,

    #[error("token store database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// generate_token
///
/// Returns a fresh hex-encoded 256-bit token from the OS CSPRNG.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// TokenStore
///
/// Server-side persistence for remember-me tokens. Implementations hold no validity cache:
/// every `find_valid` is one read against current state, and a `delete` is visible to the
/// next lookup.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Inserts a new token. A duplicate token is a `Collision`, not an overwrite.
    async fn create(&self, token: &PersistentToken) -> Result<(), TokenStoreError>;

    /// Looks up a token and checks `now <= expires_at` in the same read.
    async fn find_valid(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PersistentToken>, TokenStoreError>;

    /// Deletes a token. Returns whether a record was removed.
    async fn delete(&self, token: &str) -> Result<bool, TokenStoreError>;

    /// Deletes every token that expired before `now`. Returns the number removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, TokenStoreError>;
}

/// TokenStoreState
///
/// The shared handle used by the authentication service and guards.
pub type TokenStoreState = Arc<dyn TokenStore>;

/// PostgresTokenStore
///
/// `TokenStore` backed by the `admin_remember_tokens` table. The token column is the
/// primary key, so uniqueness is enforced by the database.
pub struct PostgresTokenStore {
    pool: PgPool,
}

impl PostgresTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PostgresTokenStore {
    async fn create(&self, token: &PersistentToken) -> Result<(), TokenStoreError> {
        let result = sqlx::query(
            "INSERT INTO admin_remember_tokens (token, admin_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(&token.token)
        .bind(token.admin_id)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                tracing::error!(admin_id = token.admin_id, "remember-me token collision on insert");
                Err(TokenStoreError::Collision)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_valid(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PersistentToken>, TokenStoreError> {
        let found = sqlx::query_as::<_, PersistentToken>(
            r#"SELECT admin_id, token, expires_at
               FROM admin_remember_tokens
               WHERE token = $1 AND expires_at >= $2"#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found)
    }

    async fn delete(&self, token: &str) -> Result<bool, TokenStoreError> {
        let result = sqlx::query("DELETE FROM admin_remember_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, TokenStoreError> {
        let result = sqlx::query("DELETE FROM admin_remember_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// InMemoryTokenStore
///
/// Process-local `TokenStore` with the same semantics as the Postgres one.
/// Used by the test-suite.
#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: DashMap<String, PersistentToken>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Raw record regardless of expiry, for inspection in tests.
    pub fn get(&self, token: &str) -> Option<PersistentToken> {
        self.tokens.get(token).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn create(&self, token: &PersistentToken) -> Result<(), TokenStoreError> {
        match self.tokens.entry(token.token.clone()) {
            Entry::Occupied(_) => Err(TokenStoreError::Collision),
            Entry::Vacant(slot) => {
                slot.insert(token.clone());
                Ok(())
            }
        }
    }

    async fn find_valid(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PersistentToken>, TokenStoreError> {
        Ok(self
            .tokens
            .get(token)
            .map(|entry| entry.value().clone())
            .filter(|record| record.is_valid_at(now)))
    }

    async fn delete(&self, token: &str) -> Result<bool, TokenStoreError> {
        Ok(self.tokens.remove(token).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, TokenStoreError> {
        let before = self.tokens.len();
        self.tokens.retain(|_, record| record.is_valid_at(now));
        Ok(before.saturating_sub(self.tokens.len()) as u64)
    }
}

/// spawn_purge_task
///
/// Periodically deletes expired remember-me tokens. Failures are logged and retried on
/// the next tick.
pub fn spawn_purge_task(store: TokenStoreState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.purge_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "purged expired remember-me tokens"),
                Err(e) => tracing::error!(error = %e, "remember-me token purge failed"),
            }
        }
    })
}
