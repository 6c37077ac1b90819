use crate::models::AdminCredential;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("admin repository error: {0}")]
pub struct RepositoryError(#[from] pub sqlx::Error);

/// AdminRepository
///
/// Lookup contract for admin credentials. The authentication service only ever asks two
/// questions of it: who owns this username, and does this plaintext match their hash.
///
/// **Send + Sync + async_trait** make `Arc<dyn AdminRepository>` shareable across
/// request tasks.
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Exact, case-sensitive username match.
    async fn find_by_username(&self, username: &str)
    -> Result<Option<AdminCredential>, RepositoryError>;

    /// verify_password
    ///
    /// Checks a plaintext against the stored bcrypt hash. A malformed hash never verifies.
    fn verify_password(&self, record: &AdminCredential, plaintext: &str) -> bool {
        bcrypt::verify(plaintext, &record.password_hash).unwrap_or_else(|e| {
            tracing::warn!(admin_id = record.id, error = %e, "stored password hash is unusable");
            false
        })
    }
}

/// AdminRepositoryState
///
/// The concrete type used to share credential lookups across the application state.
pub type AdminRepositoryState = Arc<dyn AdminRepository>;

/// PostgresAdminRepository
///
/// Reads the `admins` table.
pub struct PostgresAdminRepository {
    pool: PgPool,
}

impl PostgresAdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminRepository for PostgresAdminRepository {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminCredential>, RepositoryError> {
        // TEXT equality is case-sensitive.
        let found = sqlx::query_as::<_, AdminCredential>(
            "SELECT id, username, password_hash FROM admins WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found)
    }
}
