//! Guest view audit repository.

use sqlx::PgPool;
use uuid::Uuid;

use filevault_core::error::{AppError, ErrorKind};
use filevault_core::result::AppResult;

/// Repository for the guest view log.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    /// Create a new audit repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record that a guest token was used, at most once per share.
    ///
    /// Returns `true` if a new row was written, `false` if the share had
    /// already been logged. Idempotent via the unique constraint.
    pub async fn record_guest_view(&self, share_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO guest_view_log (share_id) VALUES ($1) \
             ON CONFLICT (share_id) DO NOTHING",
        )
        .bind(share_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record guest view", e)
        })?;
        Ok(result.rows_affected() > 0)
    }
}
