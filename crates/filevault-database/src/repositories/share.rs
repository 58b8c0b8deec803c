//! Share repository implementation.
//!
//! Enforces the deduplication rules at write time: one live row per
//! (resource, recipient) pair, one canonical guest-link row per resource.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use filevault_core::FolderPath;
use filevault_core::error::{AppError, ErrorKind};
use filevault_core::result::AppResult;
use filevault_entity::resource::SharedResource;
use filevault_entity::share::model::Share;
use filevault_entity::share::permission::SharePermission;

/// A live folder share joined to the folder's current materialized path.
#[derive(Debug, Clone, FromRow)]
pub struct FolderGrantRow {
    /// The shared folder.
    pub folder_id: Uuid,
    /// The folder's current path at lookup time.
    pub path: FolderPath,
    /// Permission granted on the subtree.
    pub permission: SharePermission,
}

/// Repository for share CRUD, deduplication, and token lookup.
#[derive(Debug, Clone)]
pub struct ShareRepository {
    pool: PgPool,
}

impl ShareRepository {
    /// Create a new share repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a share by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Share>> {
        sqlx::query_as::<_, Share>("SELECT * FROM shares WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find share", e))
    }

    /// Find a guest link by the hash of its raw token.
    ///
    /// No expiry filter here: the resolver distinguishes expired (Gone)
    /// from absent (NotFound).
    pub async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Share>> {
        sqlx::query_as::<_, Share>("SELECT * FROM shares WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find share by token", e)
            })
    }

    /// List all shares on a resource, newest first.
    pub async fn find_for_resource(&self, resource: SharedResource) -> AppResult<Vec<Share>> {
        let (file_id, folder_id) = resource.into_columns();
        sqlx::query_as::<_, Share>(
            "SELECT * FROM shares WHERE file_id IS NOT DISTINCT FROM $1 \
             AND folder_id IS NOT DISTINCT FROM $2 ORDER BY created_at DESC",
        )
        .bind(file_id)
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list resource shares", e)
        })
    }

    /// Create or update the direct share for (resource, recipient).
    ///
    /// An existing row is matched ignoring expiry and updated in place
    /// (permission, expiry) instead of inserting a duplicate.
    pub async fn upsert_direct(
        &self,
        resource: SharedResource,
        shared_by: Uuid,
        shared_with: Uuid,
        permission: SharePermission,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<Share> {
        let (file_id, folder_id) = resource.into_columns();

        let existing: Option<Share> = sqlx::query_as(
            "SELECT * FROM shares WHERE file_id IS NOT DISTINCT FROM $1 \
             AND folder_id IS NOT DISTINCT FROM $2 AND shared_with = $3",
        )
        .bind(file_id)
        .bind(folder_id)
        .bind(shared_with)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to look up existing share", e)
        })?;

        if let Some(share) = existing {
            return sqlx::query_as::<_, Share>(
                "UPDATE shares SET permission = $2, expires_at = $3 WHERE id = $1 RETURNING *",
            )
            .bind(share.id)
            .bind(permission)
            .bind(expires_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update share", e)
            });
        }

        sqlx::query_as::<_, Share>(
            "INSERT INTO shares (id, file_id, folder_id, shared_by, shared_with, permission, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(file_id)
        .bind(folder_id)
        .bind(shared_by)
        .bind(shared_with)
        .bind(permission)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create share", e))
    }

    /// Create or refresh the canonical guest-link row for a resource.
    ///
    /// Reuses an existing row even if expired, replacing its token hash,
    /// permission, and expiry. The caller holds the only copy of the raw
    /// token.
    pub async fn upsert_guest_link(
        &self,
        resource: SharedResource,
        shared_by: Uuid,
        permission: SharePermission,
        expires_at: Option<DateTime<Utc>>,
        token_hash: &str,
    ) -> AppResult<Share> {
        let (file_id, folder_id) = resource.into_columns();

        let existing: Option<Share> = sqlx::query_as(
            "SELECT * FROM shares WHERE file_id IS NOT DISTINCT FROM $1 \
             AND folder_id IS NOT DISTINCT FROM $2 AND shared_with IS NULL",
        )
        .bind(file_id)
        .bind(folder_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to look up guest link", e)
        })?;

        if let Some(share) = existing {
            return sqlx::query_as::<_, Share>(
                "UPDATE shares SET permission = $2, expires_at = $3, token_hash = $4 \
                 WHERE id = $1 RETURNING *",
            )
            .bind(share.id)
            .bind(permission)
            .bind(expires_at)
            .bind(token_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to refresh guest link", e)
            });
        }

        sqlx::query_as::<_, Share>(
            "INSERT INTO shares (id, file_id, folder_id, shared_by, shared_with, permission, expires_at, token_hash) \
             VALUES ($1, $2, $3, $4, NULL, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(file_id)
        .bind(folder_id)
        .bind(shared_by)
        .bind(permission)
        .bind(expires_at)
        .bind(token_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create guest link", e))
    }

    /// Delete a share row. Returns `true` if a row was deleted.
    pub async fn delete(&self, share_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM shares WHERE id = $1")
            .bind(share_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete share", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Live direct file shares held by a user: `(file_id, permission)`.
    pub async fn find_live_file_shares_for(
        &self,
        user_id: Uuid,
    ) -> AppResult<Vec<(Uuid, SharePermission)>> {
        sqlx::query_as::<_, (Uuid, SharePermission)>(
            "SELECT file_id, permission FROM shares \
             WHERE shared_with = $1 AND file_id IS NOT NULL \
             AND (expires_at IS NULL OR expires_at > NOW())",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list file shares", e))
    }

    /// Live folder shares held by a user, joined to each folder's
    /// current path. Shares on trashed folders are excluded.
    pub async fn find_live_folder_grants_for(
        &self,
        user_id: Uuid,
    ) -> AppResult<Vec<FolderGrantRow>> {
        sqlx::query_as::<_, FolderGrantRow>(
            "SELECT s.folder_id, f.path, s.permission FROM shares s \
             JOIN folders f ON f.id = s.folder_id \
             WHERE s.shared_with = $1 AND s.folder_id IS NOT NULL \
             AND f.deleted_at IS NULL \
             AND (s.expires_at IS NULL OR s.expires_at > NOW()) \
             ORDER BY char_length(f.path) ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folder grants", e))
    }

    /// Delete redundant guest-link rows, keeping the newest per resource.
    ///
    /// Idempotent maintenance for historical duplicates created by racing
    /// link requests. Safe to run repeatedly.
    pub async fn cleanup_duplicate_guest_links(&self) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM shares s USING shares keep \
             WHERE s.shared_with IS NULL AND keep.shared_with IS NULL \
             AND s.id <> keep.id \
             AND s.file_id IS NOT DISTINCT FROM keep.file_id \
             AND s.folder_id IS NOT DISTINCT FROM keep.folder_id \
             AND (keep.created_at > s.created_at \
                  OR (keep.created_at = s.created_at AND keep.id > s.id))",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to clean up guest links", e)
        })?;
        Ok(result.rows_affected())
    }
}
