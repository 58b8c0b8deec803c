//! Folder repository implementation.
//!
//! All subtree operations are materialized-path prefix queries; ancestry
//! is never derived by walking parent pointers at request time.

use sqlx::PgPool;
use uuid::Uuid;

use filevault_core::FolderPath;
use filevault_core::error::{AppError, ErrorKind};
use filevault_core::result::AppResult;
use filevault_entity::folder::model::{CreateFolder, Folder};

/// Repository for folder CRUD and tree rewrites.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a folder by ID, trashed or not.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    /// Find a sibling with the given name under the given parent.
    ///
    /// Deliberately matches trashed rows too: the unique-name constraint
    /// spans live and trashed siblings.
    pub async fn find_sibling_by_name(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE owner_id = $1 AND parent_id IS NOT DISTINCT FROM $2 \
             AND name = $3",
        )
        .bind(owner_id)
        .bind(parent_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find sibling", e))
    }

    /// Create a new folder.
    pub async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (id, owner_id, parent_id, name, path) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(data.id)
        .bind(data.owner_id)
        .bind(data.parent_id)
        .bind(&data.name)
        .bind(&data.path)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create folder", e))
    }

    /// Rename a folder. Names are metadata; the materialized path is
    /// untouched.
    pub async fn rename(&self, folder_id: Uuid, name: &str) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(folder_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename folder", e))
    }

    /// Re-parent a folder and rewrite the paths of its entire subtree.
    ///
    /// Runs in one transaction. The moved subtree root is locked
    /// `FOR UPDATE` so two overlapping moves serialize instead of
    /// rewriting descendants against a stale parent path.
    pub async fn move_subtree(
        &self,
        folder_id: Uuid,
        new_parent_id: Option<Uuid>,
        old_path: &FolderPath,
        new_path: &FolderPath,
    ) -> AppResult<Folder> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM folders WHERE id = $1 FOR UPDATE")
            .bind(folder_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to lock moved folder", e)
            })?;

        let folder = sqlx::query_as::<_, Folder>(
            "UPDATE folders SET parent_id = $2, path = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(folder_id)
        .bind(new_parent_id)
        .bind(new_path)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move folder", e))?;

        // Replace the old prefix on every descendant, keeping the suffix.
        sqlx::query(
            "UPDATE folders \
             SET path = $2 || substring(path FROM char_length($1) + 1), updated_at = NOW() \
             WHERE path LIKE $1 || '%' AND id <> $3",
        )
        .bind(old_path.as_str())
        .bind(new_path.as_str())
        .bind(folder_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to rewrite descendant paths", e)
        })?;

        tx.commit().await?;
        Ok(folder)
    }

    /// Soft-delete a folder and everything beneath it (folders and files).
    pub async fn trash_subtree(&self, path: &FolderPath) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        let folders = sqlx::query(
            "UPDATE folders SET deleted_at = NOW(), updated_at = NOW() \
             WHERE path LIKE $1 || '%' AND deleted_at IS NULL",
        )
        .bind(path.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to trash folders", e))?;

        let files = sqlx::query(
            "UPDATE files SET deleted_at = NOW(), updated_at = NOW() \
             WHERE deleted_at IS NULL AND folder_id IN \
               (SELECT id FROM folders WHERE path LIKE $1 || '%')",
        )
        .bind(path.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to trash files", e))?;

        tx.commit().await?;
        Ok(folders.rows_affected() + files.rows_affected())
    }

    /// Whether any of the given folders is soft-deleted.
    ///
    /// Callers pass the id segments of a materialized path to resolve the
    /// "trashed ancestor" flag in a single query.
    pub async fn any_trashed(&self, folder_ids: &[Uuid]) -> AppResult<bool> {
        if folder_ids.is_empty() {
            return Ok(false);
        }
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM folders WHERE id = ANY($1) AND deleted_at IS NOT NULL)",
        )
        .bind(folder_ids)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to check trashed ancestors", e)
        })
    }
}
