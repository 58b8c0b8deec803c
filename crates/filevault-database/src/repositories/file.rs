//! File repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use filevault_core::error::{AppError, ErrorKind};
use filevault_core::result::AppResult;
use filevault_entity::file::model::{CreateFile, File};

/// Repository for file CRUD and batch mutations.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a file by ID, trashed or not.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    /// Find several files by ID. Order is not guaranteed.
    pub async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find files", e))
    }

    /// Find a sibling file with the given name in the given folder.
    ///
    /// Matches trashed rows too; the unique-name constraint spans both.
    pub async fn find_sibling_by_name(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE owner_id = $1 AND folder_id IS NOT DISTINCT FROM $2 \
             AND name = $3",
        )
        .bind(owner_id)
        .bind(folder_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find sibling file", e))
    }

    /// Create a new file record.
    pub async fn create(&self, data: &CreateFile) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "INSERT INTO files (id, owner_id, folder_id, name) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(data.id)
        .bind(data.owner_id)
        .bind(data.folder_id)
        .bind(&data.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create file", e))
    }

    /// Rename a file.
    pub async fn rename(&self, file_id: Uuid, name: &str) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(file_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename file", e))
    }

    /// Move a file to another folder (None = account root).
    pub async fn move_file(&self, file_id: Uuid, folder_id: Option<Uuid>) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET folder_id = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(file_id)
        .bind(folder_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move file", e))
    }

    /// Soft-delete a file.
    pub async fn trash(&self, file_id: Uuid) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(file_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to trash file", e))
    }

    /// Move a whole batch of files in one transaction.
    ///
    /// All-or-nothing: if any file is missing or already trashed the
    /// transaction rolls back and a `Conflict` error is returned.
    pub async fn move_many(&self, file_ids: &[Uuid], folder_id: Option<Uuid>) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE files SET folder_id = $2, updated_at = NOW() \
             WHERE id = ANY($1) AND deleted_at IS NULL",
        )
        .bind(file_ids)
        .bind(folder_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move files", e))?;

        if result.rows_affected() != file_ids.len() as u64 {
            tx.rollback().await?;
            return Err(AppError::conflict(
                "Bulk move touched fewer rows than requested; rolled back",
            ));
        }

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    /// Soft-delete a whole batch of files in one transaction.
    ///
    /// Same all-or-nothing contract as [`Self::move_many`].
    pub async fn trash_many(&self, file_ids: &[Uuid]) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE files SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = ANY($1) AND deleted_at IS NULL",
        )
        .bind(file_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to trash files", e))?;

        if result.rows_affected() != file_ids.len() as u64 {
            tx.rollback().await?;
            return Err(AppError::conflict(
                "Bulk trash touched fewer rows than requested; rolled back",
            ));
        }

        tx.commit().await?;
        Ok(result.rows_affected())
    }
}
