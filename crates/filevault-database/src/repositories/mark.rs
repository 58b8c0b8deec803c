//! Favorites and tag-assignment repository.
//!
//! Marks belong to the user who set them. The share revoke-cascade
//! deletes a revoked recipient's marks only; everyone else's rows stay.

use sqlx::PgPool;
use uuid::Uuid;

use filevault_core::FolderPath;
use filevault_core::error::{AppError, ErrorKind};
use filevault_core::result::AppResult;
use filevault_entity::resource::ResourceType;

/// Repository for favorites and tag assignments.
#[derive(Debug, Clone)]
pub struct MarkRepository {
    pool: PgPool,
}

impl MarkRepository {
    /// Create a new mark repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete one user's favorites and tags on a single resource.
    pub async fn remove_for_user_on_resource(
        &self,
        user_id: Uuid,
        resource_type: ResourceType,
        resource_id: Uuid,
    ) -> AppResult<u64> {
        let favorites = sqlx::query(
            "DELETE FROM favorites WHERE user_id = $1 AND resource_type = $2 AND resource_id = $3",
        )
        .bind(user_id)
        .bind(resource_type)
        .bind(resource_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete favorites", e))?;

        let tags = sqlx::query(
            "DELETE FROM tag_assignments \
             WHERE user_id = $1 AND resource_type = $2 AND resource_id = $3",
        )
        .bind(user_id)
        .bind(resource_type)
        .bind(resource_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete tags", e))?;

        Ok(favorites.rows_affected() + tags.rows_affected())
    }

    /// Delete one user's favorites and tags on every folder and file in
    /// the subtree rooted at `path`.
    pub async fn remove_for_user_under_path(
        &self,
        user_id: Uuid,
        path: &FolderPath,
    ) -> AppResult<u64> {
        let favorites = sqlx::query(
            "DELETE FROM favorites WHERE user_id = $1 AND ( \
               (resource_type = 'folder' AND resource_id IN \
                  (SELECT id FROM folders WHERE path LIKE $2 || '%')) \
               OR (resource_type = 'file' AND resource_id IN \
                  (SELECT id FROM files WHERE folder_id IN \
                     (SELECT id FROM folders WHERE path LIKE $2 || '%'))))",
        )
        .bind(user_id)
        .bind(path.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete subtree favorites", e)
        })?;

        let tags = sqlx::query(
            "DELETE FROM tag_assignments WHERE user_id = $1 AND ( \
               (resource_type = 'folder' AND resource_id IN \
                  (SELECT id FROM folders WHERE path LIKE $2 || '%')) \
               OR (resource_type = 'file' AND resource_id IN \
                  (SELECT id FROM files WHERE folder_id IN \
                     (SELECT id FROM folders WHERE path LIKE $2 || '%'))))",
        )
        .bind(user_id)
        .bind(path.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete subtree tags", e)
        })?;

        Ok(favorites.rows_affected() + tags.rows_affected())
    }

    /// Add favorites for a batch of resources in one transaction.
    ///
    /// Re-favoriting is a no-op per row, but any database failure aborts
    /// the whole batch.
    pub async fn add_favorites(
        &self,
        user_id: Uuid,
        resources: &[(ResourceType, Uuid)],
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        for (resource_type, resource_id) in resources {
            sqlx::query(
                "INSERT INTO favorites (user_id, resource_type, resource_id) \
                 VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(resource_type)
            .bind(resource_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to insert favorite", e)
            })?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Assign a tag to a batch of resources in one transaction.
    pub async fn add_tag(
        &self,
        user_id: Uuid,
        tag: &str,
        resources: &[(ResourceType, Uuid)],
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        for (resource_type, resource_id) in resources {
            sqlx::query(
                "INSERT INTO tag_assignments (user_id, tag, resource_type, resource_id) \
                 VALUES ($1, $2, $3, $4) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(tag)
            .bind(resource_type)
            .bind(resource_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert tag", e))?;
        }

        tx.commit().await?;
        Ok(())
    }
}
