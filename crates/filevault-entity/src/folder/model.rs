//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use filevault_core::FolderPath;

/// A folder in the account hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: Uuid,
    /// The folder owner.
    pub owner_id: Uuid,
    /// Parent folder ID (null for account-root folders).
    pub parent_id: Option<Uuid>,
    /// Human-readable name. Metadata only: renaming never touches `path`.
    pub name: String,
    /// Materialized path, `/id1/.../idN/` with `idN == id`.
    pub path: FolderPath,
    /// When the folder was trashed (soft delete), if ever.
    pub deleted_at: Option<DateTime<Utc>>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this is a root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check if this folder has been soft-deleted.
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// Pre-generated folder id (the path embeds it, so it is chosen
    /// before the insert).
    pub id: Uuid,
    /// The folder owner.
    pub owner_id: Uuid,
    /// Parent folder (None for account root).
    pub parent_id: Option<Uuid>,
    /// Folder name.
    pub name: String,
    /// Full materialized path.
    pub path: FolderPath,
}
