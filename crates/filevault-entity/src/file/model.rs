//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A file. Files carry no path of their own; their effective position is
/// their containing folder's path (or the account root).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: Uuid,
    /// The file owner.
    pub owner_id: Uuid,
    /// Containing folder (null = account root).
    pub folder_id: Option<Uuid>,
    /// File name.
    pub name: String,
    /// When the file was trashed (soft delete), if ever.
    pub deleted_at: Option<DateTime<Utc>>,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file was last updated.
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// Check if this file has been soft-deleted.
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Data required to create a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// Pre-generated file id.
    pub id: Uuid,
    /// The file owner.
    pub owner_id: Uuid,
    /// Containing folder (None for account root).
    pub folder_id: Option<Uuid>,
    /// File name.
    pub name: String,
}
