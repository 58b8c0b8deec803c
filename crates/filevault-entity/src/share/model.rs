//! Share entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::resource::SharedResource;

use super::permission::SharePermission;

/// A share granting access to a file or folder.
///
/// Exactly one of `file_id` / `folder_id` is set. `shared_with = None`
/// marks a guest link, addressed by the hash of a random token; the raw
/// token itself is never stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Share {
    /// Unique share identifier.
    pub id: Uuid,
    /// Shared file, if this is a file share.
    pub file_id: Option<Uuid>,
    /// Shared folder, if this is a folder share.
    pub folder_id: Option<Uuid>,
    /// User who created the share.
    pub shared_by: Uuid,
    /// Recipient (None = guest link).
    pub shared_with: Option<Uuid>,
    /// SHA-256 hash of the guest token (guest links only).
    #[serde(skip_serializing)]
    pub token_hash: Option<String>,
    /// Permission level granted.
    pub permission: SharePermission,
    /// When the share expires (None = never).
    pub expires_at: Option<DateTime<Utc>>,
    /// When the share was created.
    pub created_at: DateTime<Utc>,
}

impl Share {
    /// Check if this share has expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    /// Check if this is a guest link (no specific recipient).
    pub fn is_guest_link(&self) -> bool {
        self.shared_with.is_none()
    }

    /// The shared resource as a typed reference.
    pub fn resource(&self) -> SharedResource {
        match (self.file_id, self.folder_id) {
            (Some(id), _) => SharedResource::File(id),
            (_, Some(id)) => SharedResource::Folder(id),
            // Unreachable with the XOR check constraint in place.
            (None, None) => unreachable!("share row without a resource"),
        }
    }
}

/// Data required to insert a new share row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShare {
    /// The shared resource.
    pub resource: SharedResource,
    /// User creating the share.
    pub shared_by: Uuid,
    /// Recipient (None = guest link).
    pub shared_with: Option<Uuid>,
    /// Token hash (guest links only).
    pub token_hash: Option<String>,
    /// Permission level.
    pub permission: SharePermission,
    /// Expiry time (None = never).
    pub expires_at: Option<DateTime<Utc>>,
}
