//! Favorite and tag-assignment entity models.
//!
//! These per-user marks are owned by the user who set them, not by the
//! resource owner. Revoking a share deletes only the revoked recipient's
//! marks on the affected subtree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::resource::ResourceType;

/// A user's favorite on a file or folder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Favorite {
    /// The user who favorited the resource.
    pub user_id: Uuid,
    /// Kind of resource.
    pub resource_type: ResourceType,
    /// The favorited resource.
    pub resource_id: Uuid,
    /// When the favorite was set.
    pub created_at: DateTime<Utc>,
}

/// A user's tag on a file or folder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TagAssignment {
    /// The user who assigned the tag.
    pub user_id: Uuid,
    /// Tag text.
    pub tag: String,
    /// Kind of resource.
    pub resource_type: ResourceType,
    /// The tagged resource.
    pub resource_id: Uuid,
    /// When the tag was assigned.
    pub created_at: DateTime<Utc>,
}
