//! Guest view audit entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Records that a guest token was used at least once.
///
/// At most one row exists per share, no matter how many times the same
/// token is presented, which bounds audit-log growth.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GuestViewRecord {
    /// The guest-link share that was used.
    pub share_id: Uuid,
    /// First time the token was used.
    pub viewed_at: DateTime<Utc>,
}
