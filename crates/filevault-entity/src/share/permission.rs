//! Share permission lattice.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use filevault_core::AppError;

/// Permission level granted by a share.
///
/// A fixed two-level lattice: `View` < `Edit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "share_permission", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    /// Read-only access: browse, preview, download.
    View,
    /// Read-write access: create, rename, move, delete within scope.
    Edit,
}

impl SharePermission {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Edit => 2,
            Self::View => 1,
        }
    }

    /// Check if this permission grants at least the given level.
    pub fn has_at_least(&self, required: SharePermission) -> bool {
        self.privilege_level() >= required.privilege_level()
    }

    /// Check if this permission allows write operations.
    pub fn can_write(&self) -> bool {
        matches!(self, Self::Edit)
    }

    /// Most-permissive-wins combination of two grants.
    pub fn most_permissive(self, other: SharePermission) -> SharePermission {
        if self.privilege_level() >= other.privilege_level() {
            self
        } else {
            other
        }
    }

    /// Return the permission as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
        }
    }
}

impl fmt::Display for SharePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SharePermission {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "view" => Ok(Self::View),
            "edit" => Ok(Self::Edit),
            _ => Err(AppError::validation(format!(
                "Invalid share permission: '{s}'"
            ))),
        }
    }
}
