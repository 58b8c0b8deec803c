//! Authorization outcomes.

use serde::{Deserialize, Serialize};

use filevault_core::AppError;
use filevault_entity::share::SharePermission;

/// Outcome of an authorization check.
///
/// `NotFound` is deliberate: for trashed resources and for guests probing
/// outside their token's scope, denial must not confirm existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Access granted.
    Allow,
    /// Principal and resource both resolvable; permission insufficient.
    Deny,
    /// Resource absent, trashed, or outside the caller's visibility.
    NotFound,
}

impl Decision {
    /// Whether the decision grants access.
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Convert into a `Result`, mapping denials to the error taxonomy.
    pub fn require(self, what: &str) -> Result<(), AppError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny => Err(AppError::forbidden(format!(
                "You do not have permission to {what}"
            ))),
            Self::NotFound => Err(AppError::not_found(format!("{what}: resource not found"))),
        }
    }
}

/// A granted access level together with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Access {
    /// The effective permission level.
    pub permission: SharePermission,
    /// Where the grant came from.
    pub source: AccessSource,
}

/// Where an effective permission was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessSource {
    /// The principal owns the resource.
    Owner,
    /// System admin override.
    AdminOverride,
    /// A share attached directly to the file.
    DirectShare,
    /// A share on an ancestor folder, inherited by path prefix.
    FolderShare,
    /// Possession of a guest link token.
    GuestLink,
}
