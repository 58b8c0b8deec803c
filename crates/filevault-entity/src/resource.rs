//! Resource identification shared by shares, marks, and audit rows.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use filevault_core::AppError;

/// Kind of resource an entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "resource_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// A file resource.
    File,
    /// A folder resource.
    Folder,
}

impl ResourceType {
    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResourceType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "folder" => Ok(Self::Folder),
            _ => Err(AppError::validation(format!("Invalid resource type: '{s}'"))),
        }
    }
}

/// A typed reference to exactly one file or folder.
///
/// Shares store this as a pair of nullable columns with a XOR check
/// constraint; this enum is the in-memory form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "id")]
pub enum SharedResource {
    /// A shared file.
    File(Uuid),
    /// A shared folder.
    Folder(Uuid),
}

impl SharedResource {
    /// The resource id regardless of kind.
    pub fn id(&self) -> Uuid {
        match self {
            Self::File(id) | Self::Folder(id) => *id,
        }
    }

    /// The kind of this resource.
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Self::File(_) => ResourceType::File,
            Self::Folder(_) => ResourceType::Folder,
        }
    }

    /// Split into the `(file_id, folder_id)` column pair.
    pub fn into_columns(self) -> (Option<Uuid>, Option<Uuid>) {
        match self {
            Self::File(id) => (Some(id), None),
            Self::Folder(id) => (None, Some(id)),
        }
    }
}
