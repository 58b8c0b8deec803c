//! Actions checked against a permission context.

use serde::{Deserialize, Serialize};

use filevault_entity::share::SharePermission;

/// Actions that can be authorized against a [`crate::PermissionContext`].
///
/// Download and preview imply view; create, rename, move, and delete
/// within scope imply edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// View/read a file's metadata or listing entry.
    FileRead,
    /// Download a file's content.
    FileDownload,
    /// Render a file preview.
    FilePreview,
    /// Rename a file.
    FileRename,
    /// Move a file.
    FileMove,
    /// Trash a file.
    FileDelete,
    /// View/browse a folder.
    FolderRead,
    /// Create a child inside a folder.
    FolderCreate,
    /// Rename a folder.
    FolderRename,
    /// Move a folder.
    FolderMove,
    /// Trash a folder.
    FolderDelete,
}

impl Action {
    /// The minimum share permission this action requires.
    pub fn required_permission(&self) -> SharePermission {
        match self {
            Self::FileRead | Self::FileDownload | Self::FilePreview | Self::FolderRead => {
                SharePermission::View
            }
            Self::FileRename
            | Self::FileMove
            | Self::FileDelete
            | Self::FolderCreate
            | Self::FolderRename
            | Self::FolderMove
            | Self::FolderDelete => SharePermission::Edit,
        }
    }

    /// Return the action as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileRead => "file:read",
            Self::FileDownload => "file:download",
            Self::FilePreview => "file:preview",
            Self::FileRename => "file:rename",
            Self::FileMove => "file:move",
            Self::FileDelete => "file:delete",
            Self::FolderRead => "folder:read",
            Self::FolderCreate => "folder:create",
            Self::FolderRename => "folder:rename",
            Self::FolderMove => "folder:move",
            Self::FolderDelete => "folder:delete",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
