//! Shared resource loading for services that accept a [`SharedResource`].
//!
//! Resolves the owner, effective folder path, and trash state in the
//! bounded number of queries the authorization layer expects: the
//! resource row itself plus at most one ancestry check.

use std::sync::Arc;

use uuid::Uuid;

use filevault_authz::ResourceRef;
use filevault_core::FolderPath;
use filevault_core::error::AppError;
use filevault_core::result::AppResult;
use filevault_database::repositories::file::FileRepository;
use filevault_database::repositories::folder::FolderRepository;
use filevault_entity::resource::SharedResource;

/// A resource row reduced to what authorization needs.
#[derive(Debug, Clone)]
pub(crate) struct LoadedResource {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Containing folder's path for files, the folder's own path for
    /// folders, `None` for account-root files.
    pub folder_path: Option<FolderPath>,
    /// Whether the resource or any ancestor folder is trashed.
    pub trashed: bool,
}

impl LoadedResource {
    /// Borrow as the reference form the permission context evaluates.
    pub fn as_resource_ref(&self) -> ResourceRef<'_> {
        ResourceRef {
            id: self.id,
            owner_id: self.owner_id,
            folder_path: self.folder_path.as_ref(),
            trashed: self.trashed,
        }
    }
}

/// Loads files and folders into [`LoadedResource`] form.
#[derive(Clone)]
pub(crate) struct ResourceLookup {
    files: Arc<FileRepository>,
    folders: Arc<FolderRepository>,
}

impl ResourceLookup {
    pub fn new(files: Arc<FileRepository>, folders: Arc<FolderRepository>) -> Self {
        Self { files, folders }
    }

    /// Load one resource, or `None` if no row exists.
    pub async fn load(&self, resource: SharedResource) -> AppResult<Option<LoadedResource>> {
        match resource {
            SharedResource::File(id) => {
                let Some(file) = self.files.find_by_id(id).await? else {
                    return Ok(None);
                };
                let (folder_path, ancestors_trashed) = match file.folder_id {
                    Some(folder_id) => {
                        let folder =
                            self.folders.find_by_id(folder_id).await?.ok_or_else(|| {
                                AppError::internal("File references a missing folder")
                            })?;
                        let trashed =
                            self.folders.any_trashed(&folder.path.segments()).await?;
                        (Some(folder.path), trashed)
                    }
                    None => (None, false),
                };
                Ok(Some(LoadedResource {
                    id: file.id,
                    owner_id: file.owner_id,
                    folder_path,
                    trashed: file.is_trashed() || ancestors_trashed,
                }))
            }
            SharedResource::Folder(id) => {
                let Some(folder) = self.folders.find_by_id(id).await? else {
                    return Ok(None);
                };
                let trashed = self.folders.any_trashed(&folder.path.segments()).await?;
                Ok(Some(LoadedResource {
                    id: folder.id,
                    owner_id: folder.owner_id,
                    folder_path: Some(folder.path),
                    trashed,
                }))
            }
        }
    }
}
