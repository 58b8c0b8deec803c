//! Folder service: the materialized-path maintainer.
//!
//! Every mutation authorizes against the caller's [`PermissionContext`]
//! first, then validates structure, then writes. The path invariant
//! (`path = parent.path + id + "/"`) is preserved by computing the new
//! path here and letting the repository rewrite the whole subtree in one
//! transaction.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use filevault_authz::{Action, PermissionContext, ResourceRef, authorize_subtree_move};
use filevault_core::FolderPath;
use filevault_core::error::AppError;
use filevault_core::result::AppResult;
use filevault_database::repositories::folder::FolderRepository;
use filevault_entity::folder::{CreateFolder, Folder};

use super::paths;

/// Service for folder creation and tree rewrites.
#[derive(Clone)]
pub struct FolderService {
    folders: Arc<FolderRepository>,
}

impl FolderService {
    /// Create a new folder service.
    pub fn new(folders: Arc<FolderRepository>) -> Self {
        Self { folders }
    }

    /// Create a folder under `parent_id` (`None` = account root).
    ///
    /// Root folders belong to the caller; nested folders belong to the
    /// parent's owner. The sibling-name check spans live and trashed
    /// rows, so a name stays taken until its trashed holder is purged.
    pub async fn create_folder(
        &self,
        ctx: &PermissionContext,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Folder> {
        let name = valid_name(name)?;
        let principal = ctx
            .principal()
            .ok_or_else(|| AppError::forbidden("Guests cannot create folders"))?;

        let (owner_id, parent_path) = match parent_id {
            Some(parent_id) => {
                let parent = self.load(parent_id).await?;
                let trashed = self.subtree_trashed(&parent.path).await?;
                ctx.authorize(Action::FolderCreate, &folder_ref(&parent, trashed))
                    .require("create folders here")?;
                (parent.owner_id, Some(parent.path))
            }
            None => (principal, None),
        };

        if self
            .folders
            .find_sibling_by_name(owner_id, parent_id, name)
            .await?
            .is_some()
        {
            return Err(AppError::validation(
                "A folder with this name already exists here",
            ));
        }

        let id = Uuid::new_v4();
        let path = match &parent_path {
            Some(parent) => parent.child(id),
            None => FolderPath::root(id),
        };
        let folder = self
            .folders
            .create(&CreateFolder {
                id,
                owner_id,
                parent_id,
                name: name.to_string(),
                path,
            })
            .await?;

        info!(folder_id = %folder.id, owner_id = %owner_id, "Created folder");
        Ok(folder)
    }

    /// Rename a folder. Names are metadata; no path changes.
    pub async fn rename_folder(
        &self,
        ctx: &PermissionContext,
        folder_id: Uuid,
        new_name: &str,
    ) -> AppResult<Folder> {
        let new_name = valid_name(new_name)?;
        let folder = self.load(folder_id).await?;
        let trashed = self.subtree_trashed(&folder.path).await?;
        ctx.authorize(Action::FolderRename, &folder_ref(&folder, trashed))
            .require("rename this folder")?;

        if folder.name == new_name {
            return Ok(folder);
        }
        if let Some(sibling) = self
            .folders
            .find_sibling_by_name(folder.owner_id, folder.parent_id, new_name)
            .await?
            && sibling.id != folder.id
        {
            return Err(AppError::validation(
                "A folder with this name already exists here",
            ));
        }

        let renamed = self.folders.rename(folder.id, new_name).await?;
        info!(folder_id = %renamed.id, "Renamed folder");
        Ok(renamed)
    }

    /// Move a folder under a new parent (`None` = account root),
    /// rewriting every descendant path.
    ///
    /// A move to the current location is a successful no-op. Non-owner
    /// editors are additionally pinned inside the shared subtree that
    /// grants their access.
    pub async fn move_folder(
        &self,
        ctx: &PermissionContext,
        folder_id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> AppResult<Folder> {
        let folder = self.load(folder_id).await?;
        let trashed = self.subtree_trashed(&folder.path).await?;
        let source = folder_ref(&folder, trashed);
        ctx.authorize(Action::FolderMove, &source)
            .require("move this folder")?;

        if paths::is_same_location(&folder, new_parent_id) {
            return Ok(folder);
        }

        let dest = match new_parent_id {
            Some(id) => Some(self.load(id).await?),
            None => None,
        };
        let dest_trashed = match &dest {
            Some(d) => self.subtree_trashed(&d.path).await?,
            None => false,
        };
        paths::validate_move(&folder, dest.as_ref(), dest_trashed)?;

        if self
            .folders
            .find_sibling_by_name(folder.owner_id, new_parent_id, &folder.name)
            .await?
            .is_some()
        {
            return Err(AppError::validation(
                "A folder with this name already exists in the destination",
            ));
        }

        authorize_subtree_move(ctx, &source, dest.as_ref().map(|d| &d.path))
            .require("move this folder to that destination")?;

        let new_path = paths::destination_path(&folder, dest.as_ref());
        let moved = self
            .folders
            .move_subtree(folder.id, new_parent_id, &folder.path, &new_path)
            .await?;

        info!(
            folder_id = %moved.id,
            old_path = %folder.path,
            new_path = %moved.path,
            "Moved folder subtree"
        );
        Ok(moved)
    }

    /// Trash a folder and everything beneath it.
    pub async fn trash_folder(&self, ctx: &PermissionContext, folder_id: Uuid) -> AppResult<u64> {
        let folder = self.load(folder_id).await?;
        let trashed = self.subtree_trashed(&folder.path).await?;
        ctx.authorize(Action::FolderDelete, &folder_ref(&folder, trashed))
            .require("delete this folder")?;

        let affected = self.folders.trash_subtree(&folder.path).await?;
        info!(folder_id = %folder.id, rows = affected, "Trashed folder subtree");
        Ok(affected)
    }

    async fn load(&self, folder_id: Uuid) -> AppResult<Folder> {
        self.folders
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    /// Whether the folder or any ancestor is trashed, in one query over
    /// the path's id segments.
    async fn subtree_trashed(&self, path: &FolderPath) -> AppResult<bool> {
        self.folders.any_trashed(&path.segments()).await
    }
}

fn folder_ref(folder: &Folder, trashed: bool) -> ResourceRef<'_> {
    ResourceRef {
        id: folder.id,
        owner_id: folder.owner_id,
        folder_path: Some(&folder.path),
        trashed,
    }
}

fn valid_name(name: &str) -> AppResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Name must not be empty"));
    }
    if trimmed.contains('/') {
        return Err(AppError::validation("Name must not contain '/'"));
    }
    Ok(trimmed)
}
