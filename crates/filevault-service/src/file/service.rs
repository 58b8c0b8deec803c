//! File service.
//!
//! Files carry no path of their own; their position is the containing
//! folder's materialized path. Single operations and their bulk forms
//! share the same authorization and validation rules; bulk forms
//! precheck the whole batch and then apply it in one transaction.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use filevault_authz::{Action, PermissionContext, ResourceRef, authorize_subtree_move};
use filevault_core::error::AppError;
use filevault_core::result::AppResult;
use filevault_database::repositories::file::FileRepository;
use filevault_database::repositories::folder::FolderRepository;
use filevault_entity::file::File;
use filevault_entity::folder::Folder;

use super::bulk::precheck_batch;

/// Service for single and batched file mutations.
#[derive(Clone)]
pub struct FileService {
    files: Arc<FileRepository>,
    folders: Arc<FolderRepository>,
}

impl FileService {
    /// Create a new file service.
    pub fn new(files: Arc<FileRepository>, folders: Arc<FolderRepository>) -> Self {
        Self { files, folders }
    }

    /// Rename a file.
    pub async fn rename_file(
        &self,
        ctx: &PermissionContext,
        file_id: Uuid,
        new_name: &str,
    ) -> AppResult<File> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AppError::validation("Name must not be empty"));
        }

        let file = self.load(file_id).await?;
        let location = self.locate(&file).await?;
        ctx.authorize(Action::FileRename, &location.as_ref(&file))
            .require("rename this file")?;

        if file.name == new_name {
            return Ok(file);
        }
        if let Some(sibling) = self
            .files
            .find_sibling_by_name(file.owner_id, file.folder_id, new_name)
            .await?
            && sibling.id != file.id
        {
            return Err(AppError::validation(
                "A file with this name already exists here",
            ));
        }

        let renamed = self.files.rename(file.id, new_name).await?;
        info!(file_id = %renamed.id, "Renamed file");
        Ok(renamed)
    }

    /// Move a file into another folder (`None` = account root).
    ///
    /// A move to the current folder is a successful no-op. Non-owner
    /// editors may only move within the shared subtree granting their
    /// access.
    pub async fn move_file(
        &self,
        ctx: &PermissionContext,
        file_id: Uuid,
        dest_folder_id: Option<Uuid>,
    ) -> AppResult<File> {
        let file = self.load(file_id).await?;
        let location = self.locate(&file).await?;
        let source = location.as_ref(&file);
        ctx.authorize(Action::FileMove, &source)
            .require("move this file")?;

        if file.folder_id == dest_folder_id {
            return Ok(file);
        }

        let dest = self.load_destination(dest_folder_id).await?;
        if self
            .files
            .find_sibling_by_name(file.owner_id, dest_folder_id, &file.name)
            .await?
            .is_some()
        {
            return Err(AppError::validation(
                "A file with this name already exists in the destination",
            ));
        }

        authorize_subtree_move(ctx, &source, dest.as_ref().map(|d| &d.path))
            .require("move this file to that destination")?;

        let moved = self.files.move_file(file.id, dest_folder_id).await?;
        info!(file_id = %moved.id, dest_folder = ?dest_folder_id, "Moved file");
        Ok(moved)
    }

    /// Trash a single file.
    pub async fn trash_file(&self, ctx: &PermissionContext, file_id: Uuid) -> AppResult<File> {
        let file = self.load(file_id).await?;
        let location = self.locate(&file).await?;
        ctx.authorize(Action::FileDelete, &location.as_ref(&file))
            .require("delete this file")?;

        let trashed = self.files.trash(file.id).await?;
        info!(file_id = %trashed.id, "Trashed file");
        Ok(trashed)
    }

    /// Move a batch of files into one destination folder, all or nothing.
    ///
    /// The whole batch is authorized against the caller's context before
    /// any row changes; the applied batch runs in one transaction whose
    /// row count must equal the batch size.
    pub async fn bulk_move(
        &self,
        ctx: &PermissionContext,
        file_ids: &[Uuid],
        dest_folder_id: Option<Uuid>,
    ) -> AppResult<u64> {
        if file_ids.is_empty() {
            return Ok(0);
        }

        let (files, locations) = self.load_batch(file_ids).await?;
        let refs: Vec<ResourceRef<'_>> = files
            .iter()
            .map(|f| locations.resource_ref(f))
            .collect();
        precheck_batch(ctx, Action::FileMove, &refs, "move these files")?;

        let dest = self.load_destination(dest_folder_id).await?;

        let mut names = HashSet::new();
        for file in &files {
            if !names.insert(file.name.as_str()) {
                return Err(AppError::validation(
                    "The batch contains duplicate file names",
                ));
            }
            if file.folder_id == dest_folder_id {
                continue;
            }
            if self
                .files
                .find_sibling_by_name(file.owner_id, dest_folder_id, &file.name)
                .await?
                .is_some()
            {
                return Err(AppError::validation(
                    "A file with this name already exists in the destination",
                ));
            }
        }

        for source in &refs {
            authorize_subtree_move(ctx, source, dest.as_ref().map(|d| &d.path))
                .require("move these files to that destination")?;
        }

        let moved = self.files.move_many(file_ids, dest_folder_id).await?;
        info!(count = moved, dest_folder = ?dest_folder_id, "Bulk-moved files");
        Ok(moved)
    }

    /// Trash a batch of files, all or nothing.
    pub async fn bulk_trash(&self, ctx: &PermissionContext, file_ids: &[Uuid]) -> AppResult<u64> {
        if file_ids.is_empty() {
            return Ok(0);
        }

        let (files, locations) = self.load_batch(file_ids).await?;
        let refs: Vec<ResourceRef<'_>> = files
            .iter()
            .map(|f| locations.resource_ref(f))
            .collect();
        precheck_batch(ctx, Action::FileDelete, &refs, "delete these files")?;

        let trashed = self.files.trash_many(file_ids).await?;
        info!(count = trashed, "Bulk-trashed files");
        Ok(trashed)
    }

    async fn load(&self, file_id: Uuid) -> AppResult<File> {
        self.files
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))
    }

    async fn locate(&self, file: &File) -> AppResult<Location> {
        let (folder, ancestors_trashed) = match file.folder_id {
            Some(folder_id) => {
                let folder = self
                    .folders
                    .find_by_id(folder_id)
                    .await?
                    .ok_or_else(|| AppError::internal("File references a missing folder"))?;
                let trashed = self.folders.any_trashed(&folder.path.segments()).await?;
                (Some(folder), trashed)
            }
            None => (None, false),
        };
        Ok(Location {
            folder,
            ancestors_trashed,
        })
    }

    /// Resolve a destination folder, rejecting trashed targets.
    async fn load_destination(&self, dest_folder_id: Option<Uuid>) -> AppResult<Option<Folder>> {
        let Some(id) = dest_folder_id else {
            return Ok(None);
        };
        let folder = self
            .folders
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Destination folder not found"))?;
        if self.folders.any_trashed(&folder.path.segments()).await? {
            return Err(AppError::validation("Destination folder is in the trash"));
        }
        Ok(Some(folder))
    }

    /// Load a batch with every containing folder resolved once.
    async fn load_batch(&self, file_ids: &[Uuid]) -> AppResult<(Vec<File>, Locations)> {
        let files = self.files.find_many(file_ids).await?;
        if files.len() != file_ids.len() {
            return Err(AppError::not_found("One or more files were not found"));
        }

        let mut folders = HashMap::new();
        let mut trashed = HashMap::new();
        for file in &files {
            let Some(folder_id) = file.folder_id else {
                continue;
            };
            if folders.contains_key(&folder_id) {
                continue;
            }
            let folder = self
                .folders
                .find_by_id(folder_id)
                .await?
                .ok_or_else(|| AppError::internal("File references a missing folder"))?;
            trashed.insert(
                folder_id,
                self.folders.any_trashed(&folder.path.segments()).await?,
            );
            folders.insert(folder_id, folder);
        }

        Ok((files, Locations { folders, trashed }))
    }
}

/// A single file's resolved position.
struct Location {
    folder: Option<Folder>,
    ancestors_trashed: bool,
}

impl Location {
    fn as_ref<'a>(&'a self, file: &File) -> ResourceRef<'a> {
        ResourceRef {
            id: file.id,
            owner_id: file.owner_id,
            folder_path: self.folder.as_ref().map(|f| &f.path),
            trashed: file.is_trashed() || self.ancestors_trashed,
        }
    }
}

/// Containing folders for a batch, each resolved once.
struct Locations {
    folders: HashMap<Uuid, Folder>,
    trashed: HashMap<Uuid, bool>,
}

impl Locations {
    fn resource_ref<'a>(&'a self, file: &File) -> ResourceRef<'a> {
        ResourceRef {
            id: file.id,
            owner_id: file.owner_id,
            folder_path: file
                .folder_id
                .and_then(|id| self.folders.get(&id))
                .map(|f| &f.path),
            trashed: file.is_trashed()
                || file
                    .folder_id
                    .and_then(|id| self.trashed.get(&id))
                    .copied()
                    .unwrap_or(false),
        }
    }
}
