//! Mark service: bulk favorites and tag assignment.
//!
//! Marks are per-user annotations, so the only authorization needed is
//! view access to each member. Like the file batches, the whole batch is
//! prechecked against one context and applied in one transaction.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use filevault_authz::{Action, PermissionContext};
use filevault_core::error::AppError;
use filevault_core::result::AppResult;
use filevault_database::repositories::file::FileRepository;
use filevault_database::repositories::folder::FolderRepository;
use filevault_database::repositories::mark::MarkRepository;
use filevault_entity::resource::{ResourceType, SharedResource};

use crate::lookup::{LoadedResource, ResourceLookup};

/// Service for favorites and tag assignments.
#[derive(Clone)]
pub struct MarkService {
    marks: Arc<MarkRepository>,
    lookup: ResourceLookup,
}

impl MarkService {
    /// Create a new mark service.
    pub fn new(
        marks: Arc<MarkRepository>,
        files: Arc<FileRepository>,
        folders: Arc<FolderRepository>,
    ) -> Self {
        Self {
            marks,
            lookup: ResourceLookup::new(files, folders),
        }
    }

    /// Favorite a batch of resources, all or nothing.
    ///
    /// Every member must be viewable by the caller; re-favoriting an
    /// already favorited resource is a per-row no-op.
    pub async fn bulk_favorite(
        &self,
        ctx: &PermissionContext,
        resources: &[SharedResource],
    ) -> AppResult<()> {
        let principal = ctx
            .principal()
            .ok_or_else(|| AppError::forbidden("Guests cannot add favorites"))?;
        if resources.is_empty() {
            return Ok(());
        }

        self.precheck_viewable(ctx, resources, "favorite these items")
            .await?;
        self.marks
            .add_favorites(principal, &to_pairs(resources))
            .await?;
        info!(user_id = %principal, count = resources.len(), "Added favorites");
        Ok(())
    }

    /// Assign one tag to a batch of resources, all or nothing.
    pub async fn bulk_assign_tag(
        &self,
        ctx: &PermissionContext,
        tag: &str,
        resources: &[SharedResource],
    ) -> AppResult<()> {
        let principal = ctx
            .principal()
            .ok_or_else(|| AppError::forbidden("Guests cannot assign tags"))?;
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(AppError::validation("Tag must not be empty"));
        }
        if resources.is_empty() {
            return Ok(());
        }

        self.precheck_viewable(ctx, resources, "tag these items")
            .await?;
        self.marks
            .add_tag(principal, tag, &to_pairs(resources))
            .await?;
        info!(user_id = %principal, tag, count = resources.len(), "Assigned tag");
        Ok(())
    }

    /// Require view access on every member before any row is written.
    async fn precheck_viewable(
        &self,
        ctx: &PermissionContext,
        resources: &[SharedResource],
        what: &str,
    ) -> AppResult<()> {
        let mut loaded: Vec<LoadedResource> = Vec::with_capacity(resources.len());
        for resource in resources {
            let item = self
                .lookup
                .load(*resource)
                .await?
                .ok_or_else(|| AppError::not_found(format!("{what}: resource not found")))?;
            loaded.push(item);
        }

        for (resource, item) in resources.iter().zip(&loaded) {
            let action = match resource {
                SharedResource::File(_) => Action::FileRead,
                SharedResource::Folder(_) => Action::FolderRead,
            };
            ctx.authorize(action, &item.as_resource_ref()).require(what)?;
        }
        Ok(())
    }
}

fn to_pairs(resources: &[SharedResource]) -> Vec<(ResourceType, Uuid)> {
    resources
        .iter()
        .map(|r| (r.resource_type(), r.id()))
        .collect()
}
