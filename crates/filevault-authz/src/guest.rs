//! Guest token resolution.
//!
//! Maps a raw guest token to a scoped [`PermissionContext`]. The token
//! is hashed and matched against the share store; the resulting context
//! covers exactly the shared resource (plus the whole subtree for folder
//! links) and nothing else.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use filevault_core::result::AppResult;
use filevault_core::{AppError, FolderPath};
use filevault_database::repositories::audit::AuditRepository;
use filevault_database::repositories::folder::FolderRepository;
use filevault_database::repositories::share::ShareRepository;
use filevault_entity::folder::Folder;
use filevault_entity::resource::SharedResource;
use filevault_entity::share::{Share, SharePermission};

use crate::context::{FolderGrant, PermissionContext};
use crate::token;

/// The lookups guest resolution is allowed to perform.
#[async_trait]
pub trait GuestShareSource: Send + Sync {
    /// Find a guest-link share by token hash, expired or not.
    async fn find_guest_share(&self, token_hash: &str) -> AppResult<Option<Share>>;

    /// Load the shared folder (for folder links).
    async fn find_folder(&self, folder_id: Uuid) -> AppResult<Option<Folder>>;

    /// Record token use, at most once per share. Returns whether a new
    /// audit row was written.
    async fn record_guest_view(&self, share_id: Uuid) -> AppResult<bool>;
}

/// A successfully resolved guest token.
#[derive(Debug, Clone)]
pub struct GuestAccess {
    /// The matched share row.
    pub share_id: Uuid,
    /// What the token grants access to.
    pub resource: SharedResource,
    /// Path of the shared folder, for folder links.
    pub folder_path: Option<FolderPath>,
    /// The granted level.
    pub permission: SharePermission,
    /// Scoped context covering exactly the shared resource.
    pub context: PermissionContext,
}

/// Resolves raw guest tokens into scoped permission contexts.
#[derive(Clone)]
pub struct GuestAccessResolver<S> {
    source: S,
}

impl<S: GuestShareSource> GuestAccessResolver<S> {
    /// Creates a new guest access resolver.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Resolve a raw token.
    ///
    /// Unknown tokens are NotFound; a matched but expired share is Gone
    /// (the token format was valid and once worked). A share on a folder
    /// that has since been trashed resolves to NotFound like any other
    /// invisible resource.
    pub async fn resolve(&self, raw_token: &str) -> AppResult<GuestAccess> {
        let token_hash = token::hash_token(raw_token);

        let share = self
            .source
            .find_guest_share(&token_hash)
            .await?
            .ok_or_else(|| AppError::not_found("Invalid share link"))?;

        if share.is_expired(Utc::now()) {
            return Err(AppError::gone("Share link has expired"));
        }

        let resource = share.resource();
        let (context, folder_path) = match resource {
            SharedResource::File(file_id) => (
                PermissionContext::guest_for_file(file_id, share.permission),
                None,
            ),
            SharedResource::Folder(folder_id) => {
                let folder = self
                    .source
                    .find_folder(folder_id)
                    .await?
                    .filter(|f| !f.is_trashed())
                    .ok_or_else(|| AppError::not_found("Invalid share link"))?;
                let grant = FolderGrant {
                    folder_id,
                    path: folder.path.clone(),
                    permission: share.permission,
                };
                (
                    PermissionContext::guest_for_folder(grant),
                    Some(folder.path),
                )
            }
        };

        // Best-effort audit; a logging failure never blocks access.
        if let Err(e) = self.source.record_guest_view(share.id).await {
            warn!(share_id = %share.id, error = %e, "Failed to record guest view");
        }

        Ok(GuestAccess {
            share_id: share.id,
            resource,
            folder_path,
            permission: share.permission,
            context,
        })
    }
}

/// [`GuestShareSource`] backed by the PostgreSQL repositories.
#[derive(Clone)]
pub struct PgGuestShareSource {
    shares: Arc<ShareRepository>,
    folders: Arc<FolderRepository>,
    audit: Arc<AuditRepository>,
}

impl PgGuestShareSource {
    /// Creates a new database-backed guest share source.
    pub fn new(
        shares: Arc<ShareRepository>,
        folders: Arc<FolderRepository>,
        audit: Arc<AuditRepository>,
    ) -> Self {
        Self {
            shares,
            folders,
            audit,
        }
    }
}

#[async_trait]
impl GuestShareSource for PgGuestShareSource {
    async fn find_guest_share(&self, token_hash: &str) -> AppResult<Option<Share>> {
        Ok(self
            .shares
            .find_by_token_hash(token_hash)
            .await?
            .filter(|s| s.is_guest_link()))
    }

    async fn find_folder(&self, folder_id: Uuid) -> AppResult<Option<Folder>> {
        self.folders.find_by_id(folder_id).await
    }

    async fn record_guest_view(&self, share_id: Uuid) -> AppResult<bool> {
        self.audit.record_guest_view(share_id).await
    }
}
