//! Share service.
//!
//! Creation deduplicates per the share-store rules (one live row per
//! recipient and resource, one canonical guest-link row per resource).
//! Revocation deletes the row and then clears the revoked recipient's
//! favorites and tags on the affected subtree, best-effort: a cleanup
//! failure is logged and never rolls back the revoke.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use filevault_authz::{PermissionContext, token};
use filevault_core::error::AppError;
use filevault_core::result::AppResult;
use filevault_database::repositories::file::FileRepository;
use filevault_database::repositories::folder::FolderRepository;
use filevault_database::repositories::mark::MarkRepository;
use filevault_database::repositories::share::ShareRepository;
use filevault_entity::resource::{ResourceType, SharedResource};
use filevault_entity::share::{Share, SharePermission};

use crate::lookup::ResourceLookup;

/// A freshly minted guest link. `token` is the only copy of the raw
/// token; storage keeps its hash.
#[derive(Debug, Clone)]
pub struct GuestLink {
    /// The canonical guest-link share row.
    pub share: Share,
    /// The raw token, returned exactly once.
    pub token: String,
}

/// Service for creating, listing, and revoking shares.
#[derive(Clone)]
pub struct ShareService {
    shares: Arc<ShareRepository>,
    folders: Arc<FolderRepository>,
    marks: Arc<MarkRepository>,
    lookup: ResourceLookup,
}

impl ShareService {
    /// Create a new share service.
    pub fn new(
        shares: Arc<ShareRepository>,
        files: Arc<FileRepository>,
        folders: Arc<FolderRepository>,
        marks: Arc<MarkRepository>,
    ) -> Self {
        let lookup = ResourceLookup::new(files, Arc::clone(&folders));
        Self {
            shares,
            folders,
            marks,
            lookup,
        }
    }

    /// Share a resource with a named recipient.
    ///
    /// Re-sharing with the same recipient updates the existing row in
    /// place rather than stacking a duplicate.
    pub async fn share_with_user(
        &self,
        ctx: &PermissionContext,
        resource: SharedResource,
        recipient: Uuid,
        permission: SharePermission,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<Share> {
        let owner_id = self.visible_owner(resource).await?;
        let principal = ensure_can_manage(ctx, owner_id)?;
        if recipient == owner_id {
            return Err(AppError::validation(
                "A resource cannot be shared with its owner",
            ));
        }

        let share = self
            .shares
            .upsert_direct(resource, principal, recipient, permission, expires_at)
            .await?;
        info!(
            share_id = %share.id,
            resource = %resource.id(),
            recipient = %recipient,
            permission = ?permission,
            "Shared resource with user"
        );
        Ok(share)
    }

    /// Create (or refresh) the guest link for a resource and return the
    /// raw token.
    ///
    /// Guest links are always view level; edit access requires a named
    /// recipient. Repeated calls reuse the canonical row and invalidate
    /// the previous token by replacing its stored hash.
    pub async fn create_guest_link(
        &self,
        ctx: &PermissionContext,
        resource: SharedResource,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<GuestLink> {
        let owner_id = self.visible_owner(resource).await?;
        let principal = ensure_can_manage(ctx, owner_id)?;

        let raw_token = token::generate_token();
        let share = self
            .shares
            .upsert_guest_link(
                resource,
                principal,
                SharePermission::View,
                expires_at,
                &token::hash_token(&raw_token),
            )
            .await?;
        info!(share_id = %share.id, resource = %resource.id(), "Issued guest link");
        Ok(GuestLink {
            share,
            token: raw_token,
        })
    }

    /// Revoke a share.
    ///
    /// After the row is gone, the revoked recipient's favorites and tags
    /// on the resource (the whole subtree for folder shares) are removed
    /// so their views stop referencing things they can no longer open.
    /// That cleanup is best-effort; the revoke itself never rolls back.
    pub async fn revoke_share(&self, ctx: &PermissionContext, share_id: Uuid) -> AppResult<()> {
        let share = self
            .shares
            .find_by_id(share_id)
            .await?
            .ok_or_else(|| AppError::not_found("Share not found"))?;
        let resource = share.resource();

        let owner_id = match self.lookup.load(resource).await? {
            Some(loaded) => Some(loaded.owner_id),
            None => None,
        };
        let may_manage = ctx.is_admin()
            || ctx.principal() == Some(share.shared_by)
            || (owner_id.is_some() && ctx.principal() == owner_id);
        if !may_manage {
            return Err(AppError::forbidden(
                "Only the owner may manage shares on this resource",
            ));
        }

        self.shares.delete(share.id).await?;
        info!(share_id = %share.id, resource = %resource.id(), "Revoked share");

        if let Some(recipient) = share.shared_with {
            self.cleanup_recipient_marks(recipient, resource).await;
        }
        Ok(())
    }

    /// List all shares on a resource, newest first.
    pub async fn list_shares_for_resource(
        &self,
        ctx: &PermissionContext,
        resource: SharedResource,
    ) -> AppResult<Vec<Share>> {
        let owner_id = self.visible_owner(resource).await?;
        ensure_can_manage(ctx, owner_id)?;
        self.shares.find_for_resource(resource).await
    }

    /// Remove redundant guest-link rows left by historical races,
    /// keeping the newest per resource. Idempotent.
    pub async fn cleanup_duplicate_guest_links(&self) -> AppResult<u64> {
        let removed = self.shares.cleanup_duplicate_guest_links().await?;
        if removed > 0 {
            info!(removed, "Removed duplicate guest links");
        }
        Ok(removed)
    }

    /// Load the resource and return its owner, treating trashed and
    /// absent identically.
    async fn visible_owner(&self, resource: SharedResource) -> AppResult<Uuid> {
        let loaded = self
            .lookup
            .load(resource)
            .await?
            .ok_or_else(|| AppError::not_found("Resource not found"))?;
        if loaded.trashed {
            return Err(AppError::not_found("Resource not found"));
        }
        Ok(loaded.owner_id)
    }

    async fn cleanup_recipient_marks(&self, recipient: Uuid, resource: SharedResource) {
        let result = match resource {
            SharedResource::File(file_id) => {
                self.marks
                    .remove_for_user_on_resource(recipient, ResourceType::File, file_id)
                    .await
            }
            SharedResource::Folder(folder_id) => match self.folders.find_by_id(folder_id).await {
                Ok(Some(folder)) => {
                    self.marks
                        .remove_for_user_under_path(recipient, &folder.path)
                        .await
                }
                Ok(None) => Ok(0),
                Err(e) => Err(e),
            },
        };

        match result {
            Ok(removed) if removed > 0 => {
                info!(recipient = %recipient, removed, "Cleared revoked recipient's marks");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(
                    recipient = %recipient,
                    resource = %resource.id(),
                    error = %e,
                    "Failed to clear marks after revoke"
                );
            }
        }
    }
}

/// Only the resource owner or an admin may manage its shares. Returns
/// the acting principal.
fn ensure_can_manage(ctx: &PermissionContext, owner_id: Uuid) -> AppResult<Uuid> {
    let principal = ctx
        .principal()
        .ok_or_else(|| AppError::forbidden("Guests cannot manage shares"))?;
    if principal != owner_id && !ctx.is_admin() {
        return Err(AppError::forbidden(
            "Only the owner may manage shares on this resource",
        ));
    }
    Ok(principal)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use filevault_core::error::ErrorKind;

    fn user_ctx(id: Uuid) -> PermissionContext {
        PermissionContext::for_user(id, false, HashMap::new(), Vec::new())
    }

    #[test]
    fn test_owner_and_admin_may_manage() {
        let owner = Uuid::new_v4();
        assert_eq!(ensure_can_manage(&user_ctx(owner), owner).unwrap(), owner);

        let admin = Uuid::new_v4();
        let admin_ctx = PermissionContext::for_user(admin, true, HashMap::new(), Vec::new());
        assert_eq!(ensure_can_manage(&admin_ctx, owner).unwrap(), admin);
    }

    #[test]
    fn test_others_and_guests_may_not_manage() {
        let owner = Uuid::new_v4();
        let err = ensure_can_manage(&user_ctx(Uuid::new_v4()), owner).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let guest = PermissionContext::guest_for_file(Uuid::new_v4(), SharePermission::View);
        let err = ensure_can_manage(&guest, owner).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }
}
