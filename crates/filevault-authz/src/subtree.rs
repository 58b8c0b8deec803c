//! Subtree boundary enforcement for non-owner editors.
//!
//! A principal whose only write access comes from a folder share may
//! move or re-home resources exclusively *within* the subtree of an
//! `edit` grant that covers the source. Account root, unrelated folders,
//! and other shared subtrees are all out of bounds, even though the
//! principal holds `edit` somewhere. Owners and admins are exempt.

use filevault_core::FolderPath;

use crate::context::{PermissionContext, ResourceRef};
use crate::decision::Decision;

/// Decide whether a move of `source` to `dest_path` stays inside the
/// shared subtree that authorizes it.
///
/// `dest_path` is the destination parent folder's path; `None` means the
/// account root, which is never inside a shared subtree.
pub fn authorize_subtree_move(
    ctx: &PermissionContext,
    source: &ResourceRef<'_>,
    dest_path: Option<&FolderPath>,
) -> Decision {
    if ctx.is_admin() || ctx.principal() == Some(source.owner_id) {
        return Decision::Allow;
    }

    let Some(source_path) = source.folder_path else {
        // Non-owners have no folder grant covering an account-root
        // resource, so there is no subtree to stay inside.
        return Decision::Deny;
    };

    let covering = ctx.covering_edit_grants(source_path);
    if covering.is_empty() {
        return Decision::Deny;
    }

    let Some(dest) = dest_path else {
        return Decision::Deny;
    };

    // The destination must sit under one of the same grants that
    // authorized the source operation.
    if covering.iter().any(|g| g.path.covers(dest)) {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use uuid::Uuid;

    use filevault_entity::share::SharePermission;

    use crate::context::FolderGrant;

    use super::*;

    fn editor_ctx(shared: &FolderPath) -> PermissionContext {
        PermissionContext::for_user(
            Uuid::new_v4(),
            false,
            HashMap::new(),
            vec![FolderGrant {
                folder_id: shared.leaf().expect("non-empty path"),
                path: shared.clone(),
                permission: SharePermission::Edit,
            }],
        )
    }

    fn file_in<'a>(path: &'a FolderPath) -> ResourceRef<'a> {
        ResourceRef {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            folder_path: Some(path),
            trashed: false,
        }
    }

    #[test]
    fn test_move_within_shared_subtree_allowed() {
        let shared = FolderPath::root(Uuid::new_v4());
        let src = shared.child(Uuid::new_v4());
        let dst = shared.child(Uuid::new_v4());
        let ctx = editor_ctx(&shared);

        let decision = authorize_subtree_move(&ctx, &file_in(&src), Some(&dst));
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn test_move_to_account_root_denied() {
        let shared = FolderPath::root(Uuid::new_v4());
        let src = shared.child(Uuid::new_v4());
        let ctx = editor_ctx(&shared);

        let decision = authorize_subtree_move(&ctx, &file_in(&src), None);
        assert_eq!(decision, Decision::Deny);
    }

    #[test]
    fn test_move_to_unrelated_folder_denied() {
        let shared = FolderPath::root(Uuid::new_v4());
        let src = shared.child(Uuid::new_v4());
        let elsewhere = FolderPath::root(Uuid::new_v4());
        let ctx = editor_ctx(&shared);

        let decision = authorize_subtree_move(&ctx, &file_in(&src), Some(&elsewhere));
        assert_eq!(decision, Decision::Deny);
    }

    #[test]
    fn test_move_across_two_shared_subtrees_denied() {
        // Edit on both subtrees, but no single grant covers source and
        // destination together.
        let a = FolderPath::root(Uuid::new_v4());
        let b = FolderPath::root(Uuid::new_v4());
        let ctx = PermissionContext::for_user(
            Uuid::new_v4(),
            false,
            HashMap::new(),
            vec![
                FolderGrant {
                    folder_id: a.leaf().unwrap(),
                    path: a.clone(),
                    permission: SharePermission::Edit,
                },
                FolderGrant {
                    folder_id: b.leaf().unwrap(),
                    path: b.clone(),
                    permission: SharePermission::Edit,
                },
            ],
        );

        let src = a.child(Uuid::new_v4());
        let decision = authorize_subtree_move(&ctx, &file_in(&src), Some(&b));
        assert_eq!(decision, Decision::Deny);
    }

    #[test]
    fn test_view_grant_does_not_anchor_moves() {
        let shared = FolderPath::root(Uuid::new_v4());
        let src = shared.child(Uuid::new_v4());
        let ctx = PermissionContext::for_user(
            Uuid::new_v4(),
            false,
            HashMap::new(),
            vec![FolderGrant {
                folder_id: shared.leaf().unwrap(),
                path: shared.clone(),
                permission: SharePermission::View,
            }],
        );

        let decision = authorize_subtree_move(&ctx, &file_in(&src), Some(&shared));
        assert_eq!(decision, Decision::Deny);
    }

    #[test]
    fn test_owner_and_admin_exempt() {
        let owner = Uuid::new_v4();
        let shared = FolderPath::root(Uuid::new_v4());
        let src = shared.child(Uuid::new_v4());
        let elsewhere = FolderPath::root(Uuid::new_v4());

        let mut source = file_in(&src);
        source.owner_id = owner;

        let owner_ctx = PermissionContext::for_user(owner, false, HashMap::new(), Vec::new());
        assert_eq!(
            authorize_subtree_move(&owner_ctx, &source, Some(&elsewhere)),
            Decision::Allow
        );

        let admin_ctx =
            PermissionContext::for_user(Uuid::new_v4(), true, HashMap::new(), Vec::new());
        assert_eq!(
            authorize_subtree_move(&admin_ctx, &source, Some(&elsewhere)),
            Decision::Allow
        );
    }
}
