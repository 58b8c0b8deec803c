//! Batch authorization prechecks.
//!
//! Bulk operations are all-or-nothing: the entire batch is checked
//! against one immutable context before any row is touched, so a single
//! unauthorized or invisible member aborts with one typed error and zero
//! mutation.

use filevault_authz::{Action, PermissionContext, ResourceRef};
use filevault_core::result::AppResult;

/// Authorize `action` on every member of the batch.
///
/// Fails on the first member that is denied or not visible; the error
/// kind follows the member's decision (Forbidden or NotFound).
pub(crate) fn precheck_batch(
    ctx: &PermissionContext,
    action: Action,
    resources: &[ResourceRef<'_>],
    what: &str,
) -> AppResult<()> {
    for resource in resources {
        ctx.authorize(action, resource).require(what)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use uuid::Uuid;

    use filevault_authz::FolderGrant;
    use filevault_core::FolderPath;
    use filevault_core::error::ErrorKind;
    use filevault_entity::share::SharePermission;

    use super::*;

    fn editor_ctx(shared: &FolderPath) -> PermissionContext {
        PermissionContext::for_user(
            Uuid::new_v4(),
            false,
            HashMap::new(),
            vec![FolderGrant {
                folder_id: shared.leaf().unwrap(),
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
    fn test_fully_covered_batch_passes() {
        let shared = FolderPath::root(Uuid::new_v4());
        let ctx = editor_ctx(&shared);
        let batch = [file_in(&shared), file_in(&shared), file_in(&shared)];

        assert!(precheck_batch(&ctx, Action::FileMove, &batch, "move these files").is_ok());
    }

    #[test]
    fn test_one_unauthorized_member_poisons_batch() {
        let shared = FolderPath::root(Uuid::new_v4());
        let elsewhere = FolderPath::root(Uuid::new_v4());
        let ctx = editor_ctx(&shared);
        let batch = [file_in(&shared), file_in(&elsewhere)];

        let err =
            precheck_batch(&ctx, Action::FileMove, &batch, "move these files").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[test]
    fn test_trashed_member_reports_not_found() {
        let shared = FolderPath::root(Uuid::new_v4());
        let ctx = editor_ctx(&shared);
        let mut gone = file_in(&shared);
        gone.trashed = true;
        let batch = [file_in(&shared), gone];

        let err =
            precheck_batch(&ctx, Action::FileDelete, &batch, "delete these files").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_empty_batch_is_trivially_authorized() {
        let ctx = editor_ctx(&FolderPath::root(Uuid::new_v4()));
        assert!(precheck_batch(&ctx, Action::FileMove, &[], "move these files").is_ok());
    }
}
