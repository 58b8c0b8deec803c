//! Immutable per-request permission context and its evaluation rules.

pub mod builder;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use filevault_core::FolderPath;
use filevault_entity::share::SharePermission;

use crate::action::Action;
use crate::decision::{Access, AccessSource, Decision};

/// A folder share held by the principal, carrying the folder's current
/// materialized path so evaluation is a pure string-prefix test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderGrant {
    /// The shared folder.
    pub folder_id: Uuid,
    /// The folder's path at context-build time.
    pub path: FolderPath,
    /// Permission granted on the whole subtree.
    pub permission: SharePermission,
}

/// The resource being checked, with its ancestry flags already resolved.
///
/// Callers load owner id and folder path alongside the resource itself;
/// the context never performs I/O to answer a question. `folder_path` is
/// the containing folder's path for files (None = account root) and the
/// folder's own path for folders.
#[derive(Debug, Clone, Copy)]
pub struct ResourceRef<'a> {
    /// The file or folder id.
    pub id: Uuid,
    /// The resource owner.
    pub owner_id: Uuid,
    /// Materialized path locating the resource in the tree.
    pub folder_path: Option<&'a FolderPath>,
    /// Whether the resource or any ancestor is soft-deleted.
    pub trashed: bool,
}

/// Everything known about one principal's permissions, assembled once per
/// request by [`builder::PermissionContextBuilder`] and read-only
/// afterwards. Holds no database handle; evaluation is pure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionContext {
    /// The authenticated principal (None = anonymous guest-token holder).
    principal: Option<Uuid>,
    /// Whether the principal holds the system admin role.
    is_admin: bool,
    /// Live direct file shares: file id → exact permission.
    direct_file_shares: HashMap<Uuid, SharePermission>,
    /// Live folder shares, shallowest first.
    folder_shares: Vec<FolderGrant>,
}

impl PermissionContext {
    /// Context for an authenticated user.
    pub fn for_user(
        principal: Uuid,
        is_admin: bool,
        direct_file_shares: HashMap<Uuid, SharePermission>,
        folder_shares: Vec<FolderGrant>,
    ) -> Self {
        Self {
            principal: Some(principal),
            is_admin,
            direct_file_shares,
            folder_shares,
        }
    }

    /// Scoped context for a guest holding a file link.
    pub fn guest_for_file(file_id: Uuid, permission: SharePermission) -> Self {
        Self {
            principal: None,
            is_admin: false,
            direct_file_shares: HashMap::from([(file_id, permission)]),
            folder_shares: Vec::new(),
        }
    }

    /// Scoped context for a guest holding a folder link; covers the
    /// folder and every descendant under its path.
    pub fn guest_for_folder(grant: FolderGrant) -> Self {
        Self {
            principal: None,
            is_admin: false,
            direct_file_shares: HashMap::new(),
            folder_shares: vec![grant],
        }
    }

    /// The principal this context was built for.
    pub fn principal(&self) -> Option<Uuid> {
        self.principal
    }

    /// Whether the principal is a system admin.
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Whether this is an anonymous guest context.
    pub fn is_guest(&self) -> bool {
        self.principal.is_none()
    }

    /// The `edit`-level folder grants whose subtree covers `path`.
    ///
    /// Used by the subtree authorizer to pin a non-owner editor's
    /// mutations inside the subtree that granted them.
    pub fn covering_edit_grants(&self, path: &FolderPath) -> Vec<&FolderGrant> {
        self.folder_shares
            .iter()
            .filter(|g| g.permission.can_write() && g.path.covers(path))
            .collect()
    }

    /// Resolve the effective access for a resource, ignoring trash state.
    ///
    /// Precedence: owner, admin, direct file share (final, even when a
    /// covering folder share would grant more), then folder shares with
    /// most-permissive-wins across every matching ancestor.
    pub fn resolve(&self, resource: &ResourceRef<'_>) -> Option<Access> {
        if self.principal == Some(resource.owner_id) {
            return Some(Access {
                permission: SharePermission::Edit,
                source: AccessSource::Owner,
            });
        }

        if self.is_admin {
            return Some(Access {
                permission: SharePermission::Edit,
                source: AccessSource::AdminOverride,
            });
        }

        if let Some(permission) = self.direct_file_shares.get(&resource.id) {
            return Some(Access {
                permission: *permission,
                source: if self.is_guest() {
                    AccessSource::GuestLink
                } else {
                    AccessSource::DirectShare
                },
            });
        }

        let path = resource.folder_path?;
        let effective = self
            .folder_shares
            .iter()
            .filter(|g| g.path.covers(path))
            .map(|g| g.permission)
            .reduce(SharePermission::most_permissive)?;

        Some(Access {
            permission: effective,
            source: if self.is_guest() {
                AccessSource::GuestLink
            } else {
                AccessSource::FolderShare
            },
        })
    }

    /// Authorize an action on a resource.
    ///
    /// Trashed resources are not found for everyone, owner included;
    /// unauthorized guests get NotFound rather than Deny so a token never
    /// confirms the existence of resources outside its scope.
    pub fn authorize(&self, action: Action, resource: &ResourceRef<'_>) -> Decision {
        if resource.trashed {
            return Decision::NotFound;
        }

        match self.resolve(resource) {
            Some(access) if access.permission.has_at_least(action.required_permission()) => {
                Decision::Allow
            }
            Some(_) => Decision::Deny,
            None if self.is_guest() => Decision::NotFound,
            None => Decision::Deny,
        }
    }

    /// Whether the principal may view the resource.
    pub fn can_view(&self, resource: &ResourceRef<'_>) -> bool {
        self.authorize(Action::FileRead, resource).is_allow()
    }

    /// Whether the principal may edit the resource.
    pub fn can_edit(&self, resource: &ResourceRef<'_>) -> bool {
        self.authorize(Action::FileRename, resource).is_allow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(path: &FolderPath, permission: SharePermission) -> FolderGrant {
        FolderGrant {
            folder_id: path.leaf().expect("non-empty path"),
            path: path.clone(),
            permission,
        }
    }

    fn file_in<'a>(owner: Uuid, path: &'a FolderPath) -> ResourceRef<'a> {
        ResourceRef {
            id: Uuid::new_v4(),
            owner_id: owner,
            folder_path: Some(path),
            trashed: false,
        }
    }

    #[test]
    fn test_owner_always_allowed() {
        let owner = Uuid::new_v4();
        let ctx = PermissionContext::for_user(owner, false, HashMap::new(), Vec::new());
        let path = FolderPath::root(Uuid::new_v4());
        let file = file_in(owner, &path);

        assert!(ctx.can_view(&file));
        assert!(ctx.can_edit(&file));
        assert_eq!(
            ctx.resolve(&file).map(|a| a.source),
            Some(AccessSource::Owner)
        );
    }

    #[test]
    fn test_admin_override() {
        let ctx = PermissionContext::for_user(Uuid::new_v4(), true, HashMap::new(), Vec::new());
        let path = FolderPath::root(Uuid::new_v4());
        let file = file_in(Uuid::new_v4(), &path);

        assert!(ctx.can_edit(&file));
        assert_eq!(
            ctx.resolve(&file).map(|a| a.source),
            Some(AccessSource::AdminOverride)
        );
    }

    #[test]
    fn test_no_grant_is_denied() {
        let ctx = PermissionContext::for_user(Uuid::new_v4(), false, HashMap::new(), Vec::new());
        let path = FolderPath::root(Uuid::new_v4());
        let file = file_in(Uuid::new_v4(), &path);

        assert_eq!(ctx.authorize(Action::FileRead, &file), Decision::Deny);
    }

    #[test]
    fn test_direct_file_share_grants_its_exact_level() {
        let user = Uuid::new_v4();
        let path = FolderPath::root(Uuid::new_v4());
        let mut file = file_in(Uuid::new_v4(), &path);
        let shares = HashMap::from([(file.id, SharePermission::View)]);
        let ctx = PermissionContext::for_user(user, false, shares, Vec::new());

        assert!(ctx.can_view(&file));
        assert!(!ctx.can_edit(&file));

        file.id = Uuid::new_v4();
        assert!(!ctx.can_view(&file));
    }

    #[test]
    fn test_direct_share_is_final_over_folder_share() {
        // The folder share grants edit, but the direct file share says
        // view — the direct share wins, it is not combined.
        let user = Uuid::new_v4();
        let path = FolderPath::root(Uuid::new_v4());
        let file = file_in(Uuid::new_v4(), &path);
        let ctx = PermissionContext::for_user(
            user,
            false,
            HashMap::from([(file.id, SharePermission::View)]),
            vec![grant(&path, SharePermission::Edit)],
        );

        let access = ctx.resolve(&file).expect("grant expected");
        assert_eq!(access.permission, SharePermission::View);
        assert_eq!(access.source, AccessSource::DirectShare);
        assert!(!ctx.can_edit(&file));
    }

    #[test]
    fn test_folder_share_propagates_to_descendants() {
        let user = Uuid::new_v4();
        let shared = FolderPath::root(Uuid::new_v4());
        let nested = shared.child(Uuid::new_v4()).child(Uuid::new_v4());
        let ctx = PermissionContext::for_user(
            user,
            false,
            HashMap::new(),
            vec![grant(&shared, SharePermission::View)],
        );

        let file = file_in(Uuid::new_v4(), &nested);
        assert!(ctx.can_view(&file));
        assert!(!ctx.can_edit(&file));
    }

    #[test]
    fn test_most_permissive_wins_across_nesting() {
        // Ancestor shared view, nested child shared edit: edit wins for
        // a file in the child.
        let user = Uuid::new_v4();
        let ancestor = FolderPath::root(Uuid::new_v4());
        let child = ancestor.child(Uuid::new_v4());
        let ctx = PermissionContext::for_user(
            user,
            false,
            HashMap::new(),
            vec![
                grant(&ancestor, SharePermission::View),
                grant(&child, SharePermission::Edit),
            ],
        );

        let file = file_in(Uuid::new_v4(), &child);
        assert!(ctx.can_edit(&file));

        // And the reverse: ancestor edit outranks the child's view even
        // though the child grant is more specific.
        let ctx = PermissionContext::for_user(
            user,
            false,
            HashMap::new(),
            vec![
                grant(&ancestor, SharePermission::Edit),
                grant(&child, SharePermission::View),
            ],
        );
        assert!(ctx.can_edit(&file));
    }

    #[test]
    fn test_sibling_subtree_not_covered() {
        let user = Uuid::new_v4();
        let root = FolderPath::root(Uuid::new_v4());
        let shared = root.child(Uuid::new_v4());
        let sibling = root.child(Uuid::new_v4());
        let ctx = PermissionContext::for_user(
            user,
            false,
            HashMap::new(),
            vec![grant(&shared, SharePermission::Edit)],
        );

        let file = file_in(Uuid::new_v4(), &sibling);
        assert_eq!(ctx.authorize(Action::FileRead, &file), Decision::Deny);
    }

    #[test]
    fn test_trashed_resource_is_not_found_even_for_owner() {
        let owner = Uuid::new_v4();
        let ctx = PermissionContext::for_user(owner, false, HashMap::new(), Vec::new());
        let path = FolderPath::root(Uuid::new_v4());
        let mut file = file_in(owner, &path);
        file.trashed = true;

        assert_eq!(ctx.authorize(Action::FileRename, &file), Decision::NotFound);
    }

    #[test]
    fn test_root_file_reachable_only_by_direct_share() {
        let user = Uuid::new_v4();
        let file = ResourceRef {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            folder_path: None,
            trashed: false,
        };
        let ctx = PermissionContext::for_user(
            user,
            false,
            HashMap::from([(file.id, SharePermission::Edit)]),
            Vec::new(),
        );
        assert!(ctx.can_edit(&file));

        let other = PermissionContext::for_user(user, false, HashMap::new(), Vec::new());
        assert_eq!(other.authorize(Action::FileRead, &file), Decision::Deny);
    }

    #[test]
    fn test_guest_outside_scope_is_not_found() {
        let shared = FolderPath::root(Uuid::new_v4());
        let ctx = PermissionContext::guest_for_folder(grant(&shared, SharePermission::View));

        let inside = shared.child(Uuid::new_v4());
        let in_scope = file_in(Uuid::new_v4(), &inside);
        assert_eq!(ctx.authorize(Action::FileRead, &in_scope), Decision::Allow);

        let elsewhere = FolderPath::root(Uuid::new_v4());
        let out_of_scope = file_in(Uuid::new_v4(), &elsewhere);
        assert_eq!(
            ctx.authorize(Action::FileRead, &out_of_scope),
            Decision::NotFound
        );
    }

    #[test]
    fn test_guest_never_owner_or_admin() {
        let owner = Uuid::new_v4();
        let ctx = PermissionContext::guest_for_file(Uuid::new_v4(), SharePermission::View);
        let path = FolderPath::root(Uuid::new_v4());
        let file = file_in(owner, &path);

        // A guest context carries no principal, so owner short-circuit
        // must not fire even for the owner's own resources.
        assert_eq!(ctx.authorize(Action::FileRead, &file), Decision::NotFound);
    }

    #[test]
    fn test_covering_edit_grants_filters_level_and_prefix() {
        let user = Uuid::new_v4();
        let a = FolderPath::root(Uuid::new_v4());
        let b = FolderPath::root(Uuid::new_v4());
        let ctx = PermissionContext::for_user(
            user,
            false,
            HashMap::new(),
            vec![
                grant(&a, SharePermission::Edit),
                grant(&b, SharePermission::View),
            ],
        );

        let inside_a = a.child(Uuid::new_v4());
        assert_eq!(ctx.covering_edit_grants(&inside_a).len(), 1);
        let inside_b = b.child(Uuid::new_v4());
        assert!(ctx.covering_edit_grants(&inside_b).is_empty());
    }
}
