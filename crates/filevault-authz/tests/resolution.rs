//! End-to-end resolution tests over in-memory sources.
//!
//! These exercise the builder, evaluation, and guest resolution without
//! a database, including the bounded-lookup guarantee: building a
//! context costs the same number of queries no matter how many
//! resources exist.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use filevault_authz::context::builder::{ContextSource, PermissionContextBuilder};
use filevault_authz::guest::{GuestAccessResolver, GuestShareSource};
use filevault_authz::{Action, Decision, FolderGrant, ResourceRef, token};
use filevault_core::error::ErrorKind;
use filevault_core::result::AppResult;
use filevault_core::FolderPath;
use filevault_entity::folder::Folder;
use filevault_entity::share::{Share, SharePermission};

/// Share table + role flags with a query counter.
#[derive(Default)]
struct MemorySource {
    admins: HashSet<Uuid>,
    file_shares: Mutex<Vec<(Uuid, Uuid, SharePermission)>>,
    folder_shares: Mutex<Vec<(Uuid, FolderGrant)>>,
    queries: AtomicUsize,
}

impl MemorySource {
    fn share_file(&self, user: Uuid, file: Uuid, permission: SharePermission) {
        self.file_shares.lock().unwrap().push((user, file, permission));
    }

    fn share_folder(&self, user: Uuid, path: &FolderPath, permission: SharePermission) {
        self.folder_shares.lock().unwrap().push((
            user,
            FolderGrant {
                folder_id: path.leaf().expect("non-empty path"),
                path: path.clone(),
                permission,
            },
        ));
    }

    fn revoke_folder(&self, user: Uuid, path: &FolderPath) {
        self.folder_shares
            .lock()
            .unwrap()
            .retain(|(u, g)| !(*u == user && g.path == *path));
    }

    fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContextSource for &MemorySource {
    async fn is_admin(&self, user_id: Uuid) -> AppResult<bool> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.admins.contains(&user_id))
    }

    async fn direct_file_shares(
        &self,
        user_id: Uuid,
    ) -> AppResult<Vec<(Uuid, SharePermission)>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .file_shares
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _, _)| *u == user_id)
            .map(|(_, f, p)| (*f, *p))
            .collect())
    }

    async fn folder_grants(&self, user_id: Uuid) -> AppResult<Vec<FolderGrant>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .folder_shares
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, g)| g.clone())
            .collect())
    }
}

#[tokio::test]
async fn test_build_query_count_independent_of_resource_count() {
    let user = Uuid::new_v4();
    let owner = Uuid::new_v4();

    // Small world: 50 files under one shared folder.
    let small = MemorySource::default();
    let shared = FolderPath::root(Uuid::new_v4());
    small.share_folder(user, &shared, SharePermission::View);
    let small_files: Vec<Uuid> = (0..50).map(|_| Uuid::new_v4()).collect();

    let builder = PermissionContextBuilder::new(&small);
    let ctx = builder.build(user).await.unwrap();
    let small_queries = small.query_count();

    for id in &small_files {
        let file = ResourceRef {
            id: *id,
            owner_id: owner,
            folder_path: Some(&shared),
            trashed: false,
        };
        assert!(ctx.can_view(&file));
    }

    // Large world: 250 files; the build must not get more expensive.
    let large = MemorySource::default();
    large.share_folder(user, &shared, SharePermission::View);
    let large_files: Vec<Uuid> = (0..250).map(|_| Uuid::new_v4()).collect();

    let builder = PermissionContextBuilder::new(&large);
    let ctx = builder.build(user).await.unwrap();
    let large_queries = large.query_count();

    for id in &large_files {
        let file = ResourceRef {
            id: *id,
            owner_id: owner,
            folder_path: Some(&shared),
            trashed: false,
        };
        assert!(ctx.can_view(&file));
    }

    assert!(
        large_queries.abs_diff(small_queries) <= 5,
        "query count grew with resource count: {small_queries} vs {large_queries}"
    );
    assert!(small_queries <= 4, "context build issued too many lookups");
}

#[tokio::test]
async fn test_nested_share_revocation_scenario() {
    // Folder A shared view, child folder B shared edit, file X in B.
    let user = Uuid::new_v4();
    let owner = Uuid::new_v4();
    let source = MemorySource::default();

    let a = FolderPath::root(Uuid::new_v4());
    let b = a.child(Uuid::new_v4());
    source.share_folder(user, &a, SharePermission::View);
    source.share_folder(user, &b, SharePermission::Edit);

    let x = ResourceRef {
        id: Uuid::new_v4(),
        owner_id: owner,
        folder_path: Some(&b),
        trashed: false,
    };

    let builder = PermissionContextBuilder::new(&source);

    // Most-permissive-wins: edit via B despite A's view.
    let ctx = builder.build(user).await.unwrap();
    assert_eq!(ctx.authorize(Action::FileRename, &x), Decision::Allow);
    assert_eq!(ctx.authorize(Action::FileDelete, &x), Decision::Allow);

    // Revoking A leaves B's edit intact. No caching lag: the next build
    // sees the new share table.
    source.revoke_folder(user, &a);
    let ctx = builder.build(user).await.unwrap();
    assert_eq!(ctx.authorize(Action::FileRename, &x), Decision::Allow);

    // Revoking B too removes all access.
    source.revoke_folder(user, &b);
    let ctx = builder.build(user).await.unwrap();
    assert_eq!(ctx.authorize(Action::FileRename, &x), Decision::Deny);
    assert_eq!(ctx.authorize(Action::FileRead, &x), Decision::Deny);
}

#[tokio::test]
async fn test_direct_share_survives_folder_revocation() {
    let user = Uuid::new_v4();
    let owner = Uuid::new_v4();
    let source = MemorySource::default();

    let folder = FolderPath::root(Uuid::new_v4());
    let file_id = Uuid::new_v4();
    source.share_folder(user, &folder, SharePermission::Edit);
    source.share_file(user, file_id, SharePermission::View);

    let file = ResourceRef {
        id: file_id,
        owner_id: owner,
        folder_path: Some(&folder),
        trashed: false,
    };

    let builder = PermissionContextBuilder::new(&source);

    // The direct share's level is final even while the folder grants edit.
    let ctx = builder.build(user).await.unwrap();
    assert!(ctx.can_view(&file));
    assert!(!ctx.can_edit(&file));

    // And it keeps granting view after the folder share goes away.
    source.revoke_folder(user, &folder);
    let ctx = builder.build(user).await.unwrap();
    assert!(ctx.can_view(&file));
    assert!(!ctx.can_edit(&file));
}

/// In-memory guest share table keyed by token hash.
#[derive(Default)]
struct MemoryGuestSource {
    shares: HashMap<String, Share>,
    folders: HashMap<Uuid, Folder>,
    views: Mutex<HashSet<Uuid>>,
}

impl MemoryGuestSource {
    fn add_folder_link(
        &mut self,
        owner: Uuid,
        path: &FolderPath,
        permission: SharePermission,
        expires_at: Option<chrono::DateTime<Utc>>,
    ) -> String {
        let folder_id = path.leaf().expect("non-empty path");
        let now = Utc::now();
        self.folders.insert(
            folder_id,
            Folder {
                id: folder_id,
                owner_id: owner,
                parent_id: None,
                name: "shared".to_string(),
                path: path.clone(),
                deleted_at: None,
                created_at: now,
                updated_at: now,
            },
        );

        let raw = token::generate_token();
        let share = Share {
            id: Uuid::new_v4(),
            file_id: None,
            folder_id: Some(folder_id),
            shared_by: owner,
            shared_with: None,
            token_hash: Some(token::hash_token(&raw)),
            permission,
            expires_at,
            created_at: now,
        };
        self.shares.insert(token::hash_token(&raw), share);
        raw
    }
}

#[async_trait]
impl GuestShareSource for &MemoryGuestSource {
    async fn find_guest_share(&self, token_hash: &str) -> AppResult<Option<Share>> {
        Ok(self.shares.get(token_hash).cloned())
    }

    async fn find_folder(&self, folder_id: Uuid) -> AppResult<Option<Folder>> {
        Ok(self.folders.get(&folder_id).cloned())
    }

    async fn record_guest_view(&self, share_id: Uuid) -> AppResult<bool> {
        Ok(self.views.lock().unwrap().insert(share_id))
    }
}

#[tokio::test]
async fn test_guest_token_scoped_to_shared_subtree() {
    let mut source = MemoryGuestSource::default();
    let shared = FolderPath::root(Uuid::new_v4());
    let raw = source.add_folder_link(Uuid::new_v4(), &shared, SharePermission::View, None);

    let resolver = GuestAccessResolver::new(&source);
    let access = resolver.resolve(&raw).await.unwrap();
    assert_eq!(access.permission, SharePermission::View);
    assert_eq!(access.folder_path.as_ref(), Some(&shared));

    // Any nested descendant resolves with the share's permission.
    let nested = shared.child(Uuid::new_v4()).child(Uuid::new_v4());
    let inside = ResourceRef {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        folder_path: Some(&nested),
        trashed: false,
    };
    assert_eq!(
        access.context.authorize(Action::FileRead, &inside),
        Decision::Allow
    );
    assert_eq!(
        access.context.authorize(Action::FileRename, &inside),
        Decision::Deny
    );

    // Outside the prefix: NotFound, never Forbidden.
    let elsewhere = FolderPath::root(Uuid::new_v4());
    let outside = ResourceRef {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        folder_path: Some(&elsewhere),
        trashed: false,
    };
    assert_eq!(
        access.context.authorize(Action::FileRead, &outside),
        Decision::NotFound
    );
}

#[tokio::test]
async fn test_guest_token_not_found_and_gone() {
    let mut source = MemoryGuestSource::default();
    let shared = FolderPath::root(Uuid::new_v4());
    let expired = source.add_folder_link(
        Uuid::new_v4(),
        &shared,
        SharePermission::View,
        Some(Utc::now() - Duration::hours(1)),
    );

    let resolver = GuestAccessResolver::new(&source);

    let err = resolver.resolve("no-such-token").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = resolver.resolve(&expired).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Gone);
}

#[tokio::test]
async fn test_guest_view_logged_once_per_share() {
    let mut source = MemoryGuestSource::default();
    let shared = FolderPath::root(Uuid::new_v4());
    let raw = source.add_folder_link(Uuid::new_v4(), &shared, SharePermission::View, None);

    let resolver = GuestAccessResolver::new(&source);
    for _ in 0..5 {
        resolver.resolve(&raw).await.unwrap();
    }

    assert_eq!(source.views.lock().unwrap().len(), 1);
}
