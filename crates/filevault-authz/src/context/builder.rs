//! Permission context construction.
//!
//! The builder issues a bounded number of lookups (role, direct file
//! shares, folder shares) regardless of how many resources any owner
//! has. The query count scales only with the number of shares the
//! principal itself holds, never with tree size, and the result is
//! rebuilt per request: share revocation is visible to the very next
//! build with no caching lag.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use filevault_core::result::AppResult;
use filevault_database::repositories::share::ShareRepository;
use filevault_database::repositories::user::UserRepository;
use filevault_entity::share::SharePermission;

use super::{FolderGrant, PermissionContext};

/// The bounded lookups a context build is allowed to perform.
///
/// Abstracted behind a trait so the decision core can be exercised
/// without a database.
#[async_trait]
pub trait ContextSource: Send + Sync {
    /// Whether the principal holds the system admin role.
    async fn is_admin(&self, user_id: Uuid) -> AppResult<bool>;

    /// Live direct file shares held by the principal.
    async fn direct_file_shares(&self, user_id: Uuid)
    -> AppResult<Vec<(Uuid, SharePermission)>>;

    /// Live folder shares held by the principal, with current paths.
    async fn folder_grants(&self, user_id: Uuid) -> AppResult<Vec<FolderGrant>>;
}

/// Builds one immutable [`PermissionContext`] per request.
#[derive(Clone)]
pub struct PermissionContextBuilder<S> {
    source: S,
}

impl<S: ContextSource> PermissionContextBuilder<S> {
    /// Creates a new context builder over the given source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Build the context for an authenticated principal.
    ///
    /// Exactly three lookups, every share row filtered to unexpired.
    pub async fn build(&self, principal: Uuid) -> AppResult<PermissionContext> {
        let is_admin = self.source.is_admin(principal).await?;
        let file_shares: HashMap<Uuid, SharePermission> = self
            .source
            .direct_file_shares(principal)
            .await?
            .into_iter()
            .collect();
        let folder_shares = self.source.folder_grants(principal).await?;

        Ok(PermissionContext::for_user(
            principal,
            is_admin,
            file_shares,
            folder_shares,
        ))
    }
}

/// [`ContextSource`] backed by the PostgreSQL repositories.
#[derive(Clone)]
pub struct PgContextSource {
    users: Arc<UserRepository>,
    shares: Arc<ShareRepository>,
}

impl PgContextSource {
    /// Creates a new database-backed context source.
    pub fn new(users: Arc<UserRepository>, shares: Arc<ShareRepository>) -> Self {
        Self { users, shares }
    }
}

#[async_trait]
impl ContextSource for PgContextSource {
    async fn is_admin(&self, user_id: Uuid) -> AppResult<bool> {
        self.users.is_admin(user_id).await
    }

    async fn direct_file_shares(
        &self,
        user_id: Uuid,
    ) -> AppResult<Vec<(Uuid, SharePermission)>> {
        self.shares.find_live_file_shares_for(user_id).await
    }

    async fn folder_grants(&self, user_id: Uuid) -> AppResult<Vec<FolderGrant>> {
        Ok(self
            .shares
            .find_live_folder_grants_for(user_id)
            .await?
            .into_iter()
            .map(|row| FolderGrant {
                folder_id: row.folder_id,
                path: row.path,
                permission: row.permission,
            })
            .collect())
    }
}
