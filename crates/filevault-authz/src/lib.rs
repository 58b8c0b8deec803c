//! # filevault-authz
//!
//! The permission-resolution core. A [`context::PermissionContext`] is
//! built once per request from a bounded number of lookups and then
//! answers every access question for that request without further I/O.
//!
//! Resolution order:
//! 1. Trashed resource or ancestor — not found, unconditionally.
//! 2. Owner — full access.
//! 3. Admin override — full access.
//! 4. Direct file share — that share's exact level, final.
//! 5. Folder shares by path prefix — most-permissive-wins.
//! 6. Otherwise denied (not found for guests, to avoid confirming
//!    existence to unauthenticated callers).

pub mod action;
pub mod context;
pub mod decision;
pub mod guest;
pub mod subtree;
pub mod token;

pub use action::Action;
pub use context::{FolderGrant, PermissionContext, ResourceRef};
pub use decision::{Access, AccessSource, Decision};
pub use guest::{GuestAccess, GuestAccessResolver};
pub use subtree::authorize_subtree_move;
