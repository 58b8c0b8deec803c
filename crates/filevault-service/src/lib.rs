//! # filevault-service
//!
//! Mutation-boundary services sitting between callers and the
//! repositories. Every operation authorizes against a pre-built
//! [`filevault_authz::PermissionContext`] before touching the database,
//! and the folder services keep the materialized-path invariant intact
//! across renames, moves, and trashing.

pub mod file;
pub mod folder;
pub mod mark;
pub mod share;

mod lookup;

pub use file::FileService;
pub use folder::FolderService;
pub use mark::MarkService;
pub use share::{GuestLink, ShareService};
