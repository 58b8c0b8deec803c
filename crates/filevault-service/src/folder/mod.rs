//! Folder tree maintenance.

pub mod paths;
pub mod service;

pub use service::FolderService;
