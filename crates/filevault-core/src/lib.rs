//! # filevault-core
//!
//! Core crate for FileVault. Contains configuration schemas, the
//! materialized folder-path type, logging setup, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other FileVault crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
pub use types::path::FolderPath;
