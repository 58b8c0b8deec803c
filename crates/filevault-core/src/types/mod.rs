//! Shared value types.

pub mod path;

pub use path::FolderPath;
