//! File operations, single and batched.

pub mod bulk;
pub mod service;

pub use service::FileService;
