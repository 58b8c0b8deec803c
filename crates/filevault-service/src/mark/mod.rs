//! Favorites and tag assignment.

pub mod service;

pub use service::MarkService;
