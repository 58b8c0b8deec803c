//! Share lifecycle management.

pub mod service;

pub use service::{GuestLink, ShareService};
