//! Share entity and permission lattice.

pub mod model;
pub mod permission;

pub use model::{CreateShare, Share};
pub use permission::SharePermission;
