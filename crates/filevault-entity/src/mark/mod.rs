//! Per-user favorites and tag assignments.

pub mod model;

pub use model::{Favorite, TagAssignment};
