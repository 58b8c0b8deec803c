//! Guest activity audit rows.

pub mod model;

pub use model::GuestViewRecord;
