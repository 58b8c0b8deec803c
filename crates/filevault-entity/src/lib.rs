//! # filevault-entity
//!
//! Domain entity models for FileVault. Every struct in this crate
//! represents a database table row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.

pub mod audit;
pub mod file;
pub mod folder;
pub mod mark;
pub mod resource;
pub mod share;
pub mod user;
