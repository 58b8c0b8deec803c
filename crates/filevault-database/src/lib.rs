//! # filevault-database
//!
//! PostgreSQL connection management, migration runner, and repository
//! implementations. Repositories expose the bounded queries the
//! permission engine consumes; none of them walk parent pointers, since
//! subtree work is always a materialized-path prefix query.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
