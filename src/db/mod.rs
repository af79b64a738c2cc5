//! Database layer
//!
//! SQLite-backed persistence for records, users, and sessions. Data access
//! goes through repository traits so services can be tested against the
//! real schema with in-memory pools.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool};
