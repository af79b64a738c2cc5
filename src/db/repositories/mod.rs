//! Repository layer
//!
//! Trait-based data access so services can be wired with real SQLite pools
//! in production and in-memory pools in tests.

pub mod record;
pub mod session;
pub mod user;

pub use record::{RecordRepository, SqlxRecordRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
