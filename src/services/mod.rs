//! Business logic services
//!
//! This module provides:
//! - `RecordService`: validation, markdown rendering and persistence of records
//! - `UserService`: authentication and session management
//! - `MarkdownRenderer`: markdown to HTML conversion
//! - Password hashing helpers

pub mod markdown;
pub mod password;
pub mod record;
pub mod user;

pub use markdown::MarkdownRenderer;
pub use record::{RecordService, RecordServiceError};
pub use user::{UserService, UserServiceError};
