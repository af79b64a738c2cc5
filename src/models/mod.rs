//! Data models
//!
//! Entity types shared across the database, service, API, and editor layers.

pub mod record;
pub mod session;
pub mod user;

pub use record::{
    ContentRecord, CreateRecordInput, ImageSource, RecordImage, RecordKind, UpdateRecordInput,
};
pub use session::Session;
pub use user::{User, UserRole};
