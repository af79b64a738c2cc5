//! User model
//!
//! The site has a single elevated role: the coach (or whoever runs the site)
//! signs in as an admin to edit content. Everything else is public reading,
//! so no finer-grained roles exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user of the admin area
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role
    pub role: UserRole,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user. The password must already be hashed
    /// (`services::password::hash_password`).
    pub fn new(username: String, password_hash: String, role: UserRole) -> Self {
        Self {
            id: 0, // Will be set by the database
            username,
            password_hash,
            role,
            created_at: Utc::now(),
        }
    }

    /// Check if the user may edit site content
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full access to the editing workflow
    Admin,
    /// Signed-in but read-only (kept for future guest accounts)
    #[default]
    Viewer,
}

impl UserRole {
    /// Database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Viewer => "viewer",
        }
    }

    /// Parse from the database representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "viewer" => Some(UserRole::Viewer),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
