//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Session entity for admin authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session token (opaque, random)
    pub token: String,
    /// Associated user ID
    pub user_id: i64,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session valid for `ttl_hours` from now
    pub fn new(user_id: i64, ttl_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            token: uuid::Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::hours(ttl_hours),
            created_at: now,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_not_expired() {
        let session = Session::new(1, 24);
        assert!(!session.is_expired());
        assert_eq!(session.user_id, 1);
        assert!(!session.token.is_empty());
    }

    #[test]
    fn test_expired_session() {
        let mut session = Session::new(1, 24);
        session.expires_at = Utc::now() - Duration::hours(1);
        assert!(session.is_expired());
    }
}
