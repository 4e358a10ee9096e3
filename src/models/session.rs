use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Server-side admin session referenced by the session cookie.
#[derive(Clone, FromRow, Debug)]
pub struct Session {
    pub session_id: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
