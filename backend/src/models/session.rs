use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of the session ledger. Created on login with a null
/// `logout_time`; mutated at most once, by logout. Multiple open rows per
/// email are legal (one per device).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRecord {
    pub id: i64,
    pub user_email: String,
    pub login_time: DateTime<Utc>,
    pub logout_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
}

impl SessionRecord {
    pub fn is_open(&self) -> bool {
        self.logout_time.is_none()
    }
}

/// Outcome of closing the latest open session for a user.
#[derive(Debug, Clone, Serialize)]
pub struct ClosedSession {
    pub id: i64,
    pub duration_minutes: i64,
}
