//! A ban placed on a remote address.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Clone, FromRow, Debug)]
pub struct Ban {
    pub id: i64,

    /// Remote IP address as it appears on incoming connections.
    pub address: String,

    pub reason: Option<String>,

    pub created_at: DateTime<Utc>,
}
