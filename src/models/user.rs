//! Admin account allowed to log into the backend.

use sqlx::FromRow;

/// A registered user. `password` holds an argon2 PHC string, never plain text.
#[derive(Clone, FromRow, Debug)]
pub struct User {
    pub id: i64,

    /// Unique login name.
    pub login: String,

    pub email: Option<String>,

    pub password: String,
}
