//! src/services/auth_service.rs
//!
//! AuthService — admin users, password hashing (argon2id) and server-side
//! sessions stored in SQLite.

use crate::models::{session::Session, user::User};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::{Rng, distr::Alphanumeric};
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

const SESSION_ID_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user `{0}` already exists")]
    DuplicateLogin(String),
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error("session timeout of {0}s is out of range")]
    SessionTimeout(u64),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Clone)]
pub struct AuthService {
    pub db: Arc<SqlitePool>,
    pub session_timeout_secs: u64,
}

impl AuthService {
    pub fn new(db: Arc<SqlitePool>, session_timeout_secs: u64) -> Self {
        Self {
            db,
            session_timeout_secs,
        }
    }

    /// Hash a password using Argon2id with a random salt.
    pub fn hash_password(password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hash(e.to_string()))
    }

    /// Compare a plaintext password with a stored hash.
    ///
    /// An unparseable hash never matches.
    pub fn verify_password(password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    fn generate_session_id() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SESSION_ID_LEN)
            .map(char::from)
            .collect()
    }

    pub async fn find_user_by_login(&self, login: &str) -> AuthResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, login, email, password FROM users WHERE login = ?",
        )
        .bind(login)
        .fetch_optional(&*self.db)
        .await?;
        Ok(user)
    }

    pub async fn find_user(&self, id: i64) -> AuthResult<Option<User>> {
        let user =
            sqlx::query_as::<_, User>("SELECT id, login, email, password FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&*self.db)
                .await?;
        Ok(user)
    }

    pub async fn login_exists(&self, login: &str) -> AuthResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE login = ?")
            .bind(login)
            .fetch_one(&*self.db)
            .await?;
        Ok(count > 0)
    }

    /// Create a user with a freshly hashed password.
    ///
    /// Returns DuplicateLogin if the UNIQUE index rejects the login.
    pub async fn create_user(
        &self,
        login: &str,
        email: Option<&str>,
        password: &str,
    ) -> AuthResult<User> {
        let hash = Self::hash_password(password)?;
        sqlx::query_as::<_, User>(
            "INSERT INTO users (login, email, password) VALUES (?, ?, ?)
             RETURNING id, login, email, password",
        )
        .bind(login)
        .bind(email)
        .bind(&hash)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AuthError::DuplicateLogin(login.to_string())
            } else {
                AuthError::Sqlx(err)
            }
        })
    }

    /// Open a session for `user` and return it.
    pub async fn create_session(&self, user: &User) -> AuthResult<Session> {
        let now = Utc::now();
        let expires_at = i64::try_from(self.session_timeout_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|timeout| now.checked_add_signed(timeout))
            .ok_or(AuthError::SessionTimeout(self.session_timeout_secs))?;
        let session = Session {
            session_id: Self::generate_session_id(),
            user_id: user.id,
            created_at: now,
            expires_at,
        };

        sqlx::query(
            "INSERT INTO sessions (session_id, user_id, created_at, expires_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&session.session_id)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&*self.db)
        .await?;

        debug!("opened session for user {}", user.login);
        Ok(session)
    }

    /// Resolve a session id to its user.
    ///
    /// Expired sessions are deleted and treated as absent.
    pub async fn validate_session(&self, session_id: &str) -> AuthResult<Option<(Session, User)>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT session_id, user_id, created_at, expires_at FROM sessions WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&*self.db)
        .await?;

        let Some(session) = session else {
            return Ok(None);
        };

        if session.is_expired(Utc::now()) {
            debug!("session for user id {} expired", session.user_id);
            self.delete_session(session_id).await?;
            return Ok(None);
        }

        Ok(self.find_user(session.user_id).await?.map(|user| (session, user)))
    }

    pub async fn delete_session(&self, session_id: &str) -> AuthResult<()> {
        sqlx::query("DELETE FROM sessions WHERE session_id = ?")
            .bind(session_id)
            .execute(&*self.db)
            .await?;
        Ok(())
    }
}

/// Return true if SQLx error indicates a unique constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn service(timeout: u64) -> AuthService {
        AuthService::new(Arc::new(test_pool().await), timeout)
    }

    #[test]
    fn password_hashing() {
        let hash = AuthService::hash_password("test_password_123").unwrap();

        assert_ne!(hash, "test_password_123");
        assert!(AuthService::verify_password("test_password_123", &hash));
        assert!(!AuthService::verify_password("wrong_password", &hash));
        assert!(!AuthService::verify_password("test_password_123", "not-a-hash"));
    }

    #[tokio::test]
    async fn create_user_rejects_duplicate_login() {
        let auth = service(60).await;
        let user = auth.create_user("janny", None, "pw").await.unwrap();
        assert_eq!(user.login, "janny");
        assert!(auth.login_exists("janny").await.unwrap());

        let err = auth.create_user("janny", None, "other").await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateLogin(ref l) if l == "janny"));
    }

    #[tokio::test]
    async fn session_round_trip_and_logout() {
        let auth = service(60).await;
        let user = auth.create_user("mod", Some("m@example.com"), "pw").await.unwrap();
        let session = auth.create_session(&user).await.unwrap();
        assert_eq!(session.session_id.len(), SESSION_ID_LEN);

        let (_, found) = auth
            .validate_session(&session.session_id)
            .await
            .unwrap()
            .expect("session should be valid");
        assert_eq!(found.id, user.id);

        auth.delete_session(&session.session_id).await.unwrap();
        assert!(auth.validate_session(&session.session_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn out_of_range_timeout_is_an_error() {
        let auth = service(10_000_000_000_000).await;
        let user = auth.create_user("mod", None, "pw").await.unwrap();

        let err = auth.create_session(&user).await.unwrap_err();
        assert!(matches!(err, AuthError::SessionTimeout(10_000_000_000_000)));
        let opened: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&*auth.db)
            .await
            .unwrap();
        assert_eq!(opened, 0);
    }

    #[tokio::test]
    async fn expired_session_is_rejected_and_removed() {
        let auth = service(0).await;
        let user = auth.create_user("mod", None, "pw").await.unwrap();
        let session = auth.create_session(&user).await.unwrap();

        assert!(auth.validate_session(&session.session_id).await.unwrap().is_none());
        let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&*auth.db)
            .await
            .unwrap();
        assert_eq!(left, 0);
    }
}
