//! SQLite pool setup and schema management.
//!
//! The schema lives in `migrations/0001_init.sql` and is embedded at compile
//! time, so `--migrate`, `--seed` and the tests all run the same statements.

use anyhow::Result;
use sqlx::{
    SqliteConnection, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{path::Path, str::FromStr};

const INIT_SQL: &str = include_str!("../migrations/0001_init.sql");

/// Tables in dependency order. Dropped back to front.
pub const TABLES: [&str; 7] = [
    "users",
    "sessions",
    "bans",
    "config_pairs",
    "verified_tripcodes",
    "posts",
    "banners",
];

/// Open the pool, creating the database file and its parent directory if needed.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let db_path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .trim_start_matches("file:");
    tracing::debug!("Interpreted SQLite path => {}", db_path);

    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Run every schema statement. Idempotent thanks to `IF NOT EXISTS`.
pub async fn create_all(conn: &mut SqliteConnection) -> Result<()> {
    let statements = INIT_SQL
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::info!("Running {} migration statements...", statements.len());

    for stmt in statements {
        tracing::debug!("Executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(&mut *conn).await?;
    }

    Ok(())
}

/// Drop every table the schema defines.
pub async fn drop_all(conn: &mut SqliteConnection) -> Result<()> {
    for table in TABLES.iter().rev() {
        tracing::debug!("Dropping table {}", table);
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Single-connection in-memory database with the schema applied.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let mut conn = pool.acquire().await.unwrap();
    create_all(&mut conn).await.unwrap();
    drop(conn);
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_all_is_idempotent() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        create_all(&mut conn).await.unwrap();

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_one(&mut *conn)
        .await
        .unwrap();
        assert_eq!(count, TABLES.len() as i64);
    }

    #[tokio::test]
    async fn drop_all_removes_every_table() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        drop_all(&mut conn).await.unwrap();

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_one(&mut *conn)
        .await
        .unwrap();
        assert_eq!(count, 0);
    }
}
