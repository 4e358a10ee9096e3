//! Sample database used for local development.

use crate::{
    config::SiteConfig,
    db,
    services::auth_service::AuthService,
};
use anyhow::{Context, Result};
use sqlx::SqlitePool;

pub const TEST_USER_LOGIN: &str = "malebride";
pub const TEST_USER_PASSWORD: &str = "test";

/// Drop every table, recreate the schema and insert the test user plus the
/// site configuration pairs. Runs in a single transaction.
pub async fn build_sample_db(pool: &SqlitePool, site: &SiteConfig) -> Result<()> {
    let mut tx = pool.begin().await?;

    db::drop_all(&mut tx).await.context("dropping tables")?;
    db::create_all(&mut tx).await.context("creating tables")?;

    let password = AuthService::hash_password(TEST_USER_PASSWORD)?;
    sqlx::query("INSERT INTO users (login, password) VALUES (?, ?)")
        .bind(TEST_USER_LOGIN)
        .bind(&password)
        .execute(&mut *tx)
        .await?;

    for (key, value) in site.site_defaults() {
        sqlx::query("INSERT INTO config_pairs (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    tracing::info!(
        "Seeded sample database with user `{}` and default config pairs",
        TEST_USER_LOGIN
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn site() -> SiteConfig {
        SiteConfig {
            title: "soyboard".into(),
            tagline: "tagline".into(),
            footer: "footer".into(),
        }
    }

    #[tokio::test]
    async fn seeding_twice_leaves_one_user_and_three_pairs() {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO bans (address) VALUES ('9.9.9.9')")
            .execute(&pool)
            .await
            .unwrap();

        build_sample_db(&pool, &site()).await.unwrap();
        build_sample_db(&pool, &site()).await.unwrap();

        let logins: Vec<String> = sqlx::query_scalar("SELECT login FROM users")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(logins, [TEST_USER_LOGIN]);

        let pairs: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM config_pairs ORDER BY key")
                .fetch_all(&pool)
                .await
                .unwrap();
        let pairs: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            pairs,
            [
                ("site_footer", "footer"),
                ("site_tagline", "tagline"),
                ("site_title", "soyboard"),
            ]
        );

        let bans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bans")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(bans, 0);
    }

    #[tokio::test]
    async fn seeded_user_can_log_in() {
        let pool = test_pool().await;
        build_sample_db(&pool, &site()).await.unwrap();

        let auth = AuthService::new(std::sync::Arc::new(pool), 60);
        let user = auth.find_user_by_login(TEST_USER_LOGIN).await.unwrap().unwrap();
        assert!(AuthService::verify_password(TEST_USER_PASSWORD, &user.password));
    }
}
