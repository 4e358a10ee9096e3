use crate::models::ban::Ban;
use sqlx::SqlitePool;
use std::{net::IpAddr, sync::Arc};

/// Read-side access to the `bans` table.
#[derive(Clone)]
pub struct BanService {
    pub db: Arc<SqlitePool>,
}

impl BanService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// First ban matching the remote address, if any.
    pub async fn lookup(&self, address: IpAddr) -> Result<Option<Ban>, sqlx::Error> {
        sqlx::query_as::<_, Ban>(
            "SELECT id, address, reason, created_at FROM bans WHERE address = ? ORDER BY id LIMIT 1",
        )
        .bind(address.to_string())
        .fetch_optional(&*self.db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn lookup_matches_exact_address_only() {
        let bans = BanService::new(Arc::new(test_pool().await));
        sqlx::query("INSERT INTO bans (address, reason) VALUES ('10.0.0.7', 'spam')")
            .execute(&*bans.db)
            .await
            .unwrap();

        let hit = bans.lookup("10.0.0.7".parse().unwrap()).await.unwrap();
        let ban = hit.expect("address should be banned");
        assert_eq!(ban.address, "10.0.0.7");
        assert_eq!(ban.reason.as_deref(), Some("spam"));

        assert!(bans.lookup("10.0.0.70".parse().unwrap()).await.unwrap().is_none());
    }
}
