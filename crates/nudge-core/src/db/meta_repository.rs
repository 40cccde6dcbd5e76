//! Sync metadata repository implementation
//!
//! Small key/value store backing the pull watermark and client session
//! state. Watermarks are per owner: `last_pulled_at:<owner>`.

use libsql::{params, Connection};

use crate::error::Result;
use crate::owner::OwnerId;

/// Trait for sync metadata storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SyncMetaRepository {
    /// Read an arbitrary metadata value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write an arbitrary metadata value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a metadata value
    async fn remove(&self, key: &str) -> Result<()>;

    /// Watermark of the last successfully merged pull cycle (unix ms)
    async fn last_pulled_at(&self, owner: &OwnerId) -> Result<Option<i64>>;

    /// Advance the pull watermark. Callers only do this after a fully
    /// successful fetch+merge cycle.
    async fn set_last_pulled_at(&self, owner: &OwnerId, pulled_at: i64) -> Result<()>;
}

/// libSQL implementation of `SyncMetaRepository`
pub struct LibSqlSyncMetaRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSyncMetaRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn watermark_key(owner: &OwnerId) -> String {
        format!("last_pulled_at:{owner}")
    }
}

impl SyncMetaRepository for LibSqlSyncMetaRepository<'_> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM sync_meta WHERE key = ?", params![key])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO sync_meta (key, value) VALUES (?, ?)",
                params![key, value],
            )
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM sync_meta WHERE key = ?", params![key])
            .await?;
        Ok(())
    }

    async fn last_pulled_at(&self, owner: &OwnerId) -> Result<Option<i64>> {
        let value = self.get(&Self::watermark_key(owner)).await?;
        Ok(value.and_then(|v| v.parse().ok()))
    }

    async fn set_last_pulled_at(&self, owner: &OwnerId, pulled_at: i64) -> Result<()> {
        self.set(&Self::watermark_key(owner), &pulled_at.to_string())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_missing_key() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlSyncMetaRepository::new(db.connection());

        assert_eq!(repo.get("nothing").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_set_and_remove() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlSyncMetaRepository::new(db.connection());

        repo.set("session_owner", "user-1").await.unwrap();
        assert_eq!(
            repo.get("session_owner").await.unwrap(),
            Some("user-1".to_string())
        );

        repo.remove("session_owner").await.unwrap();
        assert_eq!(repo.get("session_owner").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_watermark_is_per_owner() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlSyncMetaRepository::new(db.connection());
        let alice = OwnerId::new("alice");
        let bob = OwnerId::new("bob");

        assert_eq!(repo.last_pulled_at(&alice).await.unwrap(), None);

        repo.set_last_pulled_at(&alice, 42_000).await.unwrap();
        assert_eq!(repo.last_pulled_at(&alice).await.unwrap(), Some(42_000));
        assert_eq!(repo.last_pulled_at(&bob).await.unwrap(), None);
    }
}
