//! Outbox repository implementation

use std::str::FromStr;

use libsql::{params, Connection, Row};

use crate::error::{Error, Result};
use crate::models::{OutboxEntry, OutboxEntryId, OutboxOp, OutboxStatus, ReminderId};
use crate::owner::OwnerId;

const COLUMNS: &str =
    "id, entity_id, op, payload, owner_id, status, attempts, last_attempt_at, created_at";

/// Trait for outbox storage operations (async)
#[allow(async_fn_in_trait)]
pub trait OutboxRepository {
    /// Append a new entry to the log
    async fn enqueue(&self, entry: &OutboxEntry) -> Result<()>;

    /// Pending entries for one owner, oldest first
    async fn pending_for_owner(&self, owner: &OwnerId) -> Result<Vec<OutboxEntry>>;

    /// Number of pending entries for the owner
    async fn pending_count(&self, owner: &OwnerId) -> Result<u64>;

    /// Number of terminally failed entries for the owner
    async fn failed_count(&self, owner: &OwnerId) -> Result<u64>;

    /// Pending entries still queued for one entity, excluding the given entry
    async fn pending_count_for_entity(
        &self,
        entity_id: &ReminderId,
        excluding: &OutboxEntryId,
    ) -> Result<u64>;

    /// Flip an entry to `in_progress` before attempting its remote call
    async fn mark_in_progress(&self, id: &OutboxEntryId) -> Result<()>;

    /// Terminally fail an entry (attempt ceiling or permanent rejection)
    async fn mark_failed(&self, id: &OutboxEntryId) -> Result<()>;

    /// Record a transient failure: back to `pending`, one more attempt burned
    async fn record_attempt_failure(&self, id: &OutboxEntryId, attempted_at: i64) -> Result<()>;

    /// Consume an acknowledged entry
    async fn delete(&self, id: &OutboxEntryId) -> Result<()>;

    /// Remove every entry belonging to an entity (local-only discard)
    async fn delete_for_entity(&self, entity_id: &ReminderId) -> Result<()>;

    /// Reset entries stuck `in_progress` by a crash back to `pending`.
    /// Safe because every push operation is idempotent.
    async fn reset_in_progress(&self, owner: &OwnerId) -> Result<u64>;
}

/// libSQL implementation of `OutboxRepository`
pub struct LibSqlOutboxRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlOutboxRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_entry(row: &Row) -> Result<OutboxEntry> {
        let id: String = row.get(0)?;
        let entity_id: String = row.get(1)?;
        let op: String = row.get(2)?;
        let owner: String = row.get(4)?;
        let status: String = row.get(5)?;

        Ok(OutboxEntry {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid outbox entry id: {id}")))?,
            entity_id: entity_id
                .parse()
                .map_err(|_| Error::Database(format!("invalid outbox entity id: {entity_id}")))?,
            op: OutboxOp::from_str(&op).map_err(Error::Database)?,
            payload: row.get(3)?,
            owner: OwnerId::from(owner),
            status: OutboxStatus::from_str(&status).map_err(Error::Database)?,
            attempts: u32::try_from(row.get::<i64>(6)?).unwrap_or(u32::MAX),
            last_attempt_at: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    async fn count(&self, sql: &str, params: impl libsql::params::IntoParams) -> Result<u64> {
        let mut rows = self.conn.query(sql, params).await?;
        let count = if let Some(row) = rows.next().await? {
            row.get::<i64>(0)?
        } else {
            0
        };
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

impl OutboxRepository for LibSqlOutboxRepository<'_> {
    async fn enqueue(&self, entry: &OutboxEntry) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO outbox (
                    id, entity_type, entity_id, op, payload, owner_id,
                    status, attempts, last_attempt_at, created_at
                ) VALUES (?, 'reminder', ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    entry.id.as_str(),
                    entry.entity_id.as_str(),
                    entry.op.as_str(),
                    entry.payload.as_str(),
                    entry.owner.as_str(),
                    entry.status.as_str(),
                    i64::from(entry.attempts),
                    entry.last_attempt_at,
                    entry.created_at,
                ],
            )
            .await?;
        Ok(())
    }

    async fn pending_for_owner(&self, owner: &OwnerId) -> Result<Vec<OutboxEntry>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {COLUMNS} FROM outbox
                     WHERE owner_id = ? AND status = 'pending'
                     ORDER BY created_at ASC, id ASC"
                ),
                params![owner.as_str()],
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(Self::parse_entry(&row)?);
        }
        Ok(entries)
    }

    async fn pending_count(&self, owner: &OwnerId) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM outbox WHERE owner_id = ? AND status = 'pending'",
            params![owner.as_str()],
        )
        .await
    }

    async fn failed_count(&self, owner: &OwnerId) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM outbox WHERE owner_id = ? AND status = 'failed'",
            params![owner.as_str()],
        )
        .await
    }

    async fn pending_count_for_entity(
        &self,
        entity_id: &ReminderId,
        excluding: &OutboxEntryId,
    ) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM outbox
             WHERE entity_id = ? AND status IN ('pending', 'in_progress') AND id != ?",
            params![entity_id.as_str(), excluding.as_str()],
        )
        .await
    }

    async fn mark_in_progress(&self, id: &OutboxEntryId) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE outbox SET status = 'in_progress' WHERE id = ?",
                params![id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn mark_failed(&self, id: &OutboxEntryId) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE outbox SET status = 'failed' WHERE id = ?",
                params![id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn record_attempt_failure(&self, id: &OutboxEntryId, attempted_at: i64) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE outbox
                 SET status = 'pending', attempts = attempts + 1, last_attempt_at = ?
                 WHERE id = ?",
                params![attempted_at, id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &OutboxEntryId) -> Result<()> {
        self.conn
            .execute("DELETE FROM outbox WHERE id = ?", params![id.as_str()])
            .await?;
        Ok(())
    }

    async fn delete_for_entity(&self, entity_id: &ReminderId) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM outbox WHERE entity_id = ?",
                params![entity_id.as_str()],
            )
            .await?;
        Ok(())
    }

    async fn reset_in_progress(&self, owner: &OwnerId) -> Result<u64> {
        let rows = self
            .conn
            .execute(
                "UPDATE outbox SET status = 'pending'
                 WHERE owner_id = ? AND status = 'in_progress'",
                params![owner.as_str()],
            )
            .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn entry_for(owner: &OwnerId, op: OutboxOp) -> OutboxEntry {
        OutboxEntry::new(owner.clone(), ReminderId::new(), op, "{}".to_string())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_enqueue_and_drain_order() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlOutboxRepository::new(db.connection());
        let owner = OwnerId::new("user-1");

        let first = entry_for(&owner, OutboxOp::Create);
        let second = entry_for(&owner, OutboxOp::Update);
        repo.enqueue(&first).await.unwrap();
        repo.enqueue(&second).await.unwrap();

        let pending = repo.pending_for_owner(&owner).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, first.id);
        assert_eq!(pending[1].id, second.id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failure_bookkeeping() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlOutboxRepository::new(db.connection());
        let owner = OwnerId::new("user-1");

        let entry = entry_for(&owner, OutboxOp::Create);
        repo.enqueue(&entry).await.unwrap();

        repo.mark_in_progress(&entry.id).await.unwrap();
        repo.record_attempt_failure(&entry.id, 123).await.unwrap();

        let pending = repo.pending_for_owner(&owner).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status, OutboxStatus::Pending);
        assert_eq!(pending[0].attempts, 1);
        assert_eq!(pending[0].last_attempt_at, Some(123));
        assert!(pending[0].needs_backoff());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_entries_leave_the_queue() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlOutboxRepository::new(db.connection());
        let owner = OwnerId::new("user-1");

        let entry = entry_for(&owner, OutboxOp::Delete);
        repo.enqueue(&entry).await.unwrap();
        repo.mark_failed(&entry.id).await.unwrap();

        assert!(repo.pending_for_owner(&owner).await.unwrap().is_empty());
        assert_eq!(repo.pending_count(&owner).await.unwrap(), 0);
        assert_eq!(repo.failed_count(&owner).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_consumes_entry() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlOutboxRepository::new(db.connection());
        let owner = OwnerId::new("user-1");

        let entry = entry_for(&owner, OutboxOp::Create);
        repo.enqueue(&entry).await.unwrap();
        repo.delete(&entry.id).await.unwrap();

        assert_eq!(repo.pending_count(&owner).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pending_count_for_entity_excludes_current() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlOutboxRepository::new(db.connection());
        let owner = OwnerId::new("user-1");

        let reminder_id = ReminderId::new();
        let first = OutboxEntry::new(owner.clone(), reminder_id, OutboxOp::Create, "{}".into());
        let second = OutboxEntry::new(owner.clone(), reminder_id, OutboxOp::Update, "{}".into());
        repo.enqueue(&first).await.unwrap();
        repo.enqueue(&second).await.unwrap();

        assert_eq!(
            repo.pending_count_for_entity(&reminder_id, &first.id)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            repo.pending_count_for_entity(&reminder_id, &second.id)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reset_in_progress() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlOutboxRepository::new(db.connection());
        let owner = OwnerId::new("user-1");

        let entry = entry_for(&owner, OutboxOp::Update);
        repo.enqueue(&entry).await.unwrap();
        repo.mark_in_progress(&entry.id).await.unwrap();

        let reset = repo.reset_in_progress(&owner).await.unwrap();
        assert_eq!(reset, 1);
        assert_eq!(repo.pending_count(&owner).await.unwrap(), 1);
    }
}
