//! Push synchronizer: drains the outbox against the remote store

use tokio::sync::Mutex;

use crate::db::{
    Database, LibSqlOutboxRepository, LibSqlReminderRepository, OutboxRepository,
    ReminderRepository,
};
use crate::error::{Error, Result};
use crate::models::{backoff_delay, OutboxEntry, OutboxOp, SyncStatus};
use crate::owner::OwnerId;
use crate::util::unix_millis_now;

use super::{RemoteError, RemoteReminder, RemoteStore};

/// Retry ceiling per outbox entry
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Tally of one outbox drain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOutcome {
    /// Entries acknowledged and consumed
    pub pushed: usize,
    /// Entries that failed transiently and stay queued
    pub deferred: usize,
    /// Entries terminally failed (ceiling hit or permanent rejection)
    pub failed: usize,
}

/// Drain pending outbox entries for one owner in FIFO order.
///
/// Each entry is processed in isolation: one failure never blocks the rest
/// of the queue. The database lock is only held around local reads/writes,
/// never across a network call or a backoff sleep.
pub async fn push_outbox<R: RemoteStore>(
    db: &Mutex<Database>,
    remote: &R,
    owner: &OwnerId,
    max_attempts: u32,
) -> Result<PushOutcome> {
    let entries = {
        let db = db.lock().await;
        let outbox = LibSqlOutboxRepository::new(db.connection());
        // Entries stuck in_progress by a crash are safe to replay: every
        // push operation is idempotent.
        let reset = outbox.reset_in_progress(owner).await?;
        if reset > 0 {
            tracing::warn!(owner = %owner, reset, "Re-queued interrupted outbox entries");
        }
        outbox.pending_for_owner(owner).await?
    };

    let mut outcome = PushOutcome::default();

    for entry in entries {
        if entry.attempts >= max_attempts {
            let db = db.lock().await;
            LibSqlOutboxRepository::new(db.connection())
                .mark_failed(&entry.id)
                .await?;
            tracing::warn!(
                entry = %entry.id,
                entity = %entry.entity_id,
                attempts = entry.attempts,
                "Outbox entry exhausted its retries"
            );
            outcome.failed += 1;
            continue;
        }

        if let Some(last_attempt_at) = entry.last_attempt_at {
            let delay = backoff_delay(entry.attempts);
            let elapsed = unix_millis_now().saturating_sub(last_attempt_at).max(0);
            let elapsed = std::time::Duration::from_millis(elapsed.unsigned_abs());
            if elapsed < delay {
                tokio::time::sleep(delay - elapsed).await;
            }
        }

        {
            let db = db.lock().await;
            LibSqlOutboxRepository::new(db.connection())
                .mark_in_progress(&entry.id)
                .await?;
        }

        match attempt(remote, &entry).await {
            Ok(()) => {
                acknowledge(db, &entry).await?;
                outcome.pushed += 1;
            }
            Err(error) if error.is_permanent() => {
                let db = db.lock().await;
                LibSqlOutboxRepository::new(db.connection())
                    .mark_failed(&entry.id)
                    .await?;
                tracing::warn!(
                    entry = %entry.id,
                    entity = %entry.entity_id,
                    %error,
                    "Outbox entry rejected permanently"
                );
                outcome.failed += 1;
            }
            Err(error) => {
                let db = db.lock().await;
                LibSqlOutboxRepository::new(db.connection())
                    .record_attempt_failure(&entry.id, unix_millis_now())
                    .await?;
                tracing::warn!(
                    entry = %entry.id,
                    entity = %entry.entity_id,
                    attempt = entry.attempts + 1,
                    %error,
                    "Push attempt failed; will retry"
                );
                outcome.deferred += 1;
            }
        }
    }

    Ok(outcome)
}

async fn attempt<R: RemoteStore>(
    remote: &R,
    entry: &OutboxEntry,
) -> std::result::Result<(), RemoteError> {
    match entry.op {
        OutboxOp::Create | OutboxOp::Update => {
            let record: RemoteReminder = serde_json::from_str(&entry.payload)
                .map_err(|e| RemoteError::InvalidPayload(e.to_string()))?;
            remote.upsert(&record).await
        }
        OutboxOp::Delete => remote.mark_deleted(&entry.entity_id).await,
    }
}

/// Consume an acknowledged entry and settle the local record
async fn acknowledge(db: &Mutex<Database>, entry: &OutboxEntry) -> Result<()> {
    let db = db.lock().await;
    let outbox = LibSqlOutboxRepository::new(db.connection());
    let reminders = LibSqlReminderRepository::new(db.connection());

    // Settle the record first, consume the entry last: a crash in between
    // leaves a replayable entry, never a stranded record.
    match entry.op {
        OutboxOp::Delete => {
            // Remote delete acknowledged: drop the tombstone for good
            reminders.hard_delete(&entry.entity_id).await?;
        }
        OutboxOp::Create | OutboxOp::Update => {
            // Only settle to synced once no later entry for this entity is
            // still queued; otherwise a concurrent pull could clobber the
            // not-yet-pushed tail of an edit burst.
            let still_queued = outbox
                .pending_count_for_entity(&entry.entity_id, &entry.id)
                .await?;
            if still_queued == 0 {
                match reminders
                    .set_sync_status(&entry.entity_id, SyncStatus::Synced)
                    .await
                {
                    Ok(()) | Err(Error::NotFound(_)) => {}
                    Err(error) => return Err(error),
                }
            }
        }
    }

    outbox.delete(&entry.id).await?;
    Ok(())
}
