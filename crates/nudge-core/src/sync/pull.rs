//! Pull reconciler: merges remote changes into the local store

use tokio::sync::Mutex;

use crate::db::{
    Database, LibSqlReminderRepository, LibSqlSyncMetaRepository, ReminderRepository,
    SyncMetaRepository,
};
use crate::error::Result;
use crate::models::SyncStatus;
use crate::owner::OwnerId;
use crate::util::unix_millis_now;

use super::RemoteStore;

/// Tally of one pull cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullOutcome {
    /// Remote records inserted or merged locally
    pub applied: usize,
    /// Local synced records removed because the remote no longer has them
    pub removed: usize,
    /// Remote records ignored (older than local, or local change in flight)
    pub skipped: usize,
}

/// Fetch remote changes past the stored watermark and merge them in.
///
/// Merge rules per record:
/// - absent locally: insert as `synced`
/// - local `synced`: remote wins only if strictly newer (ties keep local)
/// - local `pending_*`: skip; the in-flight local change is reconciled by
///   its own outbox entry, not clobbered by a pull
///
/// A locally `synced` record whose id the remote no longer returns is
/// hard-removed: the remote is the source of truth for deletions once a
/// record is not pending. The watermark advances to the fetch start time,
/// and only after the whole cycle succeeded.
pub async fn pull_remote<R: RemoteStore>(
    db: &Mutex<Database>,
    remote: &R,
    owner: &OwnerId,
) -> Result<PullOutcome> {
    let watermark = {
        let db = db.lock().await;
        LibSqlSyncMetaRepository::new(db.connection())
            .last_pulled_at(owner)
            .await?
    };

    let started_at = unix_millis_now();
    let changed = remote.modified_since(owner, watermark).await?;
    let live = remote.live_ids(owner).await?;

    let db = db.lock().await;
    let reminders = LibSqlReminderRepository::new(db.connection());
    let meta = LibSqlSyncMetaRepository::new(db.connection());

    let mut outcome = PullOutcome::default();
    let mut to_upsert = Vec::new();

    for wire in changed {
        match reminders.get(&wire.id).await? {
            None => {
                to_upsert.push(wire.into_reminder()?);
                outcome.applied += 1;
            }
            Some(local) if local.sync_status == SyncStatus::Synced => {
                if wire.updated_at > local.updated_at {
                    to_upsert.push(wire.into_reminder()?);
                    outcome.applied += 1;
                } else {
                    outcome.skipped += 1;
                }
            }
            Some(_) => {
                // Pending local state wins until its push is acknowledged
                outcome.skipped += 1;
            }
        }
    }

    for local in reminders.list_synced(owner).await? {
        if !live.contains(&local.id) {
            reminders.hard_delete(&local.id).await?;
            outcome.removed += 1;
        }
    }

    reminders.bulk_upsert_synced(&to_upsert).await?;
    meta.set_last_pulled_at(owner, started_at).await?;

    tracing::debug!(
        owner = %owner,
        applied = outcome.applied,
        removed = outcome.removed,
        skipped = outcome.skipped,
        "Pull cycle merged"
    );
    Ok(outcome)
}
