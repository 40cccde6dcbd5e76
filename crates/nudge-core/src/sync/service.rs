//! Sync orchestrator
//!
//! Composes push then pull into one `full_sync`, serialized per owner so
//! two drains can never race on the same outbox or watermark. Also owns
//! guest-to-account data migration at sign-up time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;

use crate::db::{
    Database, LibSqlOutboxRepository, LibSqlReminderRepository, OutboxRepository,
    ReminderRepository,
};
use crate::error::{Error, Result};
use crate::models::{OutboxEntry, OutboxOp};
use crate::owner::{AuthEvent, OwnerId};

use super::{
    pull_remote, push_outbox, PullOutcome, PushOutcome, RemoteReminder, RemoteStore,
    DEFAULT_MAX_ATTEMPTS,
};

/// Tuning knobs for the sync engine
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// Retry ceiling per outbox entry
    pub max_push_attempts: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_push_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Result of one `full_sync`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub push: PushOutcome,
    pub pull: PullOutcome,
}

/// Not-yet-acknowledged local changes, surfaced to the owner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingChanges {
    /// Entries still queued for push
    pub queued: u64,
    /// Entries that terminally failed; local data stays authoritative
    pub failed: u64,
}

/// Orchestrates push and pull against one remote store
pub struct SyncService<R> {
    db: Arc<Mutex<Database>>,
    remote: R,
    options: SyncOptions,
    flights: StdMutex<HashMap<OwnerId, Arc<Mutex<()>>>>,
}

impl<R: RemoteStore> SyncService<R> {
    pub fn new(db: Arc<Mutex<Database>>, remote: R, options: SyncOptions) -> Self {
        Self {
            db,
            remote,
            options,
            flights: StdMutex::new(HashMap::new()),
        }
    }

    /// Push pending mutations, then pull and merge remote changes.
    ///
    /// The two steps are independent: a push failure does not stop the
    /// pull from being attempted, and either step can be retried on the
    /// next call. Guest owners short-circuit to a no-op. Concurrent calls
    /// for the same owner serialize on a single-flight guard.
    pub async fn full_sync(&self, owner: &OwnerId) -> Result<SyncReport> {
        if owner.is_guest() {
            tracing::debug!(owner = %owner, "Skipping sync for guest owner");
            return Ok(SyncReport::default());
        }

        let flight = self.flight(owner);
        let _guard = flight.lock().await;

        let push = push_outbox(&self.db, &self.remote, owner, self.options.max_push_attempts).await;
        if let Err(error) = &push {
            tracing::warn!(owner = %owner, %error, "Push step failed; still attempting pull");
        }

        let pull = pull_remote(&self.db, &self.remote, owner).await;

        match (push, pull) {
            (Ok(push), Ok(pull)) => Ok(SyncReport { push, pull }),
            (Err(error), _) | (_, Err(error)) => Err(error),
        }
    }

    /// Upgrade a guest's data to an authenticated owner, serialized with
    /// the target owner's sync flights. See [`migrate_guest_records`].
    pub async fn migrate_guest_data(&self, guest: &OwnerId, account: &OwnerId) -> Result<usize> {
        let flight = self.flight(account);
        let _guard = flight.lock().await;
        migrate_guest_records(&self.db, guest, account).await
    }

    /// Sign-in transition: migrate guest data when present, then sync.
    pub async fn on_sign_in(&self, previous: &OwnerId, account: &OwnerId) -> Result<SyncReport> {
        if previous.is_guest() {
            self.migrate_guest_data(previous, account).await?;
        }
        self.full_sync(account).await
    }

    /// Dispatch an identity-provider transition. Sign-in migrates and
    /// syncs; sign-out needs no sync work (the device continues as a
    /// fresh guest, chosen by the caller).
    pub async fn handle_auth_event(
        &self,
        previous: &OwnerId,
        event: &AuthEvent,
    ) -> Result<Option<SyncReport>> {
        match event {
            AuthEvent::SignedIn { owner } => self.on_sign_in(previous, owner).await.map(Some),
            AuthEvent::SignedOut => Ok(None),
        }
    }

    /// Queued and terminally failed outbox entries for the owner.
    pub async fn pending_changes(&self, owner: &OwnerId) -> Result<PendingChanges> {
        let db = self.db.lock().await;
        let outbox = LibSqlOutboxRepository::new(db.connection());
        Ok(PendingChanges {
            queued: outbox.pending_count(owner).await?,
            failed: outbox.failed_count(owner).await?,
        })
    }

    fn flight(&self, owner: &OwnerId) -> Arc<Mutex<()>> {
        let mut flights = self.flights.lock().unwrap();
        flights
            .entry(owner.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Reassign every guest record to the authenticated owner.
///
/// One local transaction stamps each record `pending_create` and enqueues
/// a create outbox entry per record (guest records were never pushed).
/// All-or-nothing: a failure rolls the whole migration back. Pushing the
/// migrated records is the caller's next `full_sync`; until then the data
/// stays valid locally.
pub async fn migrate_guest_records(
    db: &Mutex<Database>,
    guest: &OwnerId,
    account: &OwnerId,
) -> Result<usize> {
    if !guest.is_guest() {
        return Err(Error::InvalidInput(format!(
            "migration source {guest} is not a guest owner"
        )));
    }
    if account.is_guest() {
        return Err(Error::InvalidInput(format!(
            "migration target {account} is not an authenticated owner"
        )));
    }

    let db = db.lock().await;
    let conn = db.connection();
    let reminders = LibSqlReminderRepository::new(conn);
    let outbox = LibSqlOutboxRepository::new(conn);

    conn.execute("BEGIN TRANSACTION", ()).await?;
    let migrated = async {
        let migrated = reminders.reassign_owner(guest, account).await?;
        for reminder in &migrated {
            let payload = serde_json::to_string(&RemoteReminder::from(reminder))?;
            outbox
                .enqueue(&OutboxEntry::new(
                    account.clone(),
                    reminder.id,
                    OutboxOp::Create,
                    payload,
                ))
                .await?;
        }
        Ok::<usize, Error>(migrated.len())
    }
    .await;

    let migrated = match migrated {
        Ok(migrated) => migrated,
        Err(error) => {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(error);
        }
    };
    if let Err(error) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(error.into());
    }

    tracing::info!(from = %guest, to = %account, migrated, "Migrated guest data");
    Ok(migrated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Recurrence, Reminder, SyncStatus, Trigger};
    use crate::sync::InMemoryRemoteStore;

    async fn setup() -> (Arc<Mutex<Database>>, SyncService<InMemoryRemoteStore>, InMemoryRemoteStore) {
        let db = Arc::new(Mutex::new(Database::open_in_memory().await.unwrap()));
        let remote = InMemoryRemoteStore::new();
        let service = SyncService::new(db.clone(), remote.clone(), SyncOptions::default());
        (db, service, remote)
    }

    fn reminder(owner: &OwnerId, title: &str) -> Reminder {
        Reminder::new(
            owner.clone(),
            title,
            Trigger::Time {
                fire_at: 1_700_000_000_000,
                recurrence: Recurrence::none(),
            },
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn guest_sync_is_a_no_op() {
        let (_db, service, _remote) = setup().await;
        let report = service.full_sync(&OwnerId::guest()).await.unwrap();
        assert_eq!(report, SyncReport::default());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn migration_requires_a_guest_source_and_account_target() {
        let (_db, service, _remote) = setup().await;
        let guest = OwnerId::guest();
        let account = OwnerId::new("user-1");

        assert!(service.migrate_guest_data(&account, &account).await.is_err());
        assert!(service.migrate_guest_data(&guest, &guest).await.is_err());
        assert_eq!(service.migrate_guest_data(&guest, &account).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn migration_marks_records_and_enqueues_creates() {
        let (db, service, _remote) = setup().await;
        let guest = OwnerId::guest();
        let account = OwnerId::new("user-1");

        {
            let guard = db.lock().await;
            let repo = LibSqlReminderRepository::new(guard.connection());
            for title in ["one", "two", "three"] {
                repo.insert(&reminder(&guest, title)).await.unwrap();
            }
        }

        let migrated = service.migrate_guest_data(&guest, &account).await.unwrap();
        assert_eq!(migrated, 3);

        let guard = db.lock().await;
        let repo = LibSqlReminderRepository::new(guard.connection());
        for record in repo.list_for_owner(&account).await.unwrap() {
            assert_eq!(record.sync_status, SyncStatus::PendingCreate);
        }
        let outbox = LibSqlOutboxRepository::new(guard.connection());
        assert_eq!(outbox.pending_count(&account).await.unwrap(), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn auth_events_drive_migration_and_sync() {
        let (db, service, remote) = setup().await;
        let guest = OwnerId::guest();
        let account = OwnerId::new("user-1");

        {
            let guard = db.lock().await;
            LibSqlReminderRepository::new(guard.connection())
                .insert(&reminder(&guest, "carry me over"))
                .await
                .unwrap();
        }

        let report = service
            .handle_auth_event(
                &guest,
                &AuthEvent::SignedIn {
                    owner: account.clone(),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.push.pushed, 1);
        assert_eq!(remote.live_len(), 1);

        let after_sign_out = service
            .handle_auth_event(&account, &AuthEvent::SignedOut)
            .await
            .unwrap();
        assert!(after_sign_out.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pending_changes_counts_queue_and_failures() {
        let (db, service, _remote) = setup().await;
        let owner = OwnerId::new("user-1");

        let record = reminder(&owner, "Queued");
        {
            let guard = db.lock().await;
            LibSqlReminderRepository::new(guard.connection())
                .insert(&record)
                .await
                .unwrap();
            let outbox = LibSqlOutboxRepository::new(guard.connection());
            let entry = OutboxEntry::new(owner.clone(), record.id, OutboxOp::Create, "{}".into());
            outbox.enqueue(&entry).await.unwrap();
        }

        let pending = service.pending_changes(&owner).await.unwrap();
        assert_eq!(pending, PendingChanges { queued: 1, failed: 0 });
    }
}
