//! Reminder command/query service
//!
//! The single entry point for owning mutations. Every write lands in the
//! local store first, appends an outbox entry when the owner syncs, drives
//! the side-effect scheduler, and broadcasts a change event for UI
//! subscriptions. No shared mutable state is exposed.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};

use crate::db::{
    Database, LibSqlOutboxRepository, LibSqlReminderRepository, OutboxRepository,
    ReminderRepository,
};
use crate::error::{Error, Result};
use crate::models::{Category, OutboxEntry, OutboxOp, Priority, Reminder, ReminderId, SyncStatus, Trigger};
use crate::owner::OwnerId;
use crate::sync::RemoteReminder;
use crate::triggers::{
    GeoEvent, GeoTriggerRegistrar, RestoreReport, SideEffectScheduler, TimeTriggerScheduler,
};
use crate::util::{normalize_text_option, unix_millis_now};

const MAX_TITLE_CHARS: usize = 200;
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Change notification delivered to store subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Created(ReminderId),
    Updated(ReminderId),
    Deleted(ReminderId),
}

/// Input for creating a reminder
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub owner: OwnerId,
    pub title: String,
    pub notes: Option<String>,
    pub priority: Priority,
    pub category: Category,
    pub trigger: Trigger,
}

/// Command/query facade over the local store
pub struct ReminderService<T, G> {
    db: Arc<Mutex<Database>>,
    effects: SideEffectScheduler<T, G>,
    events: broadcast::Sender<StoreEvent>,
}

impl<T: TimeTriggerScheduler, G: GeoTriggerRegistrar> ReminderService<T, G> {
    pub fn new(db: Arc<Mutex<Database>>, effects: SideEffectScheduler<T, G>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            db,
            effects,
            events,
        }
    }

    /// Subscribe to change events. Slow subscribers miss events rather
    /// than blocking writers.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Create a reminder and register its trigger.
    pub async fn create(&self, input: NewReminder) -> Result<Reminder> {
        let title = normalize_text_option(Some(input.title))
            .ok_or_else(|| Error::InvalidInput("title is required".to_string()))?;
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(Error::InvalidInput(format!(
                "title must be under {MAX_TITLE_CHARS} characters"
            )));
        }

        let mut reminder = Reminder::new(input.owner, title, input.trigger);
        reminder.notes = normalize_text_option(input.notes);
        reminder.priority = input.priority;
        reminder.category = input.category;

        {
            let db = self.db.lock().await;
            let conn = db.connection();
            let reminders = LibSqlReminderRepository::new(conn);
            let outbox = LibSqlOutboxRepository::new(conn);

            conn.execute("BEGIN TRANSACTION", ()).await?;
            let written = async {
                reminders.insert(&reminder).await?;
                if !reminder.owner.is_guest() {
                    outbox
                        .enqueue(&Self::entry_for(&reminder, OutboxOp::Create)?)
                        .await?;
                }
                Ok::<(), Error>(())
            }
            .await;
            Self::finish_txn(conn, written).await?;
        }

        let reminder = self.effects.on_created(reminder).await?;
        self.events.send(StoreEvent::Created(reminder.id)).ok();
        Ok(reminder)
    }

    /// Apply an edit. The caller fetches, modifies, and passes the record
    /// back; sync status and `updated_at` are managed here.
    pub async fn update(&self, mut edited: Reminder) -> Result<Reminder> {
        let stored = self
            .get(&edited.id)
            .await?
            .ok_or_else(|| Error::NotFound(edited.id.to_string()))?;
        if stored.sync_status == SyncStatus::PendingDelete {
            // Tombstones are invisible to the owner and cannot be revived
            return Err(Error::NotFound(edited.id.to_string()));
        }

        // Ownership never changes through an edit
        edited.owner = stored.owner.clone();
        edited.sync_status = if edited.owner.is_guest() {
            SyncStatus::Synced
        } else {
            stored.sync_status.escalate_for_update()
        };

        let updated = {
            let db = self.db.lock().await;
            let conn = db.connection();
            let reminders = LibSqlReminderRepository::new(conn);
            let outbox = LibSqlOutboxRepository::new(conn);

            conn.execute("BEGIN TRANSACTION", ()).await?;
            let written = async {
                let updated = reminders.update(&edited).await?;
                if !updated.owner.is_guest() {
                    outbox
                        .enqueue(&Self::entry_for(&updated, OutboxOp::Update)?)
                        .await?;
                }
                Ok::<Reminder, Error>(updated)
            }
            .await;
            Self::finish_txn(conn, written).await?
        };

        let updated = self.effects.on_updated(&stored, updated).await?;
        self.events.send(StoreEvent::Updated(updated.id)).ok();
        Ok(updated)
    }

    /// Flip the completion flag, stamping or clearing `completed_at`.
    pub async fn toggle_complete(&self, id: &ReminderId) -> Result<Reminder> {
        let mut edited = self
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        edited.completed = !edited.completed;
        edited.completed_at = edited.completed.then(unix_millis_now);
        self.update(edited).await
    }

    /// Delete a reminder. Guest data is removed outright; synced data is
    /// tombstoned until the remote delete is acknowledged.
    pub async fn delete(&self, id: &ReminderId) -> Result<()> {
        let stored = self
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        // Cancel the registration while the record still exists
        self.effects.on_deleted(&stored).await;

        {
            let db = self.db.lock().await;
            let conn = db.connection();
            let reminders = LibSqlReminderRepository::new(conn);
            let outbox = LibSqlOutboxRepository::new(conn);

            conn.execute("BEGIN TRANSACTION", ()).await?;
            let written = async {
                if stored.owner.is_guest() {
                    reminders.hard_delete(id).await?;
                    outbox.delete_for_entity(id).await?;
                } else {
                    reminders.soft_delete(id).await?;
                    outbox
                        .enqueue(&OutboxEntry::new(
                            stored.owner.clone(),
                            *id,
                            OutboxOp::Delete,
                            String::new(),
                        ))
                        .await?;
                }
                Ok::<(), Error>(())
            }
            .await;
            Self::finish_txn(conn, written).await?;
        }

        self.events.send(StoreEvent::Deleted(*id)).ok();
        Ok(())
    }

    /// Fetch one reminder by id, regardless of sync status.
    pub async fn get(&self, id: &ReminderId) -> Result<Option<Reminder>> {
        let db = self.db.lock().await;
        LibSqlReminderRepository::new(db.connection()).get(id).await
    }

    /// List an owner's visible reminders, newest first.
    pub async fn list(&self, owner: &OwnerId) -> Result<Vec<Reminder>> {
        let db = self.db.lock().await;
        LibSqlReminderRepository::new(db.connection())
            .list_for_owner(owner)
            .await
    }

    /// Active (not completed, not tombstoned) reminder count.
    pub async fn active_count(&self, owner: &OwnerId) -> Result<u64> {
        let db = self.db.lock().await;
        LibSqlReminderRepository::new(db.connection())
            .active_count(owner)
            .await
    }

    /// Completed reminder count.
    pub async fn completed_count(&self, owner: &OwnerId) -> Result<u64> {
        let db = self.db.lock().await;
        LibSqlReminderRepository::new(db.connection())
            .completed_count(owner)
            .await
    }

    /// Dispatch a boundary crossing reported by the geo collaborator.
    ///
    /// A matching one-shot reminder completes itself (which also cancels
    /// its own registration); an `every_time` reminder stays armed. All
    /// decisions come from current store contents, never listener state.
    pub async fn handle_geo_event(&self, event: GeoEvent) -> Result<Option<Reminder>> {
        let Some(stored) = self.get(&event.id).await? else {
            return Ok(None);
        };
        if !stored.is_active() {
            return Ok(None);
        }
        let Trigger::Location {
            edge, every_time, ..
        } = &stored.trigger
        else {
            return Ok(None);
        };
        let (edge, every_time) = (*edge, *every_time);
        if !edge.matches(event.entered) {
            return Ok(None);
        }

        tracing::info!(id = %stored.id, entered = event.entered, "Geo trigger fired");
        if every_time {
            return Ok(Some(stored));
        }
        self.toggle_complete(&event.id).await.map(Some)
    }

    /// Boot recovery: reconcile trigger registrations with store contents.
    pub async fn restore(&self, owner: &OwnerId) -> Result<RestoreReport> {
        self.effects.restore(owner).await
    }

    fn entry_for(reminder: &Reminder, op: OutboxOp) -> Result<OutboxEntry> {
        let payload = serde_json::to_string(&RemoteReminder::from(reminder))?;
        Ok(OutboxEntry::new(
            reminder.owner.clone(),
            reminder.id,
            op,
            payload,
        ))
    }

    async fn finish_txn<V>(conn: &libsql::Connection, written: Result<V>) -> Result<V> {
        match written {
            Ok(value) => {
                if let Err(error) = conn.execute("COMMIT", ()).await {
                    conn.execute("ROLLBACK", ()).await.ok();
                    return Err(error.into());
                }
                Ok(value)
            }
            Err(error) => {
                conn.execute("ROLLBACK", ()).await.ok();
                Err(error)
            }
        }
    }
}
