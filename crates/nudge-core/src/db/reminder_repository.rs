//! Reminder repository implementation

use std::str::FromStr;

use libsql::{params, Connection, Row};

use crate::error::{Error, Result};
use crate::models::{
    Category, Priority, Recurrence, Reminder, ReminderId, ReminderKind, RepeatKind, RepeatUnit,
    SyncStatus, Trigger, TriggerEdge,
};
use crate::owner::OwnerId;
use crate::util::unix_millis_now;

const COLUMNS: &str = "id, owner_id, kind, title, notes, priority, category, \
     is_completed, completed_at, fire_at, repeat_kind, repeat_interval, repeat_unit, \
     repeat_days, latitude, longitude, radius_m, trigger_edge, every_time, \
     trigger_handle, created_at, updated_at, sync_status";

/// Trait for reminder storage operations (async)
///
/// Owner-visible mutations stamp `updated_at` with the current time;
/// device-local bookkeeping (`set_sync_status`, `set_trigger_handle`) and
/// `bulk_upsert_synced` never touch it, so the last-write-wins clock only
/// moves on writes the owner actually made.
#[allow(async_fn_in_trait)]
pub trait ReminderRepository {
    /// Insert a new reminder as-is
    async fn insert(&self, reminder: &Reminder) -> Result<()>;

    /// Get a reminder by ID, regardless of sync status
    async fn get(&self, id: &ReminderId) -> Result<Option<Reminder>>;

    /// List an owner's reminders, hiding tombstoned (`pending_delete`) rows
    async fn list_for_owner(&self, owner: &OwnerId) -> Result<Vec<Reminder>>;

    /// List reminders whose sync status is not `synced`
    async fn list_pending(&self, owner: &OwnerId) -> Result<Vec<Reminder>>;

    /// List reminders whose sync status is `synced`
    async fn list_synced(&self, owner: &OwnerId) -> Result<Vec<Reminder>>;

    /// Write back an edited reminder, stamping `updated_at` to now
    async fn update(&self, reminder: &Reminder) -> Result<Reminder>;

    /// Set the sync status without touching `updated_at`
    async fn set_sync_status(&self, id: &ReminderId, status: SyncStatus) -> Result<()>;

    /// Persist (or clear) the external trigger handle without touching `updated_at`
    async fn set_trigger_handle(&self, id: &ReminderId, handle: Option<&str>) -> Result<()>;

    /// Tombstone a reminder (`pending_delete`), stamping `updated_at`
    async fn soft_delete(&self, id: &ReminderId) -> Result<()>;

    /// Remove a reminder row entirely
    async fn hard_delete(&self, id: &ReminderId) -> Result<()>;

    /// Upsert records from the remote store, always stamping `synced` and
    /// preserving the remote's timestamps. Existing rows keep their local
    /// trigger handle.
    async fn bulk_upsert_synced(&self, reminders: &[Reminder]) -> Result<()>;

    /// Reassign every reminder of `from` to `to`, stamping `pending_create`.
    /// Returns the reassigned rows. Runs without its own transaction so the
    /// caller can compose it into a larger atomic unit.
    async fn reassign_owner(&self, from: &OwnerId, to: &OwnerId) -> Result<Vec<Reminder>>;

    /// Number of not-yet-synced rows for the owner
    async fn pending_count(&self, owner: &OwnerId) -> Result<u64>;

    /// Number of active (not completed, not tombstoned) rows for the owner
    async fn active_count(&self, owner: &OwnerId) -> Result<u64>;

    /// Number of completed rows for the owner
    async fn completed_count(&self, owner: &OwnerId) -> Result<u64>;
}

/// libSQL implementation of `ReminderRepository`
pub struct LibSqlReminderRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlReminderRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_reminder(row: &Row) -> Result<Reminder> {
        let id: String = row.get(0)?;
        let owner: String = row.get(1)?;
        let kind: String = row.get(2)?;
        let kind = ReminderKind::from_str(&kind).map_err(Error::Database)?;

        let trigger = match kind {
            ReminderKind::Time => {
                let fire_at: Option<i64> = row.get(9)?;
                let fire_at = fire_at
                    .ok_or_else(|| Error::Database(format!("time reminder {id} has no fire_at")))?;
                let repeat_kind: String = row.get(10)?;
                let days: Option<String> = row.get(13)?;
                let unit: Option<String> = row.get(12)?;
                let recurrence = Recurrence {
                    kind: RepeatKind::from_str(&repeat_kind).map_err(Error::Database)?,
                    interval: row
                        .get::<Option<i64>>(11)?
                        .map(|v| u32::try_from(v).unwrap_or(0)),
                    unit: unit
                        .map(|u| RepeatUnit::from_str(&u).map_err(Error::Database))
                        .transpose()?,
                    days: days.map(|d| serde_json::from_str(&d)).transpose()?,
                };
                Trigger::Time { fire_at, recurrence }
            }
            ReminderKind::Location => {
                let latitude: Option<f64> = row.get(14)?;
                let longitude: Option<f64> = row.get(15)?;
                let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
                    return Err(Error::Database(format!(
                        "location reminder {id} has no coordinates"
                    )));
                };
                let edge: Option<String> = row.get(17)?;
                Trigger::Location {
                    latitude,
                    longitude,
                    radius_m: row.get::<Option<f64>>(16)?.unwrap_or(200.0),
                    edge: edge
                        .map(|e| TriggerEdge::from_str(&e).map_err(Error::Database))
                        .transpose()?
                        .unwrap_or_default(),
                    every_time: row.get::<Option<i64>>(18)?.unwrap_or(0) != 0,
                }
            }
        };

        let priority: String = row.get(5)?;
        let category: String = row.get(6)?;
        let sync_status: String = row.get(22)?;

        Ok(Reminder {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid reminder id: {id}")))?,
            owner: OwnerId::from(owner),
            title: row.get(3)?,
            notes: row.get(4)?,
            priority: Priority::from_str(&priority).map_err(Error::Database)?,
            category: Category::from_str(&category).map_err(Error::Database)?,
            completed: row.get::<i64>(7)? != 0,
            completed_at: row.get(8)?,
            trigger,
            trigger_handle: row.get(19)?,
            created_at: row.get(20)?,
            updated_at: row.get(21)?,
            sync_status: SyncStatus::from_str(&sync_status).map_err(Error::Database)?,
        })
    }

    async fn collect(&self, sql: &str, params: impl libsql::params::IntoParams) -> Result<Vec<Reminder>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut reminders = Vec::new();
        while let Some(row) = rows.next().await? {
            reminders.push(Self::parse_reminder(&row)?);
        }
        Ok(reminders)
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

/// Flattened trigger columns used by inserts and upserts
struct TriggerColumns {
    fire_at: Option<i64>,
    repeat_kind: &'static str,
    repeat_interval: Option<i64>,
    repeat_unit: Option<&'static str>,
    repeat_days: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius_m: Option<f64>,
    trigger_edge: Option<&'static str>,
    every_time: Option<i64>,
}

impl TriggerColumns {
    fn from_trigger(trigger: &Trigger) -> Result<Self> {
        Ok(match trigger {
            Trigger::Time { fire_at, recurrence } => Self {
                fire_at: Some(*fire_at),
                repeat_kind: recurrence.kind.as_str(),
                repeat_interval: recurrence.interval.map(i64::from),
                repeat_unit: recurrence.unit.map(RepeatUnit::as_str),
                repeat_days: recurrence
                    .days
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                latitude: None,
                longitude: None,
                radius_m: None,
                trigger_edge: None,
                every_time: None,
            },
            Trigger::Location {
                latitude,
                longitude,
                radius_m,
                edge,
                every_time,
            } => Self {
                fire_at: None,
                repeat_kind: RepeatKind::None.as_str(),
                repeat_interval: None,
                repeat_unit: None,
                repeat_days: None,
                latitude: Some(*latitude),
                longitude: Some(*longitude),
                radius_m: Some(*radius_m),
                trigger_edge: Some(edge.as_str()),
                every_time: Some(i64::from(*every_time)),
            },
        })
    }
}

impl ReminderRepository for LibSqlReminderRepository<'_> {
    async fn insert(&self, reminder: &Reminder) -> Result<()> {
        let t = TriggerColumns::from_trigger(&reminder.trigger)?;

        self.conn
            .execute(
                "INSERT INTO reminders (
                    id, owner_id, kind, title, notes, priority, category,
                    is_completed, completed_at, fire_at, repeat_kind, repeat_interval,
                    repeat_unit, repeat_days, latitude, longitude, radius_m,
                    trigger_edge, every_time, trigger_handle, created_at, updated_at,
                    sync_status
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    reminder.id.as_str(),
                    reminder.owner.as_str(),
                    reminder.kind().as_str(),
                    reminder.title.as_str(),
                    reminder.notes.as_deref(),
                    reminder.priority.as_str(),
                    reminder.category.as_str(),
                    i64::from(reminder.completed),
                    reminder.completed_at,
                    t.fire_at,
                    t.repeat_kind,
                    t.repeat_interval,
                    t.repeat_unit,
                    t.repeat_days,
                    t.latitude,
                    t.longitude,
                    t.radius_m,
                    t.trigger_edge,
                    t.every_time,
                    reminder.trigger_handle.as_deref(),
                    reminder.created_at,
                    reminder.updated_at,
                    reminder.sync_status.as_str(),
                ],
            )
            .await?;

        Ok(())
    }

    async fn get(&self, id: &ReminderId) -> Result<Option<Reminder>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {COLUMNS} FROM reminders WHERE id = ?"),
                params![id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_reminder(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_for_owner(&self, owner: &OwnerId) -> Result<Vec<Reminder>> {
        self.collect(
            &format!(
                "SELECT {COLUMNS} FROM reminders
                 WHERE owner_id = ? AND sync_status != 'pending_delete'
                 ORDER BY created_at DESC"
            ),
            params![owner.as_str()],
        )
        .await
    }

    async fn list_pending(&self, owner: &OwnerId) -> Result<Vec<Reminder>> {
        self.collect(
            &format!(
                "SELECT {COLUMNS} FROM reminders
                 WHERE owner_id = ? AND sync_status != 'synced'
                 ORDER BY created_at ASC"
            ),
            params![owner.as_str()],
        )
        .await
    }

    async fn list_synced(&self, owner: &OwnerId) -> Result<Vec<Reminder>> {
        self.collect(
            &format!(
                "SELECT {COLUMNS} FROM reminders
                 WHERE owner_id = ? AND sync_status = 'synced'
                 ORDER BY created_at ASC"
            ),
            params![owner.as_str()],
        )
        .await
    }

    async fn update(&self, reminder: &Reminder) -> Result<Reminder> {
        let now = unix_millis_now();
        let t = TriggerColumns::from_trigger(&reminder.trigger)?;

        let rows = self
            .conn
            .execute(
                "UPDATE reminders SET
                    kind = ?, title = ?, notes = ?, priority = ?, category = ?,
                    is_completed = ?, completed_at = ?, fire_at = ?, repeat_kind = ?,
                    repeat_interval = ?, repeat_unit = ?, repeat_days = ?, latitude = ?,
                    longitude = ?, radius_m = ?, trigger_edge = ?, every_time = ?,
                    updated_at = ?, sync_status = ?
                 WHERE id = ?",
                params![
                    reminder.kind().as_str(),
                    reminder.title.as_str(),
                    reminder.notes.as_deref(),
                    reminder.priority.as_str(),
                    reminder.category.as_str(),
                    i64::from(reminder.completed),
                    reminder.completed_at,
                    t.fire_at,
                    t.repeat_kind,
                    t.repeat_interval,
                    t.repeat_unit,
                    t.repeat_days,
                    t.latitude,
                    t.longitude,
                    t.radius_m,
                    t.trigger_edge,
                    t.every_time,
                    now,
                    reminder.sync_status.as_str(),
                    reminder.id.as_str(),
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(reminder.id.to_string()));
        }

        self.get(&reminder.id)
            .await?
            .ok_or_else(|| Error::NotFound(reminder.id.to_string()))
    }

    async fn set_sync_status(&self, id: &ReminderId, status: SyncStatus) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE reminders SET sync_status = ? WHERE id = ?",
                params![status.as_str(), id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn set_trigger_handle(&self, id: &ReminderId, handle: Option<&str>) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE reminders SET trigger_handle = ? WHERE id = ?",
                params![handle, id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn soft_delete(&self, id: &ReminderId) -> Result<()> {
        let now = unix_millis_now();
        let rows = self
            .conn
            .execute(
                "UPDATE reminders SET sync_status = 'pending_delete', updated_at = ? WHERE id = ?",
                params![now, id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn hard_delete(&self, id: &ReminderId) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM reminders WHERE id = ?",
                params![id.as_str()],
            )
            .await?;
        Ok(())
    }

    async fn bulk_upsert_synced(&self, reminders: &[Reminder]) -> Result<()> {
        for reminder in reminders {
            let t = TriggerColumns::from_trigger(&reminder.trigger)?;

            self.conn
                .execute(
                    "INSERT INTO reminders (
                        id, owner_id, kind, title, notes, priority, category,
                        is_completed, completed_at, fire_at, repeat_kind, repeat_interval,
                        repeat_unit, repeat_days, latitude, longitude, radius_m,
                        trigger_edge, every_time, trigger_handle, created_at, updated_at,
                        sync_status
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?, 'synced')
                    ON CONFLICT(id) DO UPDATE SET
                        owner_id = excluded.owner_id,
                        kind = excluded.kind,
                        title = excluded.title,
                        notes = excluded.notes,
                        priority = excluded.priority,
                        category = excluded.category,
                        is_completed = excluded.is_completed,
                        completed_at = excluded.completed_at,
                        fire_at = excluded.fire_at,
                        repeat_kind = excluded.repeat_kind,
                        repeat_interval = excluded.repeat_interval,
                        repeat_unit = excluded.repeat_unit,
                        repeat_days = excluded.repeat_days,
                        latitude = excluded.latitude,
                        longitude = excluded.longitude,
                        radius_m = excluded.radius_m,
                        trigger_edge = excluded.trigger_edge,
                        every_time = excluded.every_time,
                        created_at = excluded.created_at,
                        updated_at = excluded.updated_at,
                        sync_status = 'synced'",
                    params![
                        reminder.id.as_str(),
                        reminder.owner.as_str(),
                        reminder.kind().as_str(),
                        reminder.title.as_str(),
                        reminder.notes.as_deref(),
                        reminder.priority.as_str(),
                        reminder.category.as_str(),
                        i64::from(reminder.completed),
                        reminder.completed_at,
                        t.fire_at,
                        t.repeat_kind,
                        t.repeat_interval,
                        t.repeat_unit,
                        t.repeat_days,
                        t.latitude,
                        t.longitude,
                        t.radius_m,
                        t.trigger_edge,
                        t.every_time,
                        reminder.created_at,
                        reminder.updated_at,
                    ],
                )
                .await?;
        }

        Ok(())
    }

    async fn reassign_owner(&self, from: &OwnerId, to: &OwnerId) -> Result<Vec<Reminder>> {
        let now = unix_millis_now();
        self.conn
            .execute(
                "UPDATE reminders
                 SET owner_id = ?, sync_status = 'pending_create', updated_at = ?
                 WHERE owner_id = ?",
                params![to.as_str(), now, from.as_str()],
            )
            .await?;

        self.collect(
            &format!(
                "SELECT {COLUMNS} FROM reminders WHERE owner_id = ? ORDER BY created_at ASC"
            ),
            params![to.as_str()],
        )
        .await
    }

    async fn pending_count(&self, owner: &OwnerId) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM reminders WHERE owner_id = ? AND sync_status != 'synced'",
            params![owner.as_str()],
        )
        .await
    }

    async fn active_count(&self, owner: &OwnerId) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM reminders
             WHERE owner_id = ? AND sync_status != 'pending_delete' AND is_completed = 0",
            params![owner.as_str()],
        )
        .await
    }

    async fn completed_count(&self, owner: &OwnerId) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM reminders
             WHERE owner_id = ? AND sync_status != 'pending_delete' AND is_completed = 1",
            params![owner.as_str()],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::Recurrence;

    fn time_reminder(owner: &OwnerId, title: &str, fire_at: i64) -> Reminder {
        Reminder::new(
            owner.clone(),
            title,
            Trigger::Time {
                fire_at,
                recurrence: Recurrence::none(),
            },
        )
    }

    fn location_reminder(owner: &OwnerId, title: &str) -> Reminder {
        Reminder::new(
            owner.clone(),
            title,
            Trigger::Location {
                latitude: 59.33,
                longitude: 18.07,
                radius_m: 150.0,
                edge: TriggerEdge::Enter,
                every_time: false,
            },
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_and_get() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlReminderRepository::new(db.connection());
        let owner = OwnerId::new("user-1");

        let reminder = time_reminder(&owner, "Call dentist", 1_700_000_000_000);
        repo.insert(&reminder).await.unwrap();

        let fetched = repo.get(&reminder.id).await.unwrap().unwrap();
        assert_eq!(fetched, reminder);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_location_round_trip() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlReminderRepository::new(db.connection());
        let owner = OwnerId::new("user-1");

        let reminder = location_reminder(&owner, "Buy milk");
        repo.insert(&reminder).await.unwrap();

        let fetched = repo.get(&reminder.id).await.unwrap().unwrap();
        assert_eq!(fetched.trigger, reminder.trigger);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_hides_tombstones() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlReminderRepository::new(db.connection());
        let owner = OwnerId::new("user-1");

        let keep = time_reminder(&owner, "Keep", 1);
        let drop = time_reminder(&owner, "Drop", 2);
        repo.insert(&keep).await.unwrap();
        repo.insert(&drop).await.unwrap();
        repo.soft_delete(&drop.id).await.unwrap();

        let listed = repo.list_for_owner(&owner).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, keep.id);

        // Still present under the hood, tagged for remote deletion
        let tombstoned = repo.get(&drop.id).await.unwrap().unwrap();
        assert_eq!(tombstoned.sync_status, SyncStatus::PendingDelete);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_stamps_updated_at() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlReminderRepository::new(db.connection());
        let owner = OwnerId::new("user-1");

        let mut reminder = time_reminder(&owner, "Original", 1);
        repo.insert(&reminder).await.unwrap();

        reminder.title = "Edited".to_string();
        let updated = repo.update(&reminder).await.unwrap();
        assert_eq!(updated.title, "Edited");
        assert!(updated.updated_at >= reminder.updated_at);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_bookkeeping_does_not_touch_updated_at() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlReminderRepository::new(db.connection());
        let owner = OwnerId::new("user-1");

        let reminder = time_reminder(&owner, "Stamp check", 1);
        repo.insert(&reminder).await.unwrap();

        repo.set_sync_status(&reminder.id, SyncStatus::Synced)
            .await
            .unwrap();
        repo.set_trigger_handle(&reminder.id, Some("handle-9"))
            .await
            .unwrap();

        let fetched = repo.get(&reminder.id).await.unwrap().unwrap();
        assert_eq!(fetched.updated_at, reminder.updated_at);
        assert_eq!(fetched.trigger_handle.as_deref(), Some("handle-9"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_bulk_upsert_preserves_remote_timestamps_and_local_handle() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlReminderRepository::new(db.connection());
        let owner = OwnerId::new("user-1");

        let mut local = time_reminder(&owner, "Local title", 1);
        repo.insert(&local).await.unwrap();
        repo.set_trigger_handle(&local.id, Some("handle-1"))
            .await
            .unwrap();

        local.title = "Remote title".to_string();
        local.updated_at += 5_000;
        repo.bulk_upsert_synced(&[local.clone()]).await.unwrap();

        let merged = repo.get(&local.id).await.unwrap().unwrap();
        assert_eq!(merged.title, "Remote title");
        assert_eq!(merged.updated_at, local.updated_at);
        assert_eq!(merged.sync_status, SyncStatus::Synced);
        assert_eq!(merged.trigger_handle.as_deref(), Some("handle-1"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reassign_owner_marks_pending_create() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlReminderRepository::new(db.connection());
        let guest = OwnerId::guest();
        let account = OwnerId::new("user-1");

        for title in ["a", "b", "c"] {
            repo.insert(&time_reminder(&guest, title, 1)).await.unwrap();
        }

        let moved = repo.reassign_owner(&guest, &account).await.unwrap();
        assert_eq!(moved.len(), 3);
        for reminder in &moved {
            assert_eq!(reminder.owner, account);
            assert_eq!(reminder.sync_status, SyncStatus::PendingCreate);
        }
        assert!(repo.list_for_owner(&guest).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_counts() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlReminderRepository::new(db.connection());
        let owner = OwnerId::new("user-1");

        let mut done = time_reminder(&owner, "Done", 1);
        repo.insert(&done).await.unwrap();
        done.completed = true;
        done.completed_at = Some(2);
        repo.update(&done).await.unwrap();

        repo.insert(&time_reminder(&owner, "Open", 3)).await.unwrap();

        assert_eq!(repo.active_count(&owner).await.unwrap(), 1);
        assert_eq!(repo.completed_count(&owner).await.unwrap(), 1);
        assert_eq!(repo.pending_count(&owner).await.unwrap(), 2);
    }
}
