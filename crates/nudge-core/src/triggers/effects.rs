//! Side-effect scheduler
//!
//! Keeps platform registrations in lock-step with record state: exactly one
//! active time or geo registration per non-completed, non-deleted reminder
//! of the matching kind, zero otherwise.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{Database, LibSqlReminderRepository, ReminderRepository};
use crate::error::Result;
use crate::models::{Reminder, ReminderId, ReminderKind, Trigger};
use crate::owner::OwnerId;
use crate::util::unix_millis_now;

use super::{AlertPayload, GeoTriggerRegistrar, TimeTriggerScheduler, TriggerHandle};

/// Hard ceiling on simultaneously armed geofences; platforms reject more.
/// When exceeded, the oldest reminders lose their regions first.
pub const MAX_GEO_TRIGGERS: usize = 95;

/// What a boot-recovery pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub time_registered: usize,
    pub geo_registered: usize,
    pub evicted: usize,
    pub orphans_cleared: usize,
}

/// Translates reminder lifecycle transitions into platform trigger calls
pub struct SideEffectScheduler<T, G> {
    db: Arc<Mutex<Database>>,
    time: T,
    geo: G,
}

impl<T: TimeTriggerScheduler, G: GeoTriggerRegistrar> SideEffectScheduler<T, G> {
    pub const fn new(db: Arc<Mutex<Database>>, time: T, geo: G) -> Self {
        Self { db, time, geo }
    }

    /// Register the trigger for a freshly created reminder.
    pub async fn on_created(&self, mut reminder: Reminder) -> Result<Reminder> {
        let handle = self.register_for(&reminder, unix_millis_now()).await?;
        self.persist_handle(&reminder.id, handle.as_ref()).await?;
        reminder.trigger_handle = handle.map(|h| h.as_str().to_string());
        Ok(reminder)
    }

    /// Re-register after an edit. The previous registration is always
    /// cancelled first, even when the trigger fields did not change, so a
    /// changed payload can never leave a duplicate behind.
    pub async fn on_updated(&self, previous: &Reminder, mut updated: Reminder) -> Result<Reminder> {
        self.cancel_registration(previous).await;

        let handle = self.register_for(&updated, unix_millis_now()).await?;
        self.persist_handle(&updated.id, handle.as_ref()).await?;
        updated.trigger_handle = handle.map(|h| h.as_str().to_string());
        Ok(updated)
    }

    /// Drop the registration of a deleted reminder.
    pub async fn on_deleted(&self, reminder: &Reminder) {
        self.cancel_registration(reminder).await;
        // The row may already be hard-deleted; clearing the handle is
        // best-effort bookkeeping.
        self.persist_handle(&reminder.id, None).await.ok();
    }

    /// Boot recovery: re-derive the should-be-registered set from the local
    /// store and reconcile it against what the platform reports, enforcing
    /// the geofence cap by evicting the oldest regions.
    pub async fn restore(&self, owner: &OwnerId) -> Result<RestoreReport> {
        let now = unix_millis_now();
        let reminders = {
            let db = self.db.lock().await;
            LibSqlReminderRepository::new(db.connection())
                .list_for_owner(owner)
                .await?
        };

        let platform_alerts: HashSet<TriggerHandle> =
            self.time.scheduled().await?.into_iter().collect();
        let platform_regions: HashSet<TriggerHandle> =
            self.geo.registered().await?.into_iter().collect();

        let mut report = RestoreReport::default();
        let mut referenced_alerts: HashSet<TriggerHandle> = HashSet::new();
        let mut referenced_regions: HashSet<TriggerHandle> = HashSet::new();

        let mut geo_candidates: Vec<&Reminder> = Vec::new();

        for reminder in &reminders {
            match reminder.kind() {
                ReminderKind::Time => {
                    let handle = reminder.trigger_handle.clone().map(TriggerHandle::new);
                    if should_register(reminder, now) {
                        match handle {
                            Some(h) if platform_alerts.contains(&h) => {
                                referenced_alerts.insert(h);
                            }
                            _ => {
                                if let Some(fresh) = self.register_for(reminder, now).await? {
                                    self.persist_handle(&reminder.id, Some(&fresh)).await?;
                                    referenced_alerts.insert(fresh);
                                    report.time_registered += 1;
                                }
                            }
                        }
                    } else if let Some(h) = handle {
                        if platform_alerts.contains(&h) {
                            self.time.cancel(&h).await.ok();
                        }
                        self.persist_handle(&reminder.id, None).await?;
                    }
                }
                ReminderKind::Location => {
                    if should_register(reminder, now) {
                        geo_candidates.push(reminder);
                    } else if let Some(h) = reminder.trigger_handle.clone().map(TriggerHandle::new) {
                        if platform_regions.contains(&h) {
                            self.geo.unregister(&h).await.ok();
                        }
                        self.persist_handle(&reminder.id, None).await?;
                    }
                }
            }
        }

        // Newest reminders win the limited region slots
        geo_candidates.sort_by_key(|r| std::cmp::Reverse(r.created_at));

        for (index, reminder) in geo_candidates.iter().enumerate() {
            let handle = reminder.trigger_handle.clone().map(TriggerHandle::new);
            if index < MAX_GEO_TRIGGERS {
                match handle {
                    Some(h) if platform_regions.contains(&h) => {
                        referenced_regions.insert(h);
                    }
                    _ => {
                        if let Some(fresh) = self.register_for(reminder, now).await? {
                            self.persist_handle(&reminder.id, Some(&fresh)).await?;
                            referenced_regions.insert(fresh);
                            report.geo_registered += 1;
                        }
                    }
                }
            } else {
                if let Some(h) = handle {
                    if platform_regions.contains(&h) {
                        self.geo.unregister(&h).await.ok();
                    }
                }
                self.persist_handle(&reminder.id, None).await?;
                report.evicted += 1;
            }
        }

        // Platform registrations no record claims anymore
        for orphan in platform_alerts.difference(&referenced_alerts) {
            self.time.cancel(orphan).await.ok();
            report.orphans_cleared += 1;
        }
        for orphan in platform_regions.difference(&referenced_regions) {
            self.geo.unregister(orphan).await.ok();
            report.orphans_cleared += 1;
        }

        tracing::info!(
            owner = %owner,
            time_registered = report.time_registered,
            geo_registered = report.geo_registered,
            evicted = report.evicted,
            orphans_cleared = report.orphans_cleared,
            "Restored trigger registrations"
        );
        Ok(report)
    }

    async fn register_for(&self, reminder: &Reminder, now: i64) -> Result<Option<TriggerHandle>> {
        if !should_register(reminder, now) {
            return Ok(None);
        }

        let handle = match &reminder.trigger {
            Trigger::Time { fire_at, .. } => {
                self.time
                    .schedule(&reminder.id, *fire_at, &AlertPayload::for_reminder(reminder))
                    .await?
            }
            Trigger::Location {
                latitude,
                longitude,
                radius_m,
                edge,
                ..
            } => {
                self.geo
                    .register(&reminder.id, *latitude, *longitude, *radius_m, *edge)
                    .await?
            }
        };
        Ok(Some(handle))
    }

    async fn cancel_registration(&self, reminder: &Reminder) {
        let Some(handle) = reminder.trigger_handle.clone().map(TriggerHandle::new) else {
            return;
        };

        let result = match reminder.kind() {
            ReminderKind::Time => self.time.cancel(&handle).await,
            ReminderKind::Location => self.geo.unregister(&handle).await,
        };
        if let Err(error) = result {
            tracing::warn!(id = %reminder.id, %error, "Failed to cancel trigger registration");
        }
    }

    async fn persist_handle(&self, id: &ReminderId, handle: Option<&TriggerHandle>) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlReminderRepository::new(db.connection());
        match repo.set_trigger_handle(id, handle.map(TriggerHandle::as_str)).await {
            Ok(()) | Err(crate::error::Error::NotFound(_)) => Ok(()),
            Err(error) => Err(error),
        }
    }
}

/// Whether a reminder should currently hold a platform registration
fn should_register(reminder: &Reminder, now: i64) -> bool {
    if !reminder.is_active() {
        return false;
    }
    match &reminder.trigger {
        Trigger::Time { fire_at, .. } => *fire_at > now,
        Trigger::Location { .. } => true,
    }
}
