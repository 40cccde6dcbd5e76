//! Remote store contract

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    Category, Priority, Recurrence, Reminder, ReminderId, ReminderKind, RepeatKind, RepeatUnit,
    SyncStatus, Trigger, TriggerEdge,
};
use crate::owner::OwnerId;

/// Errors from the remote store collaborator
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote store configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Remote HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error: {0} ({1})")]
    Api(String, u16),
    #[error("Remote store unreachable: {0}")]
    Unreachable(String),
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
}

impl RemoteError {
    /// Whether retrying the same request can never succeed.
    ///
    /// Client-side rejections (4xx) are permanent, except request timeout
    /// and rate limiting which are worth another attempt. Transport
    /// failures and 5xx responses are transient.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        match self {
            Self::Api(_, status) => {
                *status >= 400 && *status < 500 && *status != 408 && *status != 429
            }
            Self::InvalidConfiguration(_) | Self::InvalidPayload(_) => true,
            Self::Http(_) | Self::Unreachable(_) => false,
        }
    }
}

/// Wire representation of a reminder row in the remote store
///
/// The remote keeps a `deleted` flag (logical delete); live queries filter
/// it out so deletions surface to clients as absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteReminder {
    pub id: ReminderId,
    pub owner_id: OwnerId,
    pub kind: ReminderKind,
    pub title: String,
    pub notes: Option<String>,
    pub priority: Priority,
    pub category: Category,
    pub is_completed: bool,
    pub completed_at: Option<i64>,
    pub fire_at: Option<i64>,
    #[serde(default)]
    pub repeat_kind: RepeatKind,
    pub repeat_interval: Option<u32>,
    pub repeat_unit: Option<RepeatUnit>,
    pub repeat_days: Option<Vec<u8>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_m: Option<f64>,
    pub trigger_edge: Option<TriggerEdge>,
    pub every_time: Option<bool>,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&Reminder> for RemoteReminder {
    fn from(reminder: &Reminder) -> Self {
        let (fire_at, recurrence, location) = match &reminder.trigger {
            Trigger::Time { fire_at, recurrence } => (Some(*fire_at), Some(recurrence.clone()), None),
            Trigger::Location {
                latitude,
                longitude,
                radius_m,
                edge,
                every_time,
            } => (
                None,
                None,
                Some((*latitude, *longitude, *radius_m, *edge, *every_time)),
            ),
        };
        let recurrence = recurrence.unwrap_or_default();

        Self {
            id: reminder.id,
            owner_id: reminder.owner.clone(),
            kind: reminder.kind(),
            title: reminder.title.clone(),
            notes: reminder.notes.clone(),
            priority: reminder.priority,
            category: reminder.category,
            is_completed: reminder.completed,
            completed_at: reminder.completed_at,
            fire_at,
            repeat_kind: recurrence.kind,
            repeat_interval: recurrence.interval,
            repeat_unit: recurrence.unit,
            repeat_days: recurrence.days,
            latitude: location.map(|l| l.0),
            longitude: location.map(|l| l.1),
            radius_m: location.map(|l| l.2),
            trigger_edge: location.map(|l| l.3),
            every_time: location.map(|l| l.4),
            deleted: false,
            created_at: reminder.created_at,
            updated_at: reminder.updated_at,
        }
    }
}

impl RemoteReminder {
    /// Convert into a local record stamped `synced`, keeping the remote's
    /// timestamps. The trigger handle is device-local and starts empty.
    pub fn into_reminder(self) -> Result<Reminder, RemoteError> {
        let trigger = match self.kind {
            ReminderKind::Time => Trigger::Time {
                fire_at: self.fire_at.ok_or_else(|| {
                    RemoteError::InvalidPayload(format!("time reminder {} has no fire_at", self.id))
                })?,
                recurrence: Recurrence {
                    kind: self.repeat_kind,
                    interval: self.repeat_interval,
                    unit: self.repeat_unit,
                    days: self.repeat_days,
                },
            },
            ReminderKind::Location => {
                let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) else {
                    return Err(RemoteError::InvalidPayload(format!(
                        "location reminder {} has no coordinates",
                        self.id
                    )));
                };
                Trigger::Location {
                    latitude,
                    longitude,
                    radius_m: self.radius_m.unwrap_or(200.0),
                    edge: self.trigger_edge.unwrap_or_default(),
                    every_time: self.every_time.unwrap_or(false),
                }
            }
        };

        Ok(Reminder {
            id: self.id,
            owner: self.owner_id,
            title: self.title,
            notes: self.notes,
            priority: self.priority,
            category: self.category,
            completed: self.is_completed,
            completed_at: self.completed_at,
            trigger,
            trigger_handle: None,
            created_at: self.created_at,
            updated_at: self.updated_at,
            sync_status: SyncStatus::Synced,
        })
    }
}

/// Contract of the authoritative remote store
///
/// Records are addressed by the same id on both sides. Every operation is
/// idempotent so a retry after a failure of unknown outcome is always safe.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Create-or-replace by id (create and update unified)
    async fn upsert(&self, record: &RemoteReminder) -> Result<(), RemoteError>;

    /// Logical delete: sets the `deleted` flag, never a hard delete
    async fn mark_deleted(&self, id: &ReminderId) -> Result<(), RemoteError>;

    /// Live records of the owner whose remote-side modification time is
    /// strictly after `watermark` (all live records when no watermark is
    /// given). The filter runs on the remote's own write clock, not on the
    /// record's `updated_at`: a freshly pushed row carries the device's
    /// older edit timestamp and must still reach other devices.
    async fn modified_since(
        &self,
        owner: &OwnerId,
        watermark: Option<i64>,
    ) -> Result<Vec<RemoteReminder>, RemoteError>;

    /// Ids of every live record of the owner; the reference set for
    /// absence-based deletion detection
    async fn live_ids(&self, owner: &OwnerId) -> Result<HashSet<ReminderId>, RemoteError>;
}
