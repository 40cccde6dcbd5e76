//! Time-trigger scheduler collaborator

use crate::error::Result;
use crate::models::{Priority, Reminder, ReminderId};

use super::TriggerHandle;

/// Notification content handed to the platform when a trigger fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertPayload {
    pub title: String,
    pub body: Option<String>,
    pub priority: Priority,
}

impl AlertPayload {
    /// Payload for a reminder's own alert.
    #[must_use]
    pub fn for_reminder(reminder: &Reminder) -> Self {
        Self {
            title: reminder.title.clone(),
            body: reminder.notes.clone(),
            priority: reminder.priority,
        }
    }
}

/// Platform capability that fires an alert at a wall-clock deadline
#[allow(async_fn_in_trait)]
pub trait TimeTriggerScheduler {
    /// Schedule an alert for `fire_at` (unix ms); returns the platform handle
    async fn schedule(
        &self,
        id: &ReminderId,
        fire_at: i64,
        payload: &AlertPayload,
    ) -> Result<TriggerHandle>;

    /// Cancel a previously scheduled alert
    async fn cancel(&self, handle: &TriggerHandle) -> Result<()>;

    /// Handles of every alert the platform currently has scheduled
    async fn scheduled(&self) -> Result<Vec<TriggerHandle>>;
}
