//! Data models for Nudge

mod outbox;
mod reminder;

pub use outbox::{backoff_delay, OutboxEntry, OutboxEntryId, OutboxOp, OutboxStatus};
pub use reminder::{
    Category, Priority, Recurrence, Reminder, ReminderId, ReminderKind, RepeatKind, RepeatUnit,
    SyncStatus, Trigger, TriggerEdge,
};
