//! Outbox entry model
//!
//! The outbox is a durable log of local mutations not yet acknowledged by
//! the remote store. Entries are drained per owner in FIFO order; a burst
//! of edits produces a queue of entries replayed in order, never merged.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ReminderId;
use crate::owner::OwnerId;

/// Delay before retrying an entry that has failed `attempts` times:
/// `min(1s * 2^attempts, 30s)`.
#[must_use]
pub fn backoff_delay(attempts: u32) -> Duration {
    let millis = 1000_u64.saturating_mul(2_u64.saturating_pow(attempts));
    Duration::from_millis(millis.min(30_000))
}

/// A unique identifier for an outbox entry, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutboxEntryId(Uuid);

impl OutboxEntryId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for OutboxEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OutboxEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OutboxEntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Mutation kind recorded in an outbox entry
///
/// `Create` and `Update` both compile to the same remote upsert-by-id, so
/// redelivery after a crash before ack is safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxOp {
    Create,
    Update,
    Delete,
}

impl OutboxOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl FromStr for OutboxOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown outbox op: {other}")),
        }
    }
}

/// Processing state of an outbox entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    #[default]
    Pending,
    InProgress,
    /// Terminal: max attempts exhausted or a permanent remote rejection
    Failed,
}

impl OutboxStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for OutboxStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown outbox status: {other}")),
        }
    }
}

/// A pending local mutation awaiting remote acknowledgment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: OutboxEntryId,
    pub entity_id: ReminderId,
    pub op: OutboxOp,
    /// JSON snapshot of the record at enqueue time
    pub payload: String,
    pub owner: OwnerId,
    pub status: OutboxStatus,
    pub attempts: u32,
    /// `None` means the entry has never been attempted. Backoff eligibility
    /// comes from this field, not from `attempts == 0`, so a reset counter
    /// can never be mistaken for a fresh entry.
    pub last_attempt_at: Option<i64>,
    /// Creation timestamp (unix ms); drain order is FIFO on this
    pub created_at: i64,
}

impl OutboxEntry {
    /// Create a fresh pending entry for the given mutation.
    #[must_use]
    pub fn new(owner: OwnerId, entity_id: ReminderId, op: OutboxOp, payload: String) -> Self {
        Self {
            id: OutboxEntryId::new(),
            entity_id,
            op,
            payload,
            owner,
            status: OutboxStatus::Pending,
            attempts: 0,
            last_attempt_at: None,
            created_at: crate::util::unix_millis_now(),
        }
    }

    /// Whether a retry of this entry must wait out a backoff delay first.
    #[must_use]
    pub const fn needs_backoff(&self) -> bool {
        self.last_attempt_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
        assert_eq!(backoff_delay(4), Duration::from_secs(16));
        assert_eq!(backoff_delay(5), Duration::from_secs(30));
        assert_eq!(backoff_delay(20), Duration::from_secs(30));
    }

    #[test]
    fn backoff_is_monotonic() {
        let mut previous = Duration::ZERO;
        for attempts in 0..12 {
            let delay = backoff_delay(attempts);
            assert!(delay >= previous);
            previous = delay;
        }
    }

    #[test]
    fn fresh_entry_needs_no_backoff() {
        let entry = OutboxEntry::new(
            OwnerId::new("user-1"),
            ReminderId::new(),
            OutboxOp::Create,
            "{}".to_string(),
        );
        assert_eq!(entry.status, OutboxStatus::Pending);
        assert_eq!(entry.attempts, 0);
        assert!(!entry.needs_backoff());
    }
}
