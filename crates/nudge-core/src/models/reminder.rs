//! Reminder model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::owner::OwnerId;

/// A unique identifier for a reminder, using UUID v7 (time-sortable)
///
/// Ids are owner-independent and identical on the device and in the cloud;
/// there is no server-side id translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReminderId(Uuid);

impl ReminderId {
    /// Create a new unique reminder ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ReminderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReminderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Kind of trigger driving a reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    Time,
    Location,
}

impl ReminderKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Location => "location",
        }
    }
}

impl FromStr for ReminderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(Self::Time),
            "location" => Ok(Self::Location),
            other => Err(format!("unknown reminder kind: {other}")),
        }
    }
}

/// Reminder priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Reminder category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Personal,
    Work,
    Health,
    Shopping,
    Finance,
    Travel,
    Education,
    Other,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Work => "work",
            Self::Health => "health",
            Self::Shopping => "shopping",
            Self::Finance => "finance",
            Self::Travel => "travel",
            Self::Education => "education",
            Self::Other => "other",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(Self::Personal),
            "work" => Ok(Self::Work),
            "health" => Ok(Self::Health),
            "shopping" => Ok(Self::Shopping),
            "finance" => Ok(Self::Finance),
            "travel" => Ok(Self::Travel),
            "education" => Ok(Self::Education),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// How often a time reminder repeats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatKind {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl RepeatKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for RepeatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown repeat kind: {other}")),
        }
    }
}

/// Unit for custom repeat intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatUnit {
    Days,
    Weeks,
}

impl RepeatUnit {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Days => "days",
            Self::Weeks => "weeks",
        }
    }
}

impl FromStr for RepeatUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "days" => Ok(Self::Days),
            "weeks" => Ok(Self::Weeks),
            other => Err(format!("unknown repeat unit: {other}")),
        }
    }
}

/// Recurrence descriptor for time reminders
///
/// `interval`/`unit` only apply to `Custom`; `days` (0=Sun..6=Sat) only to
/// `Weekly`/`Custom`. The engine stores the descriptor; rolling a recurring
/// reminder forward after it fires is the notification handler's call back
/// into the mutation API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub kind: RepeatKind,
    pub interval: Option<u32>,
    pub unit: Option<RepeatUnit>,
    pub days: Option<Vec<u8>>,
}

impl Recurrence {
    /// A non-repeating descriptor.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_repeating(&self) -> bool {
        !matches!(self.kind, RepeatKind::None)
    }
}

/// Which geofence boundary crossing fires a location reminder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEdge {
    #[default]
    Enter,
    Exit,
    Both,
}

impl TriggerEdge {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Exit => "exit",
            Self::Both => "both",
        }
    }

    /// Whether a concrete crossing (enter=true, exit=false) matches this edge.
    #[must_use]
    pub const fn matches(self, entered: bool) -> bool {
        match self {
            Self::Enter => entered,
            Self::Exit => !entered,
            Self::Both => true,
        }
    }
}

impl FromStr for TriggerEdge {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enter" => Ok(Self::Enter),
            "exit" => Ok(Self::Exit),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown trigger edge: {other}")),
        }
    }
}

/// Kind-specific trigger payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Fires at an absolute wall-clock instant (unix ms), optionally repeating
    Time {
        fire_at: i64,
        recurrence: Recurrence,
    },
    /// Fires when a geofence boundary is crossed
    Location {
        latitude: f64,
        longitude: f64,
        radius_m: f64,
        edge: TriggerEdge,
        /// `true` keeps the region armed after firing; `false` is one-shot
        every_time: bool,
    },
}

impl Trigger {
    #[must_use]
    pub const fn kind(&self) -> ReminderKind {
        match self {
            Self::Time { .. } => ReminderKind::Time,
            Self::Location { .. } => ReminderKind::Location,
        }
    }
}

/// Sync lifecycle tag of a local record
///
/// A record not yet acknowledged by the remote store is never `Synced`.
/// `PendingDelete` rows are hidden from owner queries and hard-removed once
/// the remote delete is acknowledged; no tombstone outlives the ack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    #[default]
    Synced,
    PendingCreate,
    PendingUpdate,
    PendingDelete,
}

impl SyncStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::PendingCreate => "pending_create",
            Self::PendingUpdate => "pending_update",
            Self::PendingDelete => "pending_delete",
        }
    }

    #[must_use]
    pub const fn is_pending(self) -> bool {
        !matches!(self, Self::Synced)
    }

    /// Status after an owner-visible edit. `PendingCreate` is sticky until
    /// the first remote ack; everything else escalates to `PendingUpdate`.
    #[must_use]
    pub const fn escalate_for_update(self) -> Self {
        match self {
            Self::PendingCreate => Self::PendingCreate,
            _ => Self::PendingUpdate,
        }
    }
}

impl FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "synced" => Ok(Self::Synced),
            "pending_create" => Ok(Self::PendingCreate),
            "pending_update" => Ok(Self::PendingUpdate),
            "pending_delete" => Ok(Self::PendingDelete),
            other => Err(format!("unknown sync status: {other}")),
        }
    }
}

/// A reminder in the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    /// Unique identifier, shared verbatim with the remote store
    pub id: ReminderId,
    /// Owning guest or account id
    pub owner: OwnerId,
    pub title: String,
    pub notes: Option<String>,
    pub priority: Priority,
    pub category: Category,
    pub completed: bool,
    /// Completion timestamp (unix ms)
    pub completed_at: Option<i64>,
    pub trigger: Trigger,
    /// Handle of the active time/geo registration with the platform, if any
    pub trigger_handle: Option<String>,
    /// Creation timestamp (unix ms)
    pub created_at: i64,
    /// Last owner-visible write (unix ms); monotonically non-decreasing
    pub updated_at: i64,
    pub sync_status: SyncStatus,
}

impl Reminder {
    /// Create a new reminder with the given trigger.
    ///
    /// Guest-owned reminders start `Synced` (guest data never syncs);
    /// account-owned ones start `PendingCreate`.
    #[must_use]
    pub fn new(owner: OwnerId, title: impl Into<String>, trigger: Trigger) -> Self {
        let now = crate::util::unix_millis_now();
        let sync_status = if owner.is_guest() {
            SyncStatus::Synced
        } else {
            SyncStatus::PendingCreate
        };
        Self {
            id: ReminderId::new(),
            owner,
            title: title.into(),
            notes: None,
            priority: Priority::default(),
            category: Category::default(),
            completed: false,
            completed_at: None,
            trigger,
            trigger_handle: None,
            created_at: now,
            updated_at: now,
            sync_status,
        }
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub const fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub const fn kind(&self) -> ReminderKind {
        self.trigger.kind()
    }

    /// Active reminders are the ones that should hold a live trigger
    /// registration: not completed and not awaiting a remote delete.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.completed && !matches!(self.sync_status, SyncStatus::PendingDelete)
    }
}
