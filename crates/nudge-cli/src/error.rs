use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] nudge_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Reminder title cannot be empty")]
    EmptyTitle,
    #[error("A time reminder needs --at, a location reminder needs --lat and --lng")]
    MissingTrigger,
    #[error("Could not parse date/time: {0}")]
    InvalidDateTime(String),
    #[error("Reminder not found for id/prefix: {0}")]
    ReminderNotFound(String),
    #[error("{0}")]
    AmbiguousReminderId(String),
    #[error("Remote store error: {0}")]
    Remote(#[from] nudge_core::sync::RemoteError),
    #[error(
        "Sync is not configured. Run `nudge signin` after setting NUDGE_SUPABASE_URL and NUDGE_SUPABASE_ANON_KEY."
    )]
    SyncNotConfigured,
}
