//! Helpers shared across commands

use chrono::{Local, NaiveDateTime, TimeZone};
use nudge_core::models::{Reminder, ReminderId, Trigger};
use nudge_core::OwnerId;

use crate::app::App;
use crate::error::CliError;

/// Resolve a full id or unique id prefix to a reminder.
pub async fn resolve_reminder(
    app: &App,
    owner: &OwnerId,
    id_or_prefix: &str,
) -> Result<Reminder, CliError> {
    let needle = id_or_prefix.trim();
    if needle.is_empty() {
        return Err(CliError::ReminderNotFound(id_or_prefix.to_string()));
    }

    if let Ok(id) = needle.parse::<ReminderId>() {
        if let Some(reminder) = app.service.get(&id).await? {
            return Ok(reminder);
        }
        return Err(CliError::ReminderNotFound(needle.to_string()));
    }

    let mut matches: Vec<Reminder> = app
        .service
        .list(owner)
        .await?
        .into_iter()
        .filter(|r| r.id.as_str().starts_with(needle))
        .collect();

    match matches.len() {
        0 => Err(CliError::ReminderNotFound(needle.to_string())),
        1 => Ok(matches.remove(0)),
        n => Err(CliError::AmbiguousReminderId(format!(
            "Id prefix '{needle}' matches {n} reminders; use more characters"
        ))),
    }
}

/// Parse a local date/time argument into unix milliseconds.
///
/// Accepts RFC 3339 or the short local form `YYYY-MM-DD HH:MM`.
pub fn parse_when(value: &str) -> Result<i64, CliError> {
    let value = value.trim();

    if let Ok(instant) = chrono::DateTime::parse_from_rfc3339(value) {
        return Ok(instant.timestamp_millis());
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
        .map_err(|e| CliError::InvalidDateTime(format!("{value}: {e}")))?;
    Local
        .from_local_datetime(&naive)
        .single()
        .map(|t| t.timestamp_millis())
        .ok_or_else(|| CliError::InvalidDateTime(format!("{value}: ambiguous local time")))
}

/// One-line human rendering of a reminder.
pub fn format_line(reminder: &Reminder) -> String {
    let short_id: String = reminder.id.as_str().chars().take(8).collect();
    let mark = if reminder.completed { "x" } else { " " };
    let what = match &reminder.trigger {
        Trigger::Time { fire_at, .. } => Local.timestamp_millis_opt(*fire_at).single().map_or_else(
            || format!("at {fire_at}"),
            |t| format!("at {}", t.format("%Y-%m-%d %H:%M")),
        ),
        Trigger::Location {
            latitude,
            longitude,
            radius_m,
            edge,
            ..
        } => format!("near {latitude:.4},{longitude:.4} ({radius_m:.0}m, {})", edge.as_str()),
    };
    format!(
        "[{mark}] {short_id}  {:<30} {what}  ({}, {})",
        reminder.title,
        reminder.priority.as_str(),
        reminder.sync_status.as_str()
    )
}
