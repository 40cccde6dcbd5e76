//! Database layer for Nudge

mod connection;
mod meta_repository;
mod migrations;
mod outbox_repository;
mod reminder_repository;

pub use connection::Database;
pub use meta_repository::{LibSqlSyncMetaRepository, SyncMetaRepository};
pub use outbox_repository::{LibSqlOutboxRepository, OutboxRepository};
pub use reminder_repository::{LibSqlReminderRepository, ReminderRepository};
