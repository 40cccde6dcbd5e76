//! Cloud synchronization engine
//!
//! Writes flow local store → outbox → push synchronizer → remote store;
//! reads flow remote store → pull reconciler → local store. The orchestrator
//! composes push then pull into one `full_sync` serialized per owner.

mod memory;
mod pull;
mod push;
mod remote;
mod service;
mod supabase;

pub use memory::InMemoryRemoteStore;
pub use pull::{pull_remote, PullOutcome};
pub use push::{push_outbox, PushOutcome, DEFAULT_MAX_ATTEMPTS};
pub use remote::{RemoteError, RemoteReminder, RemoteStore};
pub use service::{
    migrate_guest_records, PendingChanges, SyncOptions, SyncReport, SyncService,
};
pub use supabase::SupabaseRemoteStore;
