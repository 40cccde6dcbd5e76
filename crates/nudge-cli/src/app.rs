//! Shared application context for CLI commands

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nudge_core::db::{Database, LibSqlSyncMetaRepository, SyncMetaRepository};
use nudge_core::service::ReminderService;
use nudge_core::sync::{SupabaseRemoteStore, SyncOptions, SyncService};
use nudge_core::triggers::SideEffectScheduler;
use nudge_core::OwnerId;
use tokio::sync::Mutex;

use crate::error::CliError;
use crate::triggers::{ConsoleGeoRegistrar, ConsoleTimeScheduler};

const SESSION_OWNER_KEY: &str = "session_owner";
const SESSION_TOKEN_KEY: &str = "session_access_token";

pub struct App {
    db: Arc<Mutex<Database>>,
    pub service: ReminderService<ConsoleTimeScheduler, ConsoleGeoRegistrar>,
}

impl App {
    pub async fn open(db_path: Option<&Path>) -> Result<Self, CliError> {
        let db_path = db_path.map_or_else(default_db_path, Path::to_path_buf);
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Arc::new(Mutex::new(Database::open(&db_path).await?));
        let effects = SideEffectScheduler::new(
            db.clone(),
            ConsoleTimeScheduler::default(),
            ConsoleGeoRegistrar::default(),
        );
        let service = ReminderService::new(db.clone(), effects);
        Ok(Self { db, service })
    }

    /// The active owner: the stored session, or a guest id minted (and
    /// persisted) on first use.
    pub async fn current_owner(&self) -> Result<OwnerId, CliError> {
        let db = self.db.lock().await;
        let meta = LibSqlSyncMetaRepository::new(db.connection());

        if let Some(owner) = meta.get(SESSION_OWNER_KEY).await? {
            return Ok(OwnerId::from(owner));
        }

        let guest = OwnerId::guest();
        meta.set(SESSION_OWNER_KEY, guest.as_str()).await?;
        tracing::debug!(owner = %guest, "Minted guest owner");
        Ok(guest)
    }

    pub async fn store_session(&self, owner: &OwnerId, token: &str) -> Result<(), CliError> {
        let db = self.db.lock().await;
        let meta = LibSqlSyncMetaRepository::new(db.connection());
        meta.set(SESSION_OWNER_KEY, owner.as_str()).await?;
        meta.set(SESSION_TOKEN_KEY, token).await?;
        Ok(())
    }

    pub async fn clear_session(&self) -> Result<OwnerId, CliError> {
        let guest = OwnerId::guest();
        let db = self.db.lock().await;
        let meta = LibSqlSyncMetaRepository::new(db.connection());
        meta.set(SESSION_OWNER_KEY, guest.as_str()).await?;
        meta.remove(SESSION_TOKEN_KEY).await?;
        Ok(guest)
    }

    /// Move a guest's local data to an authenticated owner. Safe to run
    /// with no remote configured; the records push on the next sync.
    pub async fn migrate_guest(
        &self,
        guest: &OwnerId,
        account: &OwnerId,
    ) -> Result<usize, CliError> {
        Ok(nudge_core::sync::migrate_guest_records(&self.db, guest, account).await?)
    }

    /// Sync service against the configured Supabase project; errors when
    /// the environment or session does not carry the required credentials.
    pub async fn sync_service(&self) -> Result<SyncService<SupabaseRemoteStore>, CliError> {
        let token = {
            let db = self.db.lock().await;
            LibSqlSyncMetaRepository::new(db.connection())
                .get(SESSION_TOKEN_KEY)
                .await?
        };
        let (Ok(base_url), Ok(anon_key), Some(token)) = (
            env::var("NUDGE_SUPABASE_URL"),
            env::var("NUDGE_SUPABASE_ANON_KEY"),
            token,
        ) else {
            return Err(CliError::SyncNotConfigured);
        };

        let remote = SupabaseRemoteStore::new(base_url, anon_key, token)?;
        Ok(SyncService::new(
            self.db.clone(),
            remote,
            SyncOptions::default(),
        ))
    }
}

fn default_db_path() -> PathBuf {
    if let Ok(path) = env::var("NUDGE_DB_PATH") {
        return PathBuf::from(path);
    }
    PathBuf::from("nudge.db")
}
