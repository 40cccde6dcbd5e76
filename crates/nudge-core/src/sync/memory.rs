//! In-memory remote store for tests and offline development

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::models::ReminderId;
use crate::owner::OwnerId;
use crate::util::unix_millis_now;

use super::{RemoteError, RemoteReminder, RemoteStore};

struct Stored {
    record: RemoteReminder,
    /// Remote-side write clock; `modified_since` filters on this
    modified_at: i64,
}

#[derive(Default)]
struct Inner {
    records: HashMap<ReminderId, Stored>,
    /// Scripted failures consumed by the next operations, in order
    failures: VecDeque<RemoteError>,
    offline: bool,
}

/// `RemoteStore` backed by a shared map
///
/// Cloning shares the underlying state, so one instance can stand in for
/// the cloud between several simulated devices.
#[derive(Clone, Default)]
pub struct InMemoryRemoteStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryRemoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing (or regaining) connectivity; while offline every
    /// operation fails with `RemoteError::Unreachable`.
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().unwrap().offline = offline;
    }

    /// Queue an error to be returned by the next operation.
    pub fn fail_next(&self, error: RemoteError) {
        self.inner.lock().unwrap().failures.push_back(error);
    }

    /// Snapshot of a stored record
    #[must_use]
    pub fn record(&self, id: &ReminderId) -> Option<RemoteReminder> {
        self.inner
            .lock()
            .unwrap()
            .records
            .get(id)
            .map(|s| s.record.clone())
    }

    /// Number of live (not logically deleted) records
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .records
            .values()
            .filter(|s| !s.record.deleted)
            .count()
    }

    /// Insert a record directly, as another device's push would
    pub fn seed(&self, record: RemoteReminder) {
        self.inner.lock().unwrap().records.insert(
            record.id,
            Stored {
                record,
                modified_at: unix_millis_now(),
            },
        );
    }

    fn check_available(inner: &mut Inner) -> Result<(), RemoteError> {
        if inner.offline {
            return Err(RemoteError::Unreachable("simulated offline".to_string()));
        }
        if let Some(error) = inner.failures.pop_front() {
            return Err(error);
        }
        Ok(())
    }
}

impl RemoteStore for InMemoryRemoteStore {
    async fn upsert(&self, record: &RemoteReminder) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_available(&mut inner)?;
        inner.records.insert(
            record.id,
            Stored {
                record: record.clone(),
                modified_at: unix_millis_now(),
            },
        );
        Ok(())
    }

    async fn mark_deleted(&self, id: &ReminderId) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_available(&mut inner)?;
        // Deleting an unknown id is a no-op: the operation is idempotent
        if let Some(stored) = inner.records.get_mut(id) {
            stored.record.deleted = true;
            stored.modified_at = unix_millis_now();
        }
        Ok(())
    }

    async fn modified_since(
        &self,
        owner: &OwnerId,
        watermark: Option<i64>,
    ) -> Result<Vec<RemoteReminder>, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_available(&mut inner)?;
        let since = watermark.unwrap_or(i64::MIN);
        Ok(inner
            .records
            .values()
            .filter(|s| {
                !s.record.deleted && s.record.owner_id == *owner && s.modified_at > since
            })
            .map(|s| s.record.clone())
            .collect())
    }

    async fn live_ids(&self, owner: &OwnerId) -> Result<HashSet<ReminderId>, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_available(&mut inner)?;
        Ok(inner
            .records
            .values()
            .filter(|s| !s.record.deleted && s.record.owner_id == *owner)
            .map(|s| s.record.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Recurrence, Reminder, Trigger};

    fn wire(owner: &OwnerId, title: &str) -> RemoteReminder {
        RemoteReminder::from(&Reminder::new(
            owner.clone(),
            title,
            Trigger::Time {
                fire_at: 1,
                recurrence: Recurrence::none(),
            },
        ))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upsert_is_idempotent() {
        let store = InMemoryRemoteStore::new();
        let owner = OwnerId::new("user-1");
        let record = wire(&owner, "Once");

        store.upsert(&record).await.unwrap();
        store.upsert(&record).await.unwrap();

        assert_eq!(store.live_len(), 1);
        assert_eq!(store.record(&record.id).unwrap(), record);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn logical_delete_hides_from_live_queries() {
        let store = InMemoryRemoteStore::new();
        let owner = OwnerId::new("user-1");
        let record = wire(&owner, "Short-lived");

        store.upsert(&record).await.unwrap();
        store.mark_deleted(&record.id).await.unwrap();

        assert!(store.live_ids(&owner).await.unwrap().is_empty());
        assert!(store
            .modified_since(&owner, None)
            .await
            .unwrap()
            .is_empty());
        // The row itself survives as a logical tombstone
        assert!(store.record(&record.id).unwrap().deleted);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_fails_every_operation() {
        let store = InMemoryRemoteStore::new();
        let owner = OwnerId::new("user-1");
        store.set_offline(true);

        let error = store.upsert(&wire(&owner, "Nope")).await.unwrap_err();
        assert!(matches!(error, RemoteError::Unreachable(_)));
        assert!(store.live_ids(&owner).await.is_err());

        store.set_offline(false);
        assert!(store.live_ids(&owner).await.is_ok());
    }
}
