//! In-memory trigger collaborators for tests and development

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::models::{ReminderId, TriggerEdge};

use super::{AlertPayload, GeoTriggerRegistrar, TimeTriggerScheduler, TriggerHandle};

/// In-memory stand-in for the platform notification scheduler
#[derive(Clone, Default)]
pub struct MockTimeScheduler {
    alerts: Arc<Mutex<HashMap<TriggerHandle, (ReminderId, i64)>>>,
    next: Arc<AtomicU64>,
}

impl MockTimeScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of alerts currently scheduled
    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fire-at instant of the alert behind `handle`, if scheduled
    #[must_use]
    pub fn fire_at(&self, handle: &TriggerHandle) -> Option<i64> {
        self.alerts.lock().unwrap().get(handle).map(|(_, at)| *at)
    }
}

impl TimeTriggerScheduler for MockTimeScheduler {
    async fn schedule(
        &self,
        id: &ReminderId,
        fire_at: i64,
        _payload: &AlertPayload,
    ) -> Result<TriggerHandle> {
        let handle = TriggerHandle::new(format!("alert-{}", self.next.fetch_add(1, Ordering::SeqCst)));
        self.alerts
            .lock()
            .unwrap()
            .insert(handle.clone(), (*id, fire_at));
        Ok(handle)
    }

    async fn cancel(&self, handle: &TriggerHandle) -> Result<()> {
        self.alerts.lock().unwrap().remove(handle);
        Ok(())
    }

    async fn scheduled(&self) -> Result<Vec<TriggerHandle>> {
        Ok(self.alerts.lock().unwrap().keys().cloned().collect())
    }
}

/// In-memory stand-in for the platform geofencing service
#[derive(Clone, Default)]
pub struct MockGeoRegistrar {
    regions: Arc<Mutex<HashMap<TriggerHandle, ReminderId>>>,
    next: Arc<AtomicU64>,
}

impl MockGeoRegistrar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of regions currently armed
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reminder backing an armed region, if any
    #[must_use]
    pub fn reminder_for(&self, handle: &TriggerHandle) -> Option<ReminderId> {
        self.regions.lock().unwrap().get(handle).copied()
    }
}

impl GeoTriggerRegistrar for MockGeoRegistrar {
    async fn register(
        &self,
        id: &ReminderId,
        _latitude: f64,
        _longitude: f64,
        _radius_m: f64,
        _edge: TriggerEdge,
    ) -> Result<TriggerHandle> {
        let handle =
            TriggerHandle::new(format!("region-{}", self.next.fetch_add(1, Ordering::SeqCst)));
        self.regions.lock().unwrap().insert(handle.clone(), *id);
        Ok(handle)
    }

    async fn unregister(&self, handle: &TriggerHandle) -> Result<()> {
        self.regions.lock().unwrap().remove(handle);
        Ok(())
    }

    async fn registered(&self) -> Result<Vec<TriggerHandle>> {
        Ok(self.regions.lock().unwrap().keys().cloned().collect())
    }
}
