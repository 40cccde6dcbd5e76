//! Terminal trigger collaborators
//!
//! A terminal has no notification center or geofencing radio, so the CLI
//! keeps registrations in process memory and announces them on the log.
//! Registrations do not survive the process; `nudge sync` re-derives them
//! from the store on the next run.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Local, TimeZone};
use nudge_core::error::Result;
use nudge_core::models::{ReminderId, TriggerEdge};
use nudge_core::triggers::{
    AlertPayload, GeoTriggerRegistrar, TimeTriggerScheduler, TriggerHandle,
};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct ConsoleTimeScheduler {
    alerts: Arc<Mutex<HashMap<TriggerHandle, ReminderId>>>,
}

impl TimeTriggerScheduler for ConsoleTimeScheduler {
    async fn schedule(
        &self,
        id: &ReminderId,
        fire_at: i64,
        payload: &AlertPayload,
    ) -> Result<TriggerHandle> {
        let handle = TriggerHandle::new(format!("alert-{}", Uuid::now_v7()));
        self.alerts.lock().unwrap().insert(handle.clone(), *id);
        let local = Local
            .timestamp_millis_opt(fire_at)
            .single()
            .map_or_else(|| fire_at.to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        tracing::info!(title = %payload.title, at = %local, "Alert scheduled");
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

#[derive(Clone, Default)]
pub struct ConsoleGeoRegistrar {
    regions: Arc<Mutex<HashMap<TriggerHandle, ReminderId>>>,
}

impl GeoTriggerRegistrar for ConsoleGeoRegistrar {
    async fn register(
        &self,
        id: &ReminderId,
        latitude: f64,
        longitude: f64,
        radius_m: f64,
        edge: TriggerEdge,
    ) -> Result<TriggerHandle> {
        let handle = TriggerHandle::new(format!("region-{}", Uuid::now_v7()));
        self.regions.lock().unwrap().insert(handle.clone(), *id);
        tracing::info!(
            latitude,
            longitude,
            radius_m,
            edge = edge.as_str(),
            "Geofence armed"
        );
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
