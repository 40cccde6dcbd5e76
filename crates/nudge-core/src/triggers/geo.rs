//! Geo-trigger registrar collaborator

use crate::error::Result;
use crate::models::{ReminderId, TriggerEdge};

use super::TriggerHandle;

/// A boundary crossing reported asynchronously by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoEvent {
    pub id: ReminderId,
    /// `true` for an enter crossing, `false` for an exit
    pub entered: bool,
}

/// Platform capability that fires an event when a geofence is crossed
#[allow(async_fn_in_trait)]
pub trait GeoTriggerRegistrar {
    /// Arm a circular region; returns the platform handle
    async fn register(
        &self,
        id: &ReminderId,
        latitude: f64,
        longitude: f64,
        radius_m: f64,
        edge: TriggerEdge,
    ) -> Result<TriggerHandle>;

    /// Disarm a region
    async fn unregister(&self, handle: &TriggerHandle) -> Result<()>;

    /// Handles of every region the platform currently has armed
    async fn registered(&self) -> Result<Vec<TriggerHandle>>;
}
