//! Trigger scheduling against platform collaborators
//!
//! The engine never talks to a notification center or a location service
//! directly. It drives two narrow capability interfaces and keeps exactly
//! one live registration per active reminder of the matching kind.

mod effects;
mod geo;
pub mod mock;
mod time;

pub use effects::{RestoreReport, SideEffectScheduler, MAX_GEO_TRIGGERS};
pub use geo::{GeoEvent, GeoTriggerRegistrar};
pub use time::{AlertPayload, TimeTriggerScheduler};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to an external time or geo registration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerHandle(String);

impl TriggerHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TriggerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
