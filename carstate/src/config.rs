//! Session configuration
//!
//! The configuration is supplied once at session construction and is
//! immutable afterwards: the vehicle fingerprint plus the two hardware
//! feature flags that change which messages the schema requests.

use crate::types::Result;
use crate::variant::VehicleVariant;
use serde::{Deserialize, Serialize};

/// Configuration for one drive session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Vehicle fingerprint string identifying the variant
    pub fingerprint: String,

    /// True when the radar unit is not on the monitored vehicle bus
    #[serde(default)]
    pub radar_off_bus: bool,

    /// True when a gas-pedal interceptor is installed
    #[serde(default)]
    pub gas_interceptor: bool,
}

impl SessionConfig {
    /// Create a configuration for the given fingerprint with default flags
    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            radar_off_bus: false,
            gas_interceptor: false,
        }
    }

    /// Builder method: set the radar-off-bus flag
    pub fn with_radar_off_bus(mut self, enabled: bool) -> Self {
        self.radar_off_bus = enabled;
        self
    }

    /// Builder method: set the gas-interceptor flag
    pub fn with_gas_interceptor(mut self, enabled: bool) -> Self {
        self.gas_interceptor = enabled;
        self
    }

    /// Resolve the vehicle variant from the fingerprint
    pub fn variant(&self) -> Result<VehicleVariant> {
        VehicleVariant::from_fingerprint(&self.fingerprint)
    }
}
