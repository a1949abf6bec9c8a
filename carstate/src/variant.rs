//! Vehicle variant identifiers and per-variant constants
//!
//! Each supported vehicle model/trim carries a small set of constants that
//! the rest of the pipeline parameterizes on: the wheel-speed correction
//! factor, the driver steering-override torque threshold, the gear-shifter
//! code table, and whether the model belongs to the Bosch hardware family.
//! Constants are fixed per variant and immutable for the session.

use crate::types::{CarStateError, GearShifter, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A supported vehicle model/trim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleVariant {
    Civic,
    CivicBosch,
    Accord,
    Accord15,
    AccordHybrid,
    AcuraIlx,
    AcuraRdx,
    Crv,
    Crv5G,
    CrvHybrid,
    Odyssey,
    OdysseyChn,
    Pilot,
    Pilot2019,
    Ridgeline,
}

/// Fingerprint string and variant pairs, in declaration order
const FINGERPRINTS: &[(&str, VehicleVariant)] = &[
    ("HONDA CIVIC 2016 TOURING", VehicleVariant::Civic),
    ("HONDA CIVIC (BOSCH) 2019", VehicleVariant::CivicBosch),
    ("HONDA ACCORD 2018 SPORT 2T", VehicleVariant::Accord),
    ("HONDA ACCORD 2018 LX 1.5T", VehicleVariant::Accord15),
    ("HONDA ACCORD 2018 HYBRID TOURING", VehicleVariant::AccordHybrid),
    ("ACURA ILX 2016 ACURAWATCH PLUS", VehicleVariant::AcuraIlx),
    ("ACURA RDX 2018 ACURAWATCH PLUS", VehicleVariant::AcuraRdx),
    ("HONDA CR-V 2016 TOURING", VehicleVariant::Crv),
    ("HONDA CR-V 2017 EX", VehicleVariant::Crv5G),
    ("HONDA CR-V 2019 HYBRID", VehicleVariant::CrvHybrid),
    ("HONDA ODYSSEY 2018 EX-L", VehicleVariant::Odyssey),
    ("HONDA ODYSSEY 2019 EXCLUSIVE CHN", VehicleVariant::OdysseyChn),
    ("HONDA PILOT 2017 TOURING", VehicleVariant::Pilot),
    ("HONDA PILOT 2019 ELITE", VehicleVariant::Pilot2019),
    ("HONDA RIDGELINE 2017 BLACK EDITION", VehicleVariant::Ridgeline),
];

/// Shifter code table for the Nidec-era gearbox message (sequential codes)
const SHIFTER_VALUES_NIDEC: &[(i64, GearShifter)] = &[
    (1, GearShifter::Park),
    (2, GearShifter::Reverse),
    (3, GearShifter::Neutral),
    (4, GearShifter::Drive),
    (5, GearShifter::Sport),
    (6, GearShifter::Low),
];

/// Shifter code table for Bosch-family gearbox messages (one-hot codes)
const SHIFTER_VALUES_BOSCH: &[(i64, GearShifter)] = &[
    (0x01, GearShifter::Park),
    (0x02, GearShifter::Reverse),
    (0x04, GearShifter::Neutral),
    (0x08, GearShifter::Drive),
    (0x10, GearShifter::Sport),
    (0x20, GearShifter::Low),
];

impl VehicleVariant {
    /// Resolve a variant from its fingerprint string
    ///
    /// An unrecognized fingerprint is a configuration error and aborts
    /// session construction.
    pub fn from_fingerprint(fingerprint: &str) -> Result<Self> {
        FINGERPRINTS
            .iter()
            .find(|(fp, _)| *fp == fingerprint)
            .map(|(_, v)| *v)
            .ok_or_else(|| CarStateError::UnknownVariant(fingerprint.to_string()))
    }

    /// Canonical fingerprint string for this variant
    pub fn fingerprint(self) -> &'static str {
        FINGERPRINTS
            .iter()
            .find(|(_, v)| *v == self)
            .map(|(fp, _)| *fp)
            .unwrap_or("")
    }

    /// Wheel/transmission speed correction factor
    ///
    /// Applied on top of the kph -> m/s conversion; compensates for tire
    /// size differences on models whose reported speeds run low.
    pub fn speed_factor(self) -> f64 {
        match self {
            VehicleVariant::Crv5G => 1.025,
            _ => 1.0,
        }
    }

    /// Driver steering torque above which the driver is overriding (abs)
    pub fn steer_threshold(self) -> f64 {
        match self {
            VehicleVariant::Crv | VehicleVariant::AcuraRdx => 400.0,
            _ => 1200.0,
        }
    }

    /// True for models on the Bosch hardware family
    pub fn is_bosch(self) -> bool {
        matches!(
            self,
            VehicleVariant::Accord
                | VehicleVariant::Accord15
                | VehicleVariant::AccordHybrid
                | VehicleVariant::CivicBosch
                | VehicleVariant::Crv5G
                | VehicleVariant::CrvHybrid
        )
    }

    /// Shifter raw-code table for this variant's gearbox message
    pub fn shifter_values(self) -> &'static [(i64, GearShifter)] {
        if self.is_bosch() {
            SHIFTER_VALUES_BOSCH
        } else {
            SHIFTER_VALUES_NIDEC
        }
    }
}

impl fmt::Display for VehicleVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fingerprint())
    }
}
