//! Signal schema registry
//!
//! Pure, per-variant tables describing what the CAN parsing layer must be
//! asked for: which (signal, message, bus) tuples to request, the default to
//! use when a signal is absent, and the expected arrival rate of each
//! message for staleness detection.
//!
//! The registry replaces per-cycle variant branching: message selection
//! (e.g. whether MAIN_ON lives on the steering aggregate or on one of the
//! switch-module messages, or whether door state is a four-signal set or a
//! single aggregate signal) is resolved once at construction. During the
//! cycle the decoder only performs schema lookups.
//!
//! When the same signal name is requested on more than one message, the
//! requirement appended last wins the lookup. Variant- and feature-specific
//! requirements are appended after the base set, so they override it.

use crate::config::SessionConfig;
use crate::types::{Bus, CarStateError, DecodedSignalFrame, Result};
use crate::variant::VehicleVariant;
use std::collections::HashMap;

/// One signal the parsing layer must be asked to decode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalRequirement {
    /// Signal name within the message
    pub signal: &'static str,
    /// Message carrying the signal
    pub message: &'static str,
    /// Bus the message is monitored on
    pub bus: Bus,
    /// Strict signals leave the cycle meaningless when absent; their absence
    /// is logged every cycle instead of silently defaulting
    pub strict: bool,
    /// Value to substitute when the signal is absent from the frame
    pub default: f64,
}

/// Expected arrival rate of one message, for staleness detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MessageRate {
    pub message: &'static str,
    pub bus: Bus,
    pub hz: f64,
}

/// The resolved schema for one session
#[derive(Debug, Clone)]
pub struct SignalSchema {
    requirements: Vec<SignalRequirement>,
    rates: Vec<MessageRate>,
    /// Signal name -> index of the winning requirement
    index: HashMap<&'static str, usize>,
}

impl SignalSchema {
    /// Build the schema for a session configuration
    ///
    /// Deterministic and I/O-free. Fails only for configuration problems
    /// (conflicting requirements for the same signal/message pair).
    pub fn for_config(config: &SessionConfig) -> Result<Self> {
        let variant = config.variant()?;
        let (requirements, rates) =
            requirements_for(variant, config.radar_off_bus, config.gas_interceptor);
        Self::from_parts(requirements, rates)
    }

    fn from_parts(raw: Vec<SignalRequirement>, raw_rates: Vec<MessageRate>) -> Result<Self> {
        let mut requirements: Vec<SignalRequirement> = Vec::with_capacity(raw.len());
        for req in raw {
            let existing = requirements
                .iter()
                .position(|r| r.signal == req.signal && r.message == req.message && r.bus == req.bus);
            match existing {
                // Identical duplicates collapse (several selection arms may
                // request the same pair); conflicting ones are a defect
                Some(i) if requirements[i] == req => continue,
                Some(_) => {
                    return Err(CarStateError::InvalidSchema(format!(
                        "conflicting requirements for {}.{}",
                        req.message, req.signal
                    )))
                }
                None => requirements.push(req),
            }
        }
        if requirements.is_empty() {
            return Err(CarStateError::InvalidSchema("empty requirement set".into()));
        }

        let mut rates: Vec<MessageRate> = Vec::with_capacity(raw_rates.len());
        for rate in raw_rates {
            if !rates.iter().any(|r| r.message == rate.message && r.bus == rate.bus) {
                rates.push(rate);
            }
        }

        let mut index = HashMap::with_capacity(requirements.len());
        for (i, req) in requirements.iter().enumerate() {
            // Last appended wins
            index.insert(req.signal, i);
        }

        Ok(Self {
            requirements,
            rates,
            index,
        })
    }

    /// All signal requirements, in append order
    pub fn requirements(&self) -> &[SignalRequirement] {
        &self.requirements
    }

    /// Expected message rates for staleness detection
    pub fn rates(&self) -> &[MessageRate] {
        &self.rates
    }

    /// True if the schema requests this signal for the active session
    pub fn contains(&self, signal: &str) -> bool {
        self.index.contains_key(signal)
    }

    /// The requirement that wins the lookup for a signal, if requested
    pub fn requirement(&self, signal: &str) -> Option<&SignalRequirement> {
        self.index.get(signal).map(|&i| &self.requirements[i])
    }

    /// Resolve a signal value for this cycle
    ///
    /// Reads from the frame of the bus the winning requirement names.
    /// Absent signals fall back to the schema default; strict signals log a
    /// warning first. Never fails.
    pub fn value(&self, pt: &DecodedSignalFrame, cam: &DecodedSignalFrame, signal: &str) -> f64 {
        let Some(req) = self.requirement(signal) else {
            log::warn!("Signal '{}' not in schema for this session", signal);
            return 0.0;
        };
        let frame = match req.bus {
            Bus::Powertrain => pt,
            Bus::Camera => cam,
        };
        match frame.signal(req.message, req.signal) {
            Some(v) => v,
            None => {
                if req.strict {
                    log::warn!(
                        "Strict signal {}.{} absent on {} bus, using default {}",
                        req.message,
                        req.signal,
                        req.bus,
                        req.default
                    );
                }
                req.default
            }
        }
    }
}

/// Shorthand for a powertrain-bus requirement
fn sig(signal: &'static str, message: &'static str, default: f64) -> SignalRequirement {
    SignalRequirement {
        signal,
        message,
        bus: Bus::Powertrain,
        strict: false,
        default,
    }
}

/// Shorthand for a strict powertrain-bus requirement
fn strict(signal: &'static str, message: &'static str, default: f64) -> SignalRequirement {
    SignalRequirement {
        strict: true,
        ..sig(signal, message, default)
    }
}

/// Shorthand for a powertrain-bus rate check
fn rate(message: &'static str, hz: f64) -> MessageRate {
    MessageRate {
        message,
        bus: Bus::Powertrain,
        hz,
    }
}

/// Generate the requirement and rate tables for a variant
///
/// The selection arms mirror the vehicle wiring: brake state may come from
/// the brake pedal message or a separate brake module, the cruise main
/// switch lives on one of two switch-module messages depending on model
/// year, and door state is either four corner signals or a single
/// driver-door aggregate.
fn requirements_for(
    variant: VehicleVariant,
    radar_off_bus: bool,
    gas_interceptor: bool,
) -> (Vec<SignalRequirement>, Vec<MessageRate>) {
    use VehicleVariant as V;

    let mut signals = vec![
        sig("PEDAL_GAS", "POWERTRAIN_DATA", 0.0),
        strict("WHEEL_SPEED_FL", "FRONT_SPEEDS", 0.0),
        strict("WHEEL_SPEED_FR", "FRONT_SPEEDS", 0.0),
        strict("WHEEL_SPEED_RL", "REAR_SPEEDS", 0.0),
        strict("WHEEL_SPEED_RR", "REAR_SPEEDS", 0.0),
        strict("SPEED1", "SPEEDS", 0.0),
        strict("STEER_ANGLE", "STEERING_SENSORS", 0.0),
        sig("STEER_ANGLE_RATE", "STEERING_SENSORS", 0.0),
        sig("BRAKE_PRESSED", "BRAKE", 0.0),
        sig("BRAKE_SWITCH", "BRAKE", 0.0),
        sig("STEER_TORQUE_DRIVER", "MACCHINA", 0.0),
        sig("ACC_STATUS", "MACCHINA", 0.0),
        sig("MAIN_ON", "MACCHINA", 0.0),
        sig("GEAR", "MACCHINA", 0.0),
        sig("GEAR_SHIFTER", "MACCHINA", 0.0),
        sig("STEER_STATUS", "MACCHINA", 0.0),
        sig("CRUISE_BUTTONS", "MACCHINA", 0.0),
        sig("CRUISE_SETTING", "MACCHINA", 0.0),
        sig("CRUISE_SPEED_OFFSET", "MACCHINA", 0.0),
        sig("CRUISE_SPEED_PCM", "MACCHINA", 0.0),
        sig("LEFT_BLINKER", "SCM_FEEDBACK", 0.0),
        sig("RIGHT_BLINKER", "SCM_FEEDBACK", 0.0),
    ];

    let mut rates = vec![
        rate("POWERTRAIN_DATA", 100.0),
        rate("FRONT_SPEEDS", 50.0),
        rate("REAR_SPEEDS", 50.0),
        rate("BRAKE", 100.0),
        rate("STEERING_SENSORS", 100.0),
        rate("SPEEDS", 50.0),
        rate("MACCHINA", 100.0),
        // The camera bus only carries the steering control message; nothing
        // is decoded from it, but its rate feeds the staleness flag
        MessageRate {
            message: "STEERING_CONTROL",
            bus: Bus::Camera,
            hz: 100.0,
        },
    ];

    // Switch-module rates differ for the China-market Odyssey
    if variant == V::OdysseyChn {
        rates.push(rate("SCM_FEEDBACK", 25.0));
        rates.push(rate("SCM_BUTTONS", 50.0));
    } else {
        rates.push(rate("SCM_FEEDBACK", 10.0));
        rates.push(rate("SCM_BUTTONS", 25.0));
    }

    // The gearbox message runs at half rate on the CR-V hybrid
    if variant == V::CrvHybrid {
        rates.push(rate("GEARBOX", 50.0));
    } else {
        rates.push(rate("GEARBOX", 100.0));
    }

    if radar_off_bus {
        // Hybrids and the Bosch Civic share the common brake message; the
        // rest of the radar-off-bus models report it on a separate module
        if !matches!(variant, V::AccordHybrid | V::CivicBosch | V::CrvHybrid) {
            signals.push(sig("BRAKE_PRESSED", "BRAKE_MODULE", 0.0));
            rates.push(rate("BRAKE_MODULE", 50.0));
        }
        signals.push(sig("CAR_GAS", "GAS_PEDAL_2", 0.0));
        signals.push(sig("MAIN_ON", "SCM_FEEDBACK", 0.0));
        signals.push(sig("EPB_STATE", "EPB_STATUS", 0.0));
        signals.push(sig("CRUISE_SPEED", "ACC_HUD", 0.0));
        rates.push(rate("GAS_PEDAL_2", 100.0));
    } else {
        signals.push(sig("BRAKE_ERROR_1", "STANDSTILL", 1.0));
        signals.push(sig("BRAKE_ERROR_2", "STANDSTILL", 1.0));
        signals.push(sig("CRUISE_SPEED_PCM", "CRUISE", 0.0));
        signals.push(sig("CRUISE_SPEED_OFFSET", "CRUISE_PARAMS", 0.0));
        rates.push(rate("STANDSTILL", 50.0));
        if variant == V::OdysseyChn {
            rates.push(rate("CRUISE_PARAMS", 10.0));
        } else {
            rates.push(rate("CRUISE_PARAMS", 50.0));
        }
    }

    // Door state selection
    match variant {
        V::Accord | V::Accord15 | V::AccordHybrid | V::CivicBosch | V::CrvHybrid => {
            signals.push(sig("DRIVERS_DOOR_OPEN", "SCM_FEEDBACK", 1.0));
        }
        V::OdysseyChn => {
            signals.push(sig("DRIVERS_DOOR_OPEN", "SCM_BUTTONS", 1.0));
        }
        _ => {
            signals.push(sig("DOOR_OPEN_FL", "DOORS_STATUS", 1.0));
            signals.push(sig("DOOR_OPEN_FR", "DOORS_STATUS", 1.0));
            signals.push(sig("DOOR_OPEN_RL", "DOORS_STATUS", 1.0));
            signals.push(sig("DOOR_OPEN_RR", "DOORS_STATUS", 1.0));
            signals.push(sig("WHEELS_MOVING", "STANDSTILL", 1.0));
            rates.push(rate("DOORS_STATUS", 3.0));
            rates.push(rate("STANDSTILL", 50.0));
        }
    }

    // Per-variant extras: main switch, parking brake, secondary gas pedal
    match variant {
        V::Civic => {
            signals.push(sig("CAR_GAS", "GAS_PEDAL_2", 0.0));
            signals.push(sig("MAIN_ON", "SCM_FEEDBACK", 0.0));
            signals.push(sig("IMPERIAL_UNIT", "HUD_SETTING", 0.0));
            signals.push(sig("EPB_STATE", "EPB_STATUS", 0.0));
        }
        V::AcuraIlx => {
            signals.push(sig("CAR_GAS", "GAS_PEDAL_2", 0.0));
            signals.push(sig("MAIN_ON", "SCM_BUTTONS", 0.0));
        }
        V::Crv | V::AcuraRdx | V::Pilot2019 | V::Ridgeline => {
            signals.push(sig("MAIN_ON", "SCM_BUTTONS", 0.0));
        }
        V::Odyssey => {
            signals.push(sig("MAIN_ON", "SCM_FEEDBACK", 0.0));
            signals.push(sig("EPB_STATE", "EPB_STATUS", 0.0));
            rates.push(rate("EPB_STATUS", 50.0));
        }
        V::Pilot => {
            signals.push(sig("MAIN_ON", "SCM_BUTTONS", 0.0));
            signals.push(sig("CAR_GAS", "GAS_PEDAL_2", 0.0));
        }
        V::OdysseyChn => {
            signals.push(sig("MAIN_ON", "SCM_BUTTONS", 0.0));
            signals.push(sig("EPB_STATE", "EPB_STATUS", 0.0));
            rates.push(rate("EPB_STATUS", 50.0));
        }
        _ => {}
    }

    // Gas interceptor reading, when installed
    if gas_interceptor {
        signals.push(sig("INTERCEPTOR_GAS", "GAS_SENSOR", 0.0));
        rates.push(rate("GAS_SENSOR", 100.0));
    }

    (signals, rates)
}
