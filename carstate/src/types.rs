//! Core types for the vehicle state decoder
//!
//! This module defines the fundamental types the decoder consumes and emits
//! every control cycle. The decoder does not parse raw CAN bytes - its input
//! is the already-decoded signal values produced by the CAN parsing layer,
//! one coalesced frame per monitored bus per cycle.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Result type for decoder construction
pub type Result<T> = std::result::Result<T, CarStateError>;

/// Errors that can occur when building a decoder session
///
/// All of these are configuration problems and are fatal at construction.
/// The per-cycle `update` itself never fails - degraded inputs resolve to
/// schema defaults and are visible through the bus-validity flags.
#[derive(Debug, thiserror::Error)]
pub enum CarStateError {
    #[error("Unknown vehicle fingerprint: {0}")]
    UnknownVariant(String),

    #[error("Invalid signal schema: {0}")]
    InvalidSchema(String),
}

/// Identifier for a monitored CAN bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Bus {
    /// Primary powertrain bus
    Powertrain,
    /// Camera / secondary bus
    Camera,
}

impl fmt::Display for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bus::Powertrain => write!(f, "powertrain"),
            Bus::Camera => write!(f, "camera"),
        }
    }
}

/// Decoded signal values from one bus for one control cycle
///
/// This is the external input shape: the CAN parsing layer coalesces the
/// most recent value of every requested signal into a message-keyed map and
/// stamps the frame with its health flags before `update` is called.
#[derive(Debug, Clone, Default)]
pub struct DecodedSignalFrame {
    /// Message name -> {signal name -> physical value}
    pub vl: HashMap<String, HashMap<String, f64>>,
    /// True if the bus checksum/counter validation passed this cycle
    pub can_valid: bool,
    /// True if all required messages arrived at their expected rates
    pub rates_ok: bool,
}

impl DecodedSignalFrame {
    /// Create an empty frame with healthy bus flags
    pub fn new() -> Self {
        Self {
            vl: HashMap::new(),
            can_valid: true,
            rates_ok: true,
        }
    }

    /// Look up a signal value, `None` if the message or signal is absent
    pub fn signal(&self, message: &str, signal: &str) -> Option<f64> {
        self.vl.get(message).and_then(|m| m.get(signal)).copied()
    }

    /// Insert a signal value (builder-style, mainly for tests and replay)
    pub fn with_signal(mut self, message: &str, signal: &str, value: f64) -> Self {
        self.set_signal(message, signal, value);
        self
    }

    /// Insert a signal value in place
    pub fn set_signal(&mut self, message: &str, signal: &str, value: f64) {
        self.vl
            .entry(message.to_string())
            .or_default()
            .insert(signal.to_string(), value);
    }
}

/// Symbolic gear selector position
///
/// Closed set: an unmapped shifter code resolves to `Unknown`, never an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GearShifter {
    Park,
    Reverse,
    Neutral,
    Drive,
    Sport,
    Low,
    #[default]
    Unknown,
}

impl fmt::Display for GearShifter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GearShifter::Park => "park",
            GearShifter::Reverse => "reverse",
            GearShifter::Neutral => "neutral",
            GearShifter::Drive => "drive",
            GearShifter::Sport => "sport",
            GearShifter::Low => "low",
            GearShifter::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Per-cycle vehicle state - the primary output of the decoder
///
/// Created zeroed at session start and rebuilt exactly once per control
/// cycle. The `prev_*` shadows always hold the value accepted on the
/// previous cycle, snapshotted before any of this cycle's decoding runs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VehicleState {
    // Bus health, copied straight from the input frames
    pub can_valid: bool,
    pub cam_can_valid: bool,
    pub can_rates_ok: bool,
    pub cam_rates_ok: bool,

    /// Filtered longitudinal speed (m/s)
    pub v_ego: f64,
    /// Filtered longitudinal acceleration (m/s^2)
    pub a_ego: f64,
    /// Blended measured speed before filtering (m/s)
    pub v_ego_raw: f64,
    /// True when the transmission speed reads essentially zero
    pub standstill: bool,

    // Individual wheel speeds (m/s, speed-factor corrected) and their average
    pub v_wheel_fl: f64,
    pub v_wheel_fr: f64,
    pub v_wheel_rl: f64,
    pub v_wheel_rr: f64,
    pub v_wheel: f64,

    /// Steering wheel angle (deg)
    pub angle_steers: f64,
    /// Steering wheel angle rate (deg/s)
    pub angle_steers_rate: f64,
    /// Driver-applied steering torque (vehicle units)
    pub steer_torque_driver: f64,
    /// True when driver torque exceeds the variant override threshold
    pub steer_override: bool,
    pub steer_error: bool,
    pub steer_warning: bool,
    pub steer_not_allowed: bool,

    pub brake_error: bool,
    pub esp_disabled: bool,

    /// Accelerator pedal position from the powertrain message
    pub pedal_gas: f64,
    /// Gas value used by the controller (interceptor-corrected where fitted)
    pub car_gas: f64,
    /// Raw gas-interceptor reading (zero when no interceptor is installed)
    pub user_gas: f64,
    pub user_gas_pressed: bool,

    /// Derived driver brake effort (decode pending, held at zero)
    pub user_brake: f64,
    /// Debounced brake-pressed flag
    pub brake_pressed: bool,
    /// Raw brake switch reading for this cycle
    pub brake_switch: bool,

    /// Raw gear value from the gearbox message
    pub gear: i64,
    /// Symbolic gear mapped through the variant shifter table
    pub gear_shifter: GearShifter,

    pub blinker_on: bool,
    pub left_blinker_on: bool,
    pub right_blinker_on: bool,
    pub prev_blinker_on: bool,
    pub prev_left_blinker_on: bool,
    pub prev_right_blinker_on: bool,

    pub cruise_buttons: i64,
    pub cruise_setting: i64,
    pub prev_cruise_buttons: i64,
    pub prev_cruise_setting: i64,

    /// Cruise set speed reported by the PCM, glitch-filtered
    pub v_cruise_pcm: f64,
    /// Previous cycle's accepted cruise set speed
    pub prev_v_cruise_pcm: f64,
    /// Cruise speed offset heuristic, always <= 0
    pub cruise_speed_offset: f64,
    /// Cruise main switch state
    pub main_on: bool,
    /// Raw ACC status code from the PCM
    pub pcm_acc_status: i64,

    pub park_brake: bool,
    pub door_all_closed: bool,
    pub seatbelt: bool,
    pub is_metric: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_signal_lookup() {
        let frame = DecodedSignalFrame::new()
            .with_signal("SPEEDS", "SPEED1", 36.0)
            .with_signal("BRAKE", "BRAKE_PRESSED", 1.0);

        assert_eq!(frame.signal("SPEEDS", "SPEED1"), Some(36.0));
        assert_eq!(frame.signal("BRAKE", "BRAKE_PRESSED"), Some(1.0));
        assert_eq!(frame.signal("SPEEDS", "SPEED2"), None);
        assert_eq!(frame.signal("CRUISE", "SPEED1"), None);
    }

    #[test]
    fn test_gear_shifter_display() {
        assert_eq!(format!("{}", GearShifter::Park), "park");
        assert_eq!(format!("{}", GearShifter::Unknown), "unknown");
        assert_eq!(GearShifter::default(), GearShifter::Unknown);
    }

    #[test]
    fn test_error_display() {
        let err = CarStateError::UnknownVariant("HONDA UNKNOWN 2099".to_string());
        assert!(format!("{}", err).contains("HONDA UNKNOWN 2099"));
    }
}
