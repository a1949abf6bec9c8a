//! Small pure decoding heuristics
//!
//! Numeric and table lookups shared by the per-cycle decode: gear-shifter
//! mapping, the cruise speed-offset formula, the steering-override check,
//! the cruise set-speed de-glitch, and the brake-switch debounce. None of
//! these touch I/O or fail; unmappable inputs resolve to explicit fallback
//! values.

use crate::types::GearShifter;

// Cruise offset formula constants, fitted so that the controlled speed sits
// ~0.3 m/s below the PCM speed:
//   speed = 0 m/s               -> -0.3
//   speed = 34 m/s, offset 2.0  -> -0.25
//   speed = 34 m/s, offset -2.5 -> -1.8
const OFFSET_K0: f64 = -0.3;
const OFFSET_K1: f64 = -0.01879;
const OFFSET_K2: f64 = 0.01013;

/// Cruise set speeds above this are transition glitches, not real values
const V_CRUISE_PCM_GLITCH_BOUND: f64 = 160.0;

/// Map a raw shifter code through a variant code table
///
/// Returns `Unknown` for any code not in the table - never an error.
pub fn parse_gear_shifter(code: i64, table: &[(i64, GearShifter)]) -> GearShifter {
    match table.iter().find(|(c, _)| *c == code) {
        Some((_, gear)) => *gear,
        None => {
            log::warn!("Unmapped gear shifter code {}", code);
            GearShifter::Unknown
        }
    }
}

/// Cruise speed-offset heuristic
///
/// `raw_offset` is the PCM-reported cruise speed offset, `speed` the current
/// filtered speed (m/s). The result is clamped non-positive.
pub fn calc_cruise_offset(raw_offset: f64, speed: f64) -> f64 {
    (OFFSET_K0 + OFFSET_K1 * speed + OFFSET_K2 * speed * raw_offset).min(0.0)
}

/// True when the driver torque magnitude exceeds the variant threshold
pub fn steer_override(torque_driver: f64, threshold: f64) -> bool {
    torque_driver.abs() > threshold
}

/// De-glitch the cruise set speed
///
/// On set, the PCM speed pulses into an invalid high range for a cycle or
/// two; while the raw value is above the bound the previous accepted value
/// is reused.
pub fn filter_cruise_set_speed(raw: f64, prev_accepted: f64) -> f64 {
    if raw > V_CRUISE_PCM_GLITCH_BOUND {
        prev_accepted
    } else {
        raw
    }
}

/// Debounce the brake switch reading
///
/// The switch has shown single-cycle noise, so it is only trusted as
/// pressed after being active for two consecutive cycles.
pub fn debounce_brake_switch(current: bool, previous: bool) -> bool {
    current && previous
}
