//! Per-cycle vehicle state decoding
//!
//! `CarStateDecoder` is the entry point of the crate: constructed once per
//! drive session from a `SessionConfig` (fatal on configuration problems),
//! then driven exactly once per control cycle with the decoded signal
//! frames of both monitored buses. The update is an explicit
//! `(previous state, frames) -> new state` transformation; the only state
//! the decoder itself carries across cycles is the velocity filter.
//!
//! The update never fails for well-formed frames: absent signals resolve to
//! their schema defaults and degraded buses are only visible through the
//! validity flags copied into the output state.

use crate::config::SessionConfig;
use crate::estimator::{blend_speed, VelocityEstimator, KPH_TO_MS};
use crate::heuristics::{
    calc_cruise_offset, debounce_brake_switch, filter_cruise_set_speed, parse_gear_shifter,
    steer_override,
};
use crate::schema::SignalSchema;
use crate::types::{DecodedSignalFrame, Result, VehicleState};
use crate::variant::VehicleVariant;

/// Steering status codes that do not indicate a steering fault
/// (2 and 6 are temporary conditions, 3 is the low-speed lockout, 4 is
/// significant driver torque)
const STEER_STATUS_NO_FAULT: [i64; 5] = [0, 2, 3, 4, 6];

/// Steering status codes that do not warrant a warning
/// (3 is the low-speed lockout, not worth surfacing)
const STEER_STATUS_NO_WARNING: [i64; 2] = [0, 3];

/// Transmission speed (raw signal units) below which the car is standing
const STANDSTILL_SPEED: f64 = 0.1;

/// Driver brake effort above which the brake must be reported pressed on
/// models with pedal-grinding noise at low speed
const USER_BRAKE_FORCE_BOUND: f64 = 0.05;

/// The per-session vehicle state decoder
pub struct CarStateDecoder {
    config: SessionConfig,
    variant: VehicleVariant,
    schema: SignalSchema,
    v_ego_kf: VelocityEstimator,
}

impl CarStateDecoder {
    /// Build a decoder session
    ///
    /// Resolves the variant and its signal schema. Any configuration
    /// problem (unknown fingerprint, conflicting schema entries) is fatal
    /// here; nothing after construction can fail.
    pub fn new(config: SessionConfig) -> Result<Self> {
        let variant = config.variant()?;
        let schema = SignalSchema::for_config(&config)?;
        log::info!(
            "Car state session: {} (radar_off_bus={}, gas_interceptor={}), {} signals, {} rate checks",
            variant,
            config.radar_off_bus,
            config.gas_interceptor,
            schema.requirements().len(),
            schema.rates().len()
        );
        Ok(Self {
            config,
            variant,
            schema,
            v_ego_kf: VelocityEstimator::new(),
        })
    }

    /// The active variant
    pub fn variant(&self) -> VehicleVariant {
        self.variant
    }

    /// The resolved signal schema, for handing to the CAN parsing layer
    pub fn schema(&self) -> &SignalSchema {
        &self.schema
    }

    /// Zeroed state for the start of a session
    pub fn initial_state(&self) -> VehicleState {
        VehicleState::default()
    }

    /// Run one control cycle
    ///
    /// Must be called exactly once per cycle. `prev` is the state returned
    /// by the previous cycle (or `initial_state` on the first); the shadow
    /// fields of the new state are snapshotted from it before anything else
    /// is decoded.
    pub fn update(
        &mut self,
        prev: &VehicleState,
        cp: &DecodedSignalFrame,
        cp_cam: &DecodedSignalFrame,
    ) -> VehicleState {
        let schema = &self.schema;
        let get = |signal: &str| schema.value(cp, cp_cam, signal);
        let mut cs = VehicleState::default();

        // Shadows first, before any of this cycle's values land
        cs.prev_cruise_buttons = prev.cruise_buttons;
        cs.prev_cruise_setting = prev.cruise_setting;
        cs.prev_blinker_on = prev.blinker_on;
        cs.prev_left_blinker_on = prev.left_blinker_on;
        cs.prev_right_blinker_on = prev.right_blinker_on;
        cs.prev_v_cruise_pcm = prev.v_cruise_pcm;

        // Bus health straight from the frames
        cs.can_valid = cp.can_valid;
        cs.cam_can_valid = cp_cam.can_valid;
        cs.can_rates_ok = cp.rates_ok;
        cs.cam_rates_ok = cp_cam.rates_ok;

        // Steering status classification against the known-good code sets
        let steer_status = get("STEER_STATUS") as i64;
        cs.steer_error = !STEER_STATUS_NO_FAULT.contains(&steer_status);
        cs.steer_not_allowed = steer_status != 0;
        cs.steer_warning = !STEER_STATUS_NO_WARNING.contains(&steer_status);
        // Brake error signals only exist on the radar-on-bus layout
        cs.brake_error = !self.config.radar_off_bus
            && (get("BRAKE_ERROR_1") != 0.0 || get("BRAKE_ERROR_2") != 0.0);
        cs.esp_disabled = false;

        // Wheel speeds, transmission speed, and the blended estimate
        let speed_factor = self.variant.speed_factor();
        cs.v_wheel_fl = get("WHEEL_SPEED_FL") * KPH_TO_MS * speed_factor;
        cs.v_wheel_fr = get("WHEEL_SPEED_FR") * KPH_TO_MS * speed_factor;
        cs.v_wheel_rl = get("WHEEL_SPEED_RL") * KPH_TO_MS * speed_factor;
        cs.v_wheel_rr = get("WHEEL_SPEED_RR") * KPH_TO_MS * speed_factor;
        cs.v_wheel = (cs.v_wheel_fl + cs.v_wheel_fr + cs.v_wheel_rl + cs.v_wheel_rr) / 4.0;

        let speed_raw = get("SPEED1");
        cs.standstill = speed_raw < STANDSTILL_SPEED;
        let transmission_speed = speed_raw * KPH_TO_MS * speed_factor;
        let speed = blend_speed(transmission_speed, cs.v_wheel);
        cs.v_ego_raw = speed;
        let (v_ego, a_ego) = self.v_ego_kf.update(speed);
        cs.v_ego = v_ego;
        cs.a_ego = a_ego;

        // Doors and seatbelt through the schema-selected message set
        cs.door_all_closed = if self.schema.contains("DRIVERS_DOOR_OPEN") {
            get("DRIVERS_DOOR_OPEN") == 0.0
        } else {
            get("DOOR_OPEN_FL") == 0.0
                && get("DOOR_OPEN_FR") == 0.0
                && get("DOOR_OPEN_RL") == 0.0
                && get("DOOR_OPEN_RR") == 0.0
        };
        // TODO: request and decode the driver seatbelt latch signal; no
        // seatbelt message is in the schema yet
        cs.seatbelt = true;

        // Gas interceptor, when installed. The raw reading goes negative at
        // a released pedal once calibrated, so strictly positive == pressed
        if self.config.gas_interceptor {
            cs.user_gas = get("INTERCEPTOR_GAS");
            cs.user_gas_pressed = cs.user_gas > 0.0;
        }

        // Gear: this bus carries no usable gear value on the Civic
        cs.gear = if self.variant == VehicleVariant::Civic {
            0
        } else {
            get("GEAR") as i64
        };
        cs.gear_shifter = parse_gear_shifter(get("GEAR_SHIFTER") as i64, self.variant.shifter_values());

        cs.angle_steers = get("STEER_ANGLE");
        cs.angle_steers_rate = get("STEER_ANGLE_RATE");

        cs.cruise_setting = get("CRUISE_SETTING") as i64;
        cs.cruise_buttons = get("CRUISE_BUTTONS") as i64;

        cs.left_blinker_on = get("LEFT_BLINKER") != 0.0;
        cs.right_blinker_on = get("RIGHT_BLINKER") != 0.0;
        cs.blinker_on = cs.left_blinker_on || cs.right_blinker_on;

        // Main switch and parking brake via the schema-selected messages;
        // variants without a parking-brake signal just report false
        cs.main_on = get("MAIN_ON") != 0.0;
        cs.park_brake = self.schema.contains("EPB_STATE") && get("EPB_STATE") != 0.0;

        cs.pedal_gas = get("PEDAL_GAS");
        cs.car_gas = if self.schema.contains("CAR_GAS") {
            get("CAR_GAS")
        } else {
            cs.pedal_gas
        };

        cs.steer_torque_driver = get("STEER_TORQUE_DRIVER");
        cs.steer_override = steer_override(cs.steer_torque_driver, self.variant.steer_threshold());

        // Brake and cruise set speed, split on the radar topology
        cs.brake_switch = get("BRAKE_SWITCH") != 0.0;
        if self.config.radar_off_bus {
            cs.cruise_speed_offset = calc_cruise_offset(get("CRUISE_SPEED_OFFSET"), cs.v_ego);
            cs.brake_pressed = get("BRAKE_PRESSED") != 0.0;
            cs.v_cruise_pcm = filter_cruise_set_speed(get("CRUISE_SPEED_PCM"), prev.v_cruise_pcm);
        } else {
            cs.cruise_speed_offset = 0.0;
            cs.v_cruise_pcm = get("CRUISE_SPEED_PCM");
            cs.brake_pressed =
                get("BRAKE_PRESSED") != 0.0 || debounce_brake_switch(cs.brake_switch, prev.brake_switch);
        }

        // TODO: decode driver brake effort from the brake pressure message;
        // until then the pedal-grinding guard below can never trip
        cs.user_brake = 0.0;
        cs.pcm_acc_status = get("ACC_STATUS") as i64;

        // Pedal grinding noise makes the switch unreliable at low speed on
        // these models; force pressed on real pedal force
        if matches!(
            self.variant,
            VehicleVariant::Pilot | VehicleVariant::Pilot2019 | VehicleVariant::Ridgeline
        ) && cs.user_brake > USER_BRAKE_FORCE_BOUND
        {
            cs.brake_pressed = true;
        }

        // TODO: locate the imperial-unit bit for models other than the
        // Civic's HUD_SETTING
        cs.is_metric = if self.schema.contains("IMPERIAL_UNIT") {
            get("IMPERIAL_UNIT") == 0.0
        } else {
            true
        };

        cs
    }
}
