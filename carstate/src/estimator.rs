//! Fixed-gain velocity estimator
//!
//! A two-state (speed, acceleration) linear filter with a precomputed gain
//! vector. The gain is fitted offline for the 100 Hz cycle and is never
//! re-estimated online, so the filter is a handful of multiply-adds per
//! cycle with no matrix algebra.
//!
//! The measurement it consumes is itself a blend of two speed sources: the
//! transmission speed signal (smoother, but snaps to zero early at crawling
//! speeds) and the four-wheel average (noisier, but honest near zero). The
//! blend weight ramps linearly from pure transmission speed at 1 m/s of
//! wheel speed to pure wheel speed at 6 m/s.

/// km/h to m/s conversion factor
pub const KPH_TO_MS: f64 = 1.0 / 3.6;

/// Control cycle period (s)
const DT: f64 = 0.01;

/// Precomputed correction gain for (speed, accel)
const GAIN: [f64; 2] = [0.12287673, 0.29666309];

/// Measurement divergence (m/s) beyond which the state is reset outright
/// instead of converging over many cycles
const RESET_BOUND: f64 = 2.0;

/// Blend-weight breakpoints over wheel-speed magnitude (m/s)
const V_WEIGHT_BP: [f64; 2] = [1.0, 6.0];
/// Blend-weight values at the breakpoints (0 = transmission, 1 = wheels)
const V_WEIGHT_V: [f64; 2] = [0.0, 1.0];

/// Piecewise-linear interpolation with clamped ends
///
/// `xp` must be sorted ascending. Outside the table the nearest endpoint
/// value is returned.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    debug_assert_eq!(xp.len(), fp.len());
    debug_assert!(!xp.is_empty());
    let n = xp.len();
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }
    for i in 0..n - 1 {
        if x < xp[i + 1] {
            let t = (x - xp[i]) / (xp[i + 1] - xp[i]);
            return fp[i] + t * (fp[i + 1] - fp[i]);
        }
    }
    fp[n - 1]
}

/// Blend the transmission speed with the wheel-speed average
///
/// Both inputs must already be unit-converted and speed-factor corrected.
pub fn blend_speed(transmission_speed: f64, wheel_speed_avg: f64) -> f64 {
    let weight = interp(wheel_speed_avg, &V_WEIGHT_BP, &V_WEIGHT_V);
    (1.0 - weight) * transmission_speed + weight * wheel_speed_avg
}

/// Two-state fixed-gain speed/acceleration filter
///
/// Owns its (speed, accel) state exclusively; one `update` per cycle.
#[derive(Debug, Clone, Default)]
pub struct VelocityEstimator {
    speed: f64,
    accel: f64,
}

impl VelocityEstimator {
    /// Create an estimator at rest
    pub fn new() -> Self {
        Self::default()
    }

    /// Current filtered speed estimate (m/s)
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Current filtered acceleration estimate (m/s^2)
    pub fn accel(&self) -> f64 {
        self.accel
    }

    /// Run one predict/correct step against a measured speed
    ///
    /// If the measurement has diverged from the estimate by more than the
    /// reset bound, the state is re-initialized to the measurement first.
    /// This keeps the estimate from lagging for many cycles when the
    /// session starts with the vehicle already in motion. Returns the new
    /// (speed, accel) estimate. Never fails; zero inputs yield zero state.
    pub fn update(&mut self, measured_speed: f64) -> (f64, f64) {
        if (measured_speed - self.speed).abs() > RESET_BOUND {
            self.speed = measured_speed;
            self.accel = 0.0;
        }

        // Predict: constant-acceleration propagation over one cycle
        let predicted_speed = self.speed + DT * self.accel;
        let predicted_accel = self.accel;

        // Correct: apply the fixed gain to the speed innovation
        let innovation = measured_speed - predicted_speed;
        self.speed = predicted_speed + GAIN[0] * innovation;
        self.accel = predicted_accel + GAIN[1] * innovation;

        (self.speed, self.accel)
    }
}
