//! Vehicle State Decoder Library
//!
//! Turns a stream of already-decoded CAN signal values into a single,
//! consistent, per-cycle description of the vehicle's dynamic state (speed,
//! acceleration, steering, pedals, gear, cruise status, blinkers) for a
//! downstream driving-assistance control loop, across multiple vehicle
//! hardware variants whose CAN layouts differ.
//!
//! # Architecture
//!
//! The library is intentionally minimal and focused on state estimation:
//! - A per-variant signal schema describing what the CAN parsing layer must
//!   be asked for, with expected message rates for staleness detection
//! - A per-cycle update turning decoded signal frames into a typed
//!   `VehicleState`
//! - A fixed-gain velocity/acceleration filter blending two speed sources
//! - Small pure heuristics: gear mapping, cruise offset, override and
//!   debounce checks
//!
//! The library does NOT:
//! - Parse raw CAN bytes (input is the parsing layer's decoded values)
//! - Decide control outputs (acceleration/steering commands)
//! - Persist state across process restarts
//!
//! # Example Usage
//!
//! ```
//! use carstate::{CarStateDecoder, DecodedSignalFrame, SessionConfig};
//!
//! let config = SessionConfig::new("HONDA CR-V 2016 TOURING");
//! let mut decoder = CarStateDecoder::new(config).unwrap();
//!
//! // The schema tells the CAN parsing layer what to request
//! for req in decoder.schema().requirements() {
//!     println!("{}.{} on {} bus", req.message, req.signal, req.bus);
//! }
//!
//! // One update per control cycle
//! let pt = DecodedSignalFrame::new()
//!     .with_signal("SPEEDS", "SPEED1", 36.0)
//!     .with_signal("FRONT_SPEEDS", "WHEEL_SPEED_FL", 36.0);
//! let cam = DecodedSignalFrame::new();
//! let initial = decoder.initial_state();
//! let state = decoder.update(&initial, &pt, &cam);
//! println!("v_ego = {:.2} m/s", state.v_ego);
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod estimator;
pub mod heuristics;
pub mod schema;
pub mod types;
pub mod variant;

// Re-export main types for convenience
pub use config::SessionConfig;
pub use decoder::CarStateDecoder;
pub use estimator::VelocityEstimator;
pub use schema::{MessageRate, SignalRequirement, SignalSchema};
pub use types::{Bus, CarStateError, DecodedSignalFrame, GearShifter, Result, VehicleState};
pub use variant::VehicleVariant;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
