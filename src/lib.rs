//! FDAI attitude - attitude tracking engine for a flight-director attitude indicator
//!
//! Turns a stream of device attitude quaternions, optionally combined with
//! discrete reaction-control-system (RCS) impulses, into a vehicle orientation
//! and cumulative roll/pitch/yaw angles with rates for an attitude-indicator
//! ball.
//!
//! # Features
//!
//! - Device attitude relative to a resettable reference frame
//! - Fixed-timestep integration, independent of the host frame rate
//! - Cumulative display angles wrapped to [0, 360) with per-axis rates
//! - RCS impulse composer with signed per-axis counters
//! - Cross-context commands and snapshot watchers via `tokio::sync` channels
//! - TOML-configurable settings
//!
//! # Quick Start
//!
//! ```rust
//! use fdai_attitude::{FlightDirector, QuaternionExt, TrackerSettings};
//! use nalgebra::{Quaternion, UnitQuaternion};
//!
//! let (mut director, sensor) =
//!     FlightDirector::with_sensor_feed(TrackerSettings::default()).unwrap();
//! let handle = director.handle();
//!
//! // The host's scene node; anything implementing `VehicleNode` works
//! let mut node = UnitQuaternion::identity();
//!
//! // Sensor callback context
//! sensor.on_sample(Quaternion::identity(), 0.0);
//!
//! // Double-tap: the current attitude becomes the zero orientation
//! handle.recenter();
//!
//! // Host per-frame callback at 60 Hz
//! for frame in 0..60 {
//!     let time = frame as f64 / 60.0;
//!     let turned = UnitQuaternion::from_node_euler_degrees(0.0, 0.0, time as f32 * 10.0);
//!     sensor.on_sample(*turned.quaternion(), time);
//!     director.on_update(time, &mut node).unwrap();
//! }
//!
//! let snapshot = director.state().snapshot();
//! assert!(snapshot.first_step_completed);
//! println!("roll {:.1} deg at {:.1} deg/s", snapshot.angles.roll, snapshot.rates.roll);
//! ```

mod axes;
mod config;
pub mod engine;
mod error;
pub mod impulse;
pub mod integrator;
pub mod math;
pub mod sampler;
pub mod state;
mod types;

// Re-export all public types and functions
pub use axes::{AxesAlignment, axes_swap, remap_quaternion};
pub use engine::{EngineCommand, EngineHandle, FlightDirector};
pub use error::{AttitudeError, ConfigError};
pub use impulse::{Burst, ImpulseComposer, Thruster};
pub use integrator::{Clock, OrientationIntegrator, VehicleNode};
pub use math::{DEG_TO_RAD, QuaternionExt, RAD_TO_DEG, Vector3Ext};
pub use sampler::{
    AttitudeSampler, AttitudeSource, PollingSource, SamplePublisher, SensorFeed, sensor_channel,
};
pub use state::AttitudeState;
pub use types::*;
