//! Core types and settings for the attitude engine

use core::ops::Div;

use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};

use crate::axes::AxesAlignment;

/// Which orientation the integrator applies to the node each step.
///
/// # Example
/// ```
/// use fdai_attitude::{OrientationSource, TrackerSettings};
///
/// let settings = TrackerSettings {
///     source: OrientationSource::Impulse,
///     ..Default::default()
/// };
/// assert_eq!(settings.source, OrientationSource::Impulse);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationSource {
    /// Device attitude relative to the reference frame
    #[default]
    Sensor,
    /// The impulse composer's running delta quaternion
    Impulse,
    /// Device attitude with the impulse delta applied on top
    Combined,
}

/// What a recenter gesture resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Only capture a new reference frame; cumulative angles keep counting.
    ReferenceFrameOnly,
    /// Capture a new reference frame and zero the cumulative Euler angles.
    #[default]
    ReferenceFrameAndAngles,
}

/// Attitude tracker settings
///
/// Controls the fixed simulation step, stall clamping, impulse magnitude,
/// UI publication rate and how device attitude maps onto the node.
///
/// # Example
/// ```
/// use fdai_attitude::{ResetPolicy, TrackerSettings};
///
/// let settings = TrackerSettings {
///     fixed_step: 1.0 / 60.0,
///     reset_policy: ResetPolicy::ReferenceFrameOnly,
///     ..Default::default()
/// };
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Simulation step in seconds (typically 0.03)
    ///
    /// Angle deltas are always computed over exactly this step, so rates do
    /// not depend on the host's frame rate.
    pub fixed_step: f64,
    /// Longest frame time credited to the accumulator, in seconds
    ///
    /// Stalls longer than this (debugger pauses, app suspension) are clamped
    /// and the excess real time is dropped.
    pub max_frame_time: f64,
    /// Rotation of a single RCS impulse in degrees
    ///
    /// The default yields a 0.25°/s attitude change when one impulse is fired
    /// per 60 Hz frame. A double impulse rotates twice as far.
    pub impulse_angle: f32,
    /// Minimum callback time between snapshots sent to UI watchers, in seconds
    pub publish_interval: f64,
    /// Orientation applied to the node each step
    pub source: OrientationSource,
    /// Behavior of the recenter gesture
    pub reset_policy: ResetPolicy,
    /// Device axes to node axes mapping for sensor attitude
    pub node_axes: AxesAlignment,
    /// Whether the host should show its rendering diagnostics overlay
    pub show_diagnostics: bool,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            fixed_step: 0.03,
            max_frame_time: 0.25,
            impulse_angle: 0.25 / 60.0,
            publish_interval: 0.2,
            source: OrientationSource::default(),
            reset_policy: ResetPolicy::default(),
            node_axes: AxesAlignment::NxNyPz,
            show_diagnostics: false,
        }
    }
}

/// One device attitude reading.
///
/// A plain value: the sampler replaces it whole, never field by field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttitudeSample {
    /// Device attitude as a unit quaternion
    pub quaternion: UnitQuaternion<f32>,
    /// Sensor timestamp in seconds
    pub timestamp: f64,
}

impl AttitudeSample {
    pub fn new(quaternion: UnitQuaternion<f32>, timestamp: f64) -> Self {
        Self {
            quaternion,
            timestamp,
        }
    }
}

/// Roll, pitch and yaw triple.
///
/// Used for cumulative display angles (degrees), per-step deltas (degrees)
/// and rates (degrees per second).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RollPitchYaw {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl RollPitchYaw {
    pub const ZERO: Self = Self {
        roll: 0.0,
        pitch: 0.0,
        yaw: 0.0,
    };

    pub fn new(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self { roll, pitch, yaw }
    }
}

impl Div<f32> for RollPitchYaw {
    type Output = Self;

    fn div(self, rhs: f32) -> Self {
        Self::new(self.roll / rhs, self.pitch / rhs, self.yaw / rhs)
    }
}

/// Cumulative display angles in degrees, each wrapped to [0, 360).
pub type CumulativeAngles = RollPitchYaw;

/// Angular rates in degrees per second.
pub type Rates = RollPitchYaw;

/// Signed impulse counts per axis.
///
/// Starboard roll and pitch up count positive. Yaw is inverted: starboard
/// yaw counts negative and port yaw positive. Counts wrap at the `i32` limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImpulseCounters {
    pub roll: i32,
    pub pitch: i32,
    pub yaw: i32,
}

/// Attitude state published to the UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttitudeSnapshot {
    /// Orientation most recently applied to the node
    pub orientation: UnitQuaternion<f32>,
    /// Cumulative roll/pitch/yaw in degrees
    pub angles: CumulativeAngles,
    /// Last step's roll/pitch/yaw change in degrees
    pub deltas: RollPitchYaw,
    /// Last step's rates in degrees per second
    pub rates: Rates,
    /// Impulse counters at the last step
    pub impulse_counters: ImpulseCounters,
    /// Set once the first step with a valid orientation has completed
    pub first_step_completed: bool,
    /// Diagnostics flag as last pushed to the host
    pub show_diagnostics: bool,
    /// Callback time of the last completed step, in seconds
    pub time: f64,
}

impl Default for AttitudeSnapshot {
    fn default() -> Self {
        Self {
            orientation: UnitQuaternion::identity(),
            angles: CumulativeAngles::ZERO,
            deltas: RollPitchYaw::ZERO,
            rates: Rates::ZERO,
            impulse_counters: ImpulseCounters::default(),
            first_step_completed: false,
            show_diagnostics: false,
            time: 0.0,
        }
    }
}
