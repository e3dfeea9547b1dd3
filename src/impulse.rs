//! Discrete RCS impulse composer
//!
//! Models attitude changes as fixed-magnitude thruster firings. Every firing
//! composes a small rotation into a running delta quaternion and moves the
//! matching signed counter by one (single) or two (double).
//!
//! Rotation axes follow the scene-node Euler convention used by the
//! integrator: roll about Z, pitch about X, yaw about Y.
//!
//! Yaw counts the other way around from roll and pitch: starboard yaw
//! rotates about -Y and decrements the yaw counter, port yaw rotates about +Y
//! and increments it.

use nalgebra::{UnitQuaternion, Vector3};
use tracing::{debug, info};

use crate::math::{self, DEG_TO_RAD};
use crate::types::ImpulseCounters;

/// Thruster group and firing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thruster {
    RollStarboard,
    RollPort,
    PitchUp,
    PitchDown,
    YawStarboard,
    YawPort,
}

impl Thruster {
    /// Rotation axis of this thruster group.
    pub fn axis(self) -> Vector3<f32> {
        match self {
            Self::RollStarboard => Vector3::z(),
            Self::RollPort => -Vector3::z(),
            Self::PitchUp => Vector3::x(),
            Self::PitchDown => -Vector3::x(),
            Self::YawStarboard => -Vector3::y(),
            Self::YawPort => Vector3::y(),
        }
    }

    /// Counter direction for one unit of firing.
    fn counter_sign(self) -> i32 {
        match self {
            Self::RollStarboard | Self::PitchUp | Self::YawPort => 1,
            Self::RollPort | Self::PitchDown | Self::YawStarboard => -1,
        }
    }
}

/// Single or double impulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Burst {
    Single,
    Double,
}

impl Burst {
    fn units(self) -> i32 {
        match self {
            Self::Single => 1,
            Self::Double => 2,
        }
    }
}

/// Running RCS delta quaternion and impulse counters.
///
/// # Example
/// ```
/// use fdai_attitude::ImpulseComposer;
///
/// let mut rcs = ImpulseComposer::new(0.25);
/// rcs.single_impulse_roll_starboard();
/// rcs.double_impulse_yaw_starboard();
///
/// assert_eq!(rcs.counters().roll, 1);
/// assert_eq!(rcs.counters().yaw, -2);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ImpulseComposer {
    /// Single impulse rotation in radians
    impulse_angle: f32,
    delta_quaternion: UnitQuaternion<f32>,
    counters: ImpulseCounters,
}

impl ImpulseComposer {
    /// Create a composer whose single impulse rotates `impulse_angle_degrees`.
    pub fn new(impulse_angle_degrees: f32) -> Self {
        Self {
            impulse_angle: impulse_angle_degrees * DEG_TO_RAD,
            delta_quaternion: UnitQuaternion::identity(),
            counters: ImpulseCounters::default(),
        }
    }

    /// Fire a thruster group and return the updated delta quaternion.
    ///
    /// Composes `delta = normalize(delta * impulse)`; a double burst is a
    /// single rotation of twice the impulse angle.
    pub fn fire(&mut self, thruster: Thruster, burst: Burst) -> UnitQuaternion<f32> {
        let units = burst.units();
        let impulse = math::from_angle_axis(self.impulse_angle * units as f32, thruster.axis());
        self.delta_quaternion = math::multiply(&self.delta_quaternion, &impulse);

        // Counters wrap at the i32 limits
        let step = thruster.counter_sign() * units;
        let counter = match thruster {
            Thruster::RollStarboard | Thruster::RollPort => &mut self.counters.roll,
            Thruster::PitchUp | Thruster::PitchDown => &mut self.counters.pitch,
            Thruster::YawStarboard | Thruster::YawPort => &mut self.counters.yaw,
        };
        *counter = counter.wrapping_add(step);
        debug!(?thruster, ?burst, counters = ?self.counters, "RCS impulse");

        self.delta_quaternion
    }

    pub fn single_impulse_roll_starboard(&mut self) -> UnitQuaternion<f32> {
        self.fire(Thruster::RollStarboard, Burst::Single)
    }

    pub fn double_impulse_roll_starboard(&mut self) -> UnitQuaternion<f32> {
        self.fire(Thruster::RollStarboard, Burst::Double)
    }

    pub fn single_impulse_roll_port(&mut self) -> UnitQuaternion<f32> {
        self.fire(Thruster::RollPort, Burst::Single)
    }

    pub fn double_impulse_roll_port(&mut self) -> UnitQuaternion<f32> {
        self.fire(Thruster::RollPort, Burst::Double)
    }

    pub fn single_impulse_pitch_up(&mut self) -> UnitQuaternion<f32> {
        self.fire(Thruster::PitchUp, Burst::Single)
    }

    pub fn double_impulse_pitch_up(&mut self) -> UnitQuaternion<f32> {
        self.fire(Thruster::PitchUp, Burst::Double)
    }

    pub fn single_impulse_pitch_down(&mut self) -> UnitQuaternion<f32> {
        self.fire(Thruster::PitchDown, Burst::Single)
    }

    pub fn double_impulse_pitch_down(&mut self) -> UnitQuaternion<f32> {
        self.fire(Thruster::PitchDown, Burst::Double)
    }

    /// Decrements the yaw counter.
    pub fn single_impulse_yaw_starboard(&mut self) -> UnitQuaternion<f32> {
        self.fire(Thruster::YawStarboard, Burst::Single)
    }

    /// Decrements the yaw counter by two.
    pub fn double_impulse_yaw_starboard(&mut self) -> UnitQuaternion<f32> {
        self.fire(Thruster::YawStarboard, Burst::Double)
    }

    /// Increments the yaw counter.
    pub fn single_impulse_yaw_port(&mut self) -> UnitQuaternion<f32> {
        self.fire(Thruster::YawPort, Burst::Single)
    }

    /// Increments the yaw counter by two.
    pub fn double_impulse_yaw_port(&mut self) -> UnitQuaternion<f32> {
        self.fire(Thruster::YawPort, Burst::Double)
    }

    /// Return the delta quaternion to identity and zero every counter.
    pub fn reset(&mut self) {
        self.delta_quaternion = UnitQuaternion::identity();
        self.counters = ImpulseCounters::default();
        info!("RCS impulses reset");
    }

    pub fn delta_quaternion(&self) -> UnitQuaternion<f32> {
        self.delta_quaternion
    }

    pub fn counters(&self) -> ImpulseCounters {
        self.counters
    }

    /// Single impulse rotation in radians.
    pub fn impulse_angle(&self) -> f32 {
        self.impulse_angle
    }
}
