//! Fixed-timestep orientation integrator
//!
//! Host callbacks arrive at whatever rate the renderer runs. The integrator
//! banks elapsed time in an accumulator and advances the simulation in
//! constant steps, so per-step angle deltas and rates are independent of the
//! host frame rate.
//!
//! Each step applies an orientation to the [`VehicleNode`], decomposes the
//! rotation since the previous step into roll/pitch/yaw deltas and folds them
//! into cumulative display angles in [0, 360).

use nalgebra::UnitQuaternion;
use tracing::{debug, trace};

use crate::axes::remap_quaternion;
use crate::error::{AttitudeError, ConfigError};
use crate::impulse::ImpulseComposer;
use crate::math::{self, Vector3Ext};
use crate::sampler::{AttitudeSampler, AttitudeSource};
use crate::state::AttitudeState;
use crate::types::{CumulativeAngles, OrientationSource, Rates, RollPitchYaw, TrackerSettings};

/// Scene node driven by the integrator.
pub trait VehicleNode {
    /// Replace the node's orientation.
    fn set_orientation(&mut self, orientation: UnitQuaternion<f32>);

    /// Show or hide the host's rendering diagnostics.
    fn set_show_diagnostics(&mut self, _show: bool) {}
}

impl VehicleNode for UnitQuaternion<f32> {
    fn set_orientation(&mut self, orientation: UnitQuaternion<f32>) {
        *self = orientation;
    }
}

/// Integrator clock state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clock {
    /// No callback has been seen yet
    Uninitialized,
    /// Callback time of the last `on_update`
    Tracking { current_time: f64 },
}

/// Where an angle wraps back past 360 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fold {
    /// Fold at 360 and above (yaw)
    Inclusive,
    /// Fold only above 360 (roll, pitch)
    Exclusive,
}

/// Fixed-timestep integrator of orientation deltas into cumulative angles.
///
/// # Example
/// ```
/// use fdai_attitude::{
///     sensor_channel, AttitudeSampler, AttitudeState, ImpulseComposer,
///     OrientationIntegrator, OrientationSource, TrackerSettings,
/// };
/// use nalgebra::UnitQuaternion;
///
/// let settings = TrackerSettings {
///     source: OrientationSource::Impulse,
///     ..Default::default()
/// };
/// let (_publisher, feed) = sensor_channel();
/// let sampler = AttitudeSampler::new(feed);
/// let mut composer = ImpulseComposer::new(1.0);
/// let mut state = AttitudeState::new(settings.publish_interval);
/// let mut integrator = OrientationIntegrator::new(settings).unwrap();
/// let mut node = UnitQuaternion::identity();
///
/// // The first callback only starts the clock
/// assert_eq!(integrator.on_update(0.0, &sampler, &composer, &mut state, &mut node), Ok(0));
///
/// composer.single_impulse_pitch_up();
/// integrator.on_update(0.1, &sampler, &composer, &mut state, &mut node).unwrap();
/// assert!(state.is_ready());
/// assert_eq!(node, composer.delta_quaternion());
/// ```
#[derive(Debug, Clone)]
pub struct OrientationIntegrator {
    settings: TrackerSettings,
    clock: Clock,
    accumulator: f64,
    previous: Option<UnitQuaternion<f32>>,
    current: Option<UnitQuaternion<f32>>,
    deltas: RollPitchYaw,
    rates: Rates,
}

impl OrientationIntegrator {
    /// Create an integrator, rejecting settings it cannot step with.
    ///
    /// A non-positive `fixed_step` would never drain the accumulator, and a
    /// `max_frame_time` below `fixed_step` would never run a step.
    pub fn new(settings: TrackerSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            settings,
            clock: Clock::Uninitialized,
            accumulator: 0.0,
            previous: None,
            current: None,
            deltas: RollPitchYaw::ZERO,
            rates: Rates::ZERO,
        })
    }

    /// Advance the simulation to callback time `time` (seconds).
    ///
    /// Returns the number of fixed steps run. The first call only starts the
    /// clock. Frame time is clamped to `[0, max_frame_time]`; excess real time
    /// is dropped.
    ///
    /// If the orientation source fails, the node and angles hold their last
    /// values, the remaining steps are still drained, and the first error is
    /// returned.
    pub fn on_update<S, N>(
        &mut self,
        time: f64,
        sampler: &AttitudeSampler<S>,
        composer: &ImpulseComposer,
        state: &mut AttitudeState,
        node: &mut N,
    ) -> Result<u32, AttitudeError>
    where
        S: AttitudeSource,
        N: VehicleNode + ?Sized,
    {
        let current_time = match self.clock {
            Clock::Uninitialized => {
                self.clock = Clock::Tracking { current_time: time };
                debug!(time, "Integrator clock started");
                return Ok(0);
            }
            Clock::Tracking { current_time } => current_time,
        };

        let elapsed = time - current_time;
        let frame_time = elapsed.clamp(0.0, self.settings.max_frame_time);
        if frame_time != elapsed {
            debug!(elapsed, frame_time, "Frame time clamped");
        }
        self.clock = Clock::Tracking { current_time: time };
        self.accumulator += frame_time;

        node.set_show_diagnostics(self.settings.show_diagnostics);
        state.set_show_diagnostics(self.settings.show_diagnostics);

        let mut steps = 0;
        let mut failure = None;
        while self.accumulator >= self.settings.fixed_step {
            self.accumulator -= self.settings.fixed_step;
            steps += 1;
            if let Err(err) = self.step(time, sampler, composer, state, node) {
                failure.get_or_insert(err);
            }
        }
        state.publish_if_due(time);

        match failure {
            Some(err) => {
                trace!(%err, steps, "Attitude held");
                Err(err)
            }
            None => Ok(steps),
        }
    }

    fn step<S, N>(
        &mut self,
        time: f64,
        sampler: &AttitudeSampler<S>,
        composer: &ImpulseComposer,
        state: &mut AttitudeState,
        node: &mut N,
    ) -> Result<(), AttitudeError>
    where
        S: AttitudeSource,
        N: VehicleNode + ?Sized,
    {
        let orientation = self.select_orientation(sampler, composer)?;
        node.set_orientation(orientation);

        self.previous = self.current;
        self.current = Some(orientation);

        let mut angles = state.angles();
        if let Some(previous) = self.previous {
            let delta = math::multiply(&orientation, &math::inverse(&previous));
            let euler = math::to_euler_angles(&delta).rad_to_deg();

            // Yaw is reported inverted with respect to the node's y axis
            self.deltas = RollPitchYaw::new(euler.z, euler.x, -euler.y);
            self.rates = self.deltas / self.settings.fixed_step as f32;
            angles = accumulate(angles, self.deltas, self.rates);
        }

        state.record_step(
            time,
            orientation,
            angles,
            self.deltas,
            self.rates,
            composer.counters(),
        );
        Ok(())
    }

    fn select_orientation<S: AttitudeSource>(
        &self,
        sampler: &AttitudeSampler<S>,
        composer: &ImpulseComposer,
    ) -> Result<UnitQuaternion<f32>, AttitudeError> {
        let sensor = || {
            sampler
                .current_relative_attitude()
                .map(|q| remap_quaternion(&q, self.settings.node_axes))
        };
        match self.settings.source {
            OrientationSource::Sensor => sensor(),
            OrientationSource::Impulse => Ok(composer.delta_quaternion()),
            OrientationSource::Combined => {
                Ok(math::multiply(&sensor()?, &composer.delta_quaternion()))
            }
        }
    }

    /// Zero the cumulative angles, deltas and rates and restart delta
    /// tracking from identity.
    pub fn reset_euler_angles(&mut self, state: &mut AttitudeState) {
        self.previous = Some(UnitQuaternion::identity());
        self.current = Some(UnitQuaternion::identity());
        self.deltas = RollPitchYaw::ZERO;
        self.rates = Rates::ZERO;
        state.reset_angles();
        debug!("Euler angles reset");
    }

    /// Forget the last applied orientation so the next step does not
    /// integrate a jump in the orientation source.
    pub fn discard_previous(&mut self) {
        self.previous = None;
        self.current = None;
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.clock, Clock::Tracking { .. })
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Last step's roll/pitch/yaw change in degrees.
    pub fn deltas(&self) -> RollPitchYaw {
        self.deltas
    }

    /// Last step's rates in degrees per second.
    ///
    /// A rate is the delta between the two most recent reads divided by
    /// `fixed_step`. With a timestamped feed it reflects how many device
    /// frames landed inside that step, so a 60 Hz feed under 30 ms steps
    /// alternates between one and two frames' worth. The cumulative angles
    /// stay exact.
    pub fn rates(&self) -> Rates {
        self.rates
    }

    pub fn current_orientation(&self) -> Option<UnitQuaternion<f32>> {
        self.current
    }

    /// Banked time not yet consumed by a fixed step, in seconds.
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn set_source(&mut self, source: OrientationSource) {
        if self.settings.source != source {
            debug!(?source, "Orientation source changed");
            self.settings.source = source;
            self.discard_previous();
        }
    }

    pub fn set_show_diagnostics(&mut self, show: bool) {
        self.settings.show_diagnostics = show;
    }
}

fn accumulate(angles: CumulativeAngles, deltas: RollPitchYaw, rates: Rates) -> CumulativeAngles {
    CumulativeAngles {
        roll: advance_angle(angles.roll, deltas.roll, rates.roll, Fold::Exclusive),
        pitch: advance_angle(angles.pitch, deltas.pitch, rates.pitch, Fold::Exclusive),
        yaw: advance_angle(angles.yaw, deltas.yaw, rates.yaw, Fold::Inclusive),
    }
}

/// Move a cumulative angle by `delta` degrees in the direction of `rate`.
fn advance_angle(angle: f32, delta: f32, rate: f32, fold: Fold) -> f32 {
    let magnitude = delta.abs();
    let mut angle = if rate > 0.0 {
        angle + magnitude
    } else if rate < 0.0 {
        if angle > 0.0 {
            angle - magnitude
        } else {
            360.0 - magnitude
        }
    } else {
        return angle;
    };

    if angle < 0.0 {
        angle += 360.0;
    }
    let wraps = match fold {
        Fold::Inclusive => angle >= 360.0,
        Fold::Exclusive => angle > 360.0,
    };
    if wraps {
        angle -= 360.0;
    }
    angle
}
