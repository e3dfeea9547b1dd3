//! Flight director engine
//!
//! [`FlightDirector`] owns the sampler, impulse composer, integrator and
//! published state, and is driven by the host's per-frame callback. UI and
//! gesture code talk to it from other contexts through a cloneable
//! [`EngineHandle`]: commands are queued and applied at the start of the next
//! `on_update`, between steps, never in the middle of one.

use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::error::{AttitudeError, ConfigError};
use crate::impulse::{Burst, ImpulseComposer, Thruster};
use crate::integrator::{OrientationIntegrator, VehicleNode};
use crate::sampler::{
    AttitudeSampler, AttitudeSource, SamplePublisher, SensorFeed, sensor_channel,
};
use crate::state::{AttitudeState, wait_until_ready};
use crate::types::{AttitudeSnapshot, OrientationSource, ResetPolicy, TrackerSettings};

/// Request queued from a UI or gesture context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineCommand {
    /// Double-tap gesture, handled per [`ResetPolicy`]
    Recenter,
    ResetReferenceFrame,
    ResetEulerAngles,
    Fire(Thruster, Burst),
    ResetImpulses,
    SetSource(OrientationSource),
    SetShowDiagnostics(bool),
}

/// Cloneable handle for driving the engine from other contexts.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<EngineCommand>,
    snapshots: watch::Receiver<AttitudeSnapshot>,
}

impl EngineHandle {
    /// Queue a command. Returns `false` if the engine has been dropped.
    pub fn send(&self, command: EngineCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Recenter per the configured reset policy.
    pub fn recenter(&self) -> bool {
        self.send(EngineCommand::Recenter)
    }

    pub fn reset_reference_frame(&self) -> bool {
        self.send(EngineCommand::ResetReferenceFrame)
    }

    pub fn reset_euler_angles(&self) -> bool {
        self.send(EngineCommand::ResetEulerAngles)
    }

    pub fn fire(&self, thruster: Thruster, burst: Burst) -> bool {
        self.send(EngineCommand::Fire(thruster, burst))
    }

    pub fn reset_impulses(&self) -> bool {
        self.send(EngineCommand::ResetImpulses)
    }

    pub fn set_source(&self, source: OrientationSource) -> bool {
        self.send(EngineCommand::SetSource(source))
    }

    pub fn set_show_diagnostics(&self, show: bool) -> bool {
        self.send(EngineCommand::SetShowDiagnostics(show))
    }

    /// Most recently published snapshot.
    pub fn snapshot(&self) -> AttitudeSnapshot {
        *self.snapshots.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AttitudeSnapshot> {
        self.snapshots.clone()
    }

    /// Resolve once the first valid step has completed.
    pub async fn ready(&self) -> Result<AttitudeSnapshot, AttitudeError> {
        wait_until_ready(self.snapshots.clone()).await
    }
}

/// Attitude engine driven by the host's per-frame callback.
///
/// # Example
/// ```
/// use fdai_attitude::{FlightDirector, TrackerSettings};
/// use nalgebra::{Quaternion, UnitQuaternion};
///
/// let (mut director, sensor) =
///     FlightDirector::with_sensor_feed(TrackerSettings::default()).unwrap();
/// let handle = director.handle();
/// let mut node = UnitQuaternion::identity();
///
/// sensor.on_sample(Quaternion::identity(), 0.0);
/// handle.recenter();
///
/// director.on_update(0.0, &mut node).unwrap();
/// director.on_update(1.0 / 30.0, &mut node).unwrap();
/// assert!(director.state().is_ready());
/// assert!(handle.snapshot().first_step_completed);
/// ```
pub struct FlightDirector<S> {
    settings: TrackerSettings,
    sampler: AttitudeSampler<S>,
    composer: ImpulseComposer,
    integrator: OrientationIntegrator,
    state: AttitudeState,
    commands: mpsc::UnboundedReceiver<EngineCommand>,
    command_tx: mpsc::UnboundedSender<EngineCommand>,
}

impl FlightDirector<SensorFeed> {
    /// Create an engine fed by a push-style sensor.
    ///
    /// The returned publisher goes to the sensor callback context.
    pub fn with_sensor_feed(
        settings: TrackerSettings,
    ) -> Result<(Self, SamplePublisher), ConfigError> {
        let (publisher, feed) = sensor_channel();
        Ok((Self::new(settings, feed)?, publisher))
    }
}

impl<S: AttitudeSource> FlightDirector<S> {
    /// Create an engine reading device attitude from `source`.
    ///
    /// Fails with [`ConfigError::Invalid`] if the settings do not pass
    /// [`TrackerSettings::validate`].
    pub fn new(settings: TrackerSettings, source: S) -> Result<Self, ConfigError> {
        let integrator = OrientationIntegrator::new(settings)?;
        let (command_tx, commands) = mpsc::unbounded_channel();
        info!(
            source = ?settings.source,
            reset_policy = ?settings.reset_policy,
            "Flight director created"
        );
        Ok(Self {
            settings,
            sampler: AttitudeSampler::new(source),
            composer: ImpulseComposer::new(settings.impulse_angle),
            integrator,
            state: AttitudeState::new(settings.publish_interval),
            commands,
            command_tx,
        })
    }

    /// Handle for UI and gesture contexts.
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            commands: self.command_tx.clone(),
            snapshots: self.state.subscribe(),
        }
    }

    /// Host per-frame callback.
    ///
    /// Applies queued commands, then advances the integrator. See
    /// [`OrientationIntegrator::on_update`] for the step semantics.
    pub fn on_update<N>(&mut self, time: f64, node: &mut N) -> Result<u32, AttitudeError>
    where
        N: VehicleNode + ?Sized,
    {
        self.apply_pending_commands();
        self.integrator.on_update(
            time,
            &self.sampler,
            &self.composer,
            &mut self.state,
            node,
        )
    }

    /// Apply every queued command. Returns how many were applied.
    pub fn apply_pending_commands(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.commands.try_recv() {
            if let Err(err) = self.apply(command) {
                warn!(?command, %err, "Engine command failed");
            }
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, command: EngineCommand) -> Result<(), AttitudeError> {
        match command {
            EngineCommand::Recenter => self.recenter()?,
            EngineCommand::ResetReferenceFrame => self.reset_reference_frame()?,
            EngineCommand::ResetEulerAngles => self.reset_euler_angles(),
            EngineCommand::Fire(thruster, burst) => {
                self.composer.fire(thruster, burst);
            }
            EngineCommand::ResetImpulses => self.composer.reset(),
            EngineCommand::SetSource(source) => {
                self.settings.source = source;
                self.integrator.set_source(source);
            }
            EngineCommand::SetShowDiagnostics(show) => {
                self.settings.show_diagnostics = show;
                self.integrator.set_show_diagnostics(show);
            }
        }
        Ok(())
    }

    /// Recenter per the configured [`ResetPolicy`].
    ///
    /// If no sample has arrived yet the reference frame is kept and the
    /// angles are left alone.
    pub fn recenter(&mut self) -> Result<(), AttitudeError> {
        self.reset_reference_frame()?;
        if self.settings.reset_policy == ResetPolicy::ReferenceFrameAndAngles {
            self.reset_euler_angles();
        }
        Ok(())
    }

    /// Capture the current device attitude as the zero orientation.
    ///
    /// The jump in relative attitude this causes is not integrated into the
    /// cumulative angles.
    pub fn reset_reference_frame(&mut self) -> Result<(), AttitudeError> {
        self.sampler.reset_reference_frame()?;
        if self.settings.source != OrientationSource::Impulse {
            self.integrator.discard_previous();
        }
        Ok(())
    }

    /// Zero the cumulative Euler angles, deltas and rates.
    pub fn reset_euler_angles(&mut self) {
        self.integrator.reset_euler_angles(&mut self.state);
    }

    pub fn sampler(&self) -> &AttitudeSampler<S> {
        &self.sampler
    }

    pub fn composer(&self) -> &ImpulseComposer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut ImpulseComposer {
        &mut self.composer
    }

    pub fn state(&self) -> &AttitudeState {
        &self.state
    }

    pub fn integrator(&self) -> &OrientationIntegrator {
        &self.integrator
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axes::AxesAlignment;
    use crate::math::QuaternionExt;
    use crate::types::{AttitudeSample, CumulativeAngles};
    use nalgebra::UnitQuaternion;

    fn settings(reset_policy: ResetPolicy) -> TrackerSettings {
        TrackerSettings {
            reset_policy,
            node_axes: AxesAlignment::PxPyPz,
            ..Default::default()
        }
    }

    fn director_with(reset_policy: ResetPolicy) -> (FlightDirector<SensorFeed>, SamplePublisher) {
        FlightDirector::with_sensor_feed(settings(reset_policy)).unwrap()
    }

    fn pitched(degrees: f32) -> AttitudeSample {
        AttitudeSample::new(UnitQuaternion::from_node_euler_degrees(degrees, 0.0, 0.0), 0.0)
    }

    #[test]
    fn test_rejects_settings_that_cannot_step() {
        for fixed_step in [0.0, -0.03, f64::NAN] {
            let result = FlightDirector::with_sensor_feed(TrackerSettings {
                fixed_step,
                source: OrientationSource::Impulse,
                ..Default::default()
            });
            assert!(matches!(result, Err(ConfigError::Invalid(_))), "{fixed_step}");
        }

        let (_publisher, feed) = sensor_channel();
        let stalled = TrackerSettings {
            fixed_step: 0.5,
            max_frame_time: 0.25,
            ..Default::default()
        };
        assert!(matches!(
            FlightDirector::new(stalled, feed),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_commands_wait_for_next_update() {
        let (mut director, sensor) = director_with(ResetPolicy::default());
        let handle = director.handle();
        sensor.publish(pitched(0.0));

        assert!(handle.recenter());
        assert!(!director.sampler().has_reference_frame());

        let mut node = UnitQuaternion::identity();
        director.on_update(0.0, &mut node).unwrap();
        assert!(director.sampler().has_reference_frame());
    }

    #[test]
    fn test_recenter_before_first_sample_is_harmless() {
        let (mut director, _sensor) = director_with(ResetPolicy::default());
        assert_eq!(director.recenter(), Err(AttitudeError::NoSample));

        // queued through the handle the failure is only logged
        director.handle().recenter();
        assert_eq!(director.apply_pending_commands(), 1);
        assert!(!director.sampler().has_reference_frame());
    }

    #[test]
    fn test_recenter_resets_angles_by_default() {
        let (mut director, sensor) = director_with(ResetPolicy::default());
        let mut node = UnitQuaternion::identity();
        sensor.publish(pitched(0.0));
        director.recenter().unwrap();

        director.on_update(0.0, &mut node).unwrap();
        director.on_update(0.035, &mut node).unwrap();
        sensor.publish(pitched(30.0));
        director.on_update(0.07, &mut node).unwrap();
        assert!(director.state().angles().pitch > 29.0);

        director.recenter().unwrap();
        assert_eq!(director.state().angles(), CumulativeAngles::ZERO);

        // same device attitude is now the zero orientation
        director.on_update(0.105, &mut node).unwrap();
        assert!(director.state().angles().pitch.abs() < 1e-3);
        assert!(node.angle() < 1e-3);
    }

    #[test]
    fn test_reference_frame_only_keeps_angles() {
        let (mut director, sensor) = director_with(ResetPolicy::ReferenceFrameOnly);
        let mut node = UnitQuaternion::identity();
        sensor.publish(pitched(0.0));
        director.recenter().unwrap();

        director.on_update(0.0, &mut node).unwrap();
        director.on_update(0.035, &mut node).unwrap();
        sensor.publish(pitched(30.0));
        director.on_update(0.07, &mut node).unwrap();
        let before = director.state().angles().pitch;

        director.recenter().unwrap();
        director.on_update(0.105, &mut node).unwrap();

        // the reference jump is not counted as motion
        assert!((director.state().angles().pitch - before).abs() < 1e-3);
        assert!(node.angle() < 1e-3);
    }

    #[test]
    fn test_fire_through_handle() {
        let (mut director, _sensor) = FlightDirector::with_sensor_feed(TrackerSettings {
            source: OrientationSource::Impulse,
            ..Default::default()
        })
        .unwrap();
        let handle = director.handle();
        let mut node = UnitQuaternion::identity();

        handle.fire(Thruster::RollStarboard, Burst::Double);
        handle.fire(Thruster::YawStarboard, Burst::Single);
        director.on_update(0.0, &mut node).unwrap();

        let counters = director.composer().counters();
        assert_eq!(counters.roll, 2);
        assert_eq!(counters.yaw, -1);
        assert_eq!(director.state().snapshot().impulse_counters.roll, 0);

        director.on_update(0.035, &mut node).unwrap();
        assert_eq!(director.state().snapshot().impulse_counters, counters);
        assert_eq!(node, director.composer().delta_quaternion());

        handle.reset_impulses();
        director.apply_pending_commands();
        assert_eq!(director.composer().counters().roll, 0);
    }

    #[test]
    fn test_source_and_diagnostics_commands() {
        let (mut director, _sensor) =
            FlightDirector::with_sensor_feed(TrackerSettings::default()).unwrap();
        let handle = director.handle();

        handle.set_source(OrientationSource::Combined);
        handle.set_show_diagnostics(true);
        assert_eq!(director.apply_pending_commands(), 2);
        assert_eq!(director.settings().source, OrientationSource::Combined);
        assert_eq!(director.integrator().settings().source, OrientationSource::Combined);
        assert!(director.integrator().settings().show_diagnostics);
    }

    #[test]
    fn test_handle_outlives_engine() {
        let (director, _sensor) =
            FlightDirector::with_sensor_feed(TrackerSettings::default()).unwrap();
        let handle = director.handle();
        drop(director);
        assert!(!handle.recenter());
    }

    #[tokio::test]
    async fn test_handle_ready() {
        let (mut director, sensor) =
            FlightDirector::with_sensor_feed(TrackerSettings::default()).unwrap();
        let handle = director.handle();
        let waiter = tokio::spawn(async move { handle.ready().await });

        sensor.publish(pitched(0.0));
        director.recenter().unwrap();
        let mut node = UnitQuaternion::identity();
        director.on_update(0.0, &mut node).unwrap();
        director.on_update(0.035, &mut node).unwrap();

        let snapshot = waiter.await.unwrap().unwrap();
        assert!(snapshot.first_step_completed);
    }
}
