//! Published attitude state
//!
//! The integrator is the only writer. The render context reads the latest
//! snapshot directly; UI watchers receive snapshots over a watch channel,
//! throttled to the configured publish interval.

use nalgebra::UnitQuaternion;
use tokio::sync::watch;
use tracing::info;

use crate::error::AttitudeError;
use crate::types::{AttitudeSnapshot, CumulativeAngles, ImpulseCounters, Rates, RollPitchYaw};

/// Owner of the published orientation, cumulative angles and rates.
#[derive(Debug)]
pub struct AttitudeState {
    latest: AttitudeSnapshot,
    publisher: watch::Sender<AttitudeSnapshot>,
    publish_interval: f64,
    last_published: Option<f64>,
}

impl AttitudeState {
    /// Create the state with snapshots published at most every `publish_interval` seconds.
    pub fn new(publish_interval: f64) -> Self {
        let (publisher, _) = watch::channel(AttitudeSnapshot::default());
        Self {
            latest: AttitudeSnapshot::default(),
            publisher,
            publish_interval,
            last_published: None,
        }
    }

    /// Latest snapshot, including steps not yet published to watchers.
    pub fn snapshot(&self) -> AttitudeSnapshot {
        self.latest
    }

    pub fn angles(&self) -> CumulativeAngles {
        self.latest.angles
    }

    pub fn rates(&self) -> Rates {
        self.latest.rates
    }

    pub fn orientation(&self) -> UnitQuaternion<f32> {
        self.latest.orientation
    }

    /// Whether a step with a valid orientation has completed.
    pub fn is_ready(&self) -> bool {
        self.latest.first_step_completed
    }

    /// Receiver for published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<AttitudeSnapshot> {
        self.publisher.subscribe()
    }

    /// Resolve once the first valid step has completed.
    pub fn ready(&self) -> impl Future<Output = Result<AttitudeSnapshot, AttitudeError>> + use<> {
        wait_until_ready(self.subscribe())
    }

    /// Record the outcome of one fixed step.
    pub(crate) fn record_step(
        &mut self,
        time: f64,
        orientation: UnitQuaternion<f32>,
        angles: CumulativeAngles,
        deltas: RollPitchYaw,
        rates: Rates,
        impulse_counters: ImpulseCounters,
    ) {
        let first = !self.latest.first_step_completed;
        self.latest = AttitudeSnapshot {
            orientation,
            angles,
            deltas,
            rates,
            impulse_counters,
            first_step_completed: true,
            show_diagnostics: self.latest.show_diagnostics,
            time,
        };
        if first {
            info!(time, "First attitude step completed");
            self.publish(time);
        }
    }

    /// Zero the cumulative angles, deltas and rates.
    pub(crate) fn reset_angles(&mut self) {
        self.latest.angles = CumulativeAngles::ZERO;
        self.latest.deltas = RollPitchYaw::ZERO;
        self.latest.rates = Rates::ZERO;
        let time = self.latest.time;
        self.publish(time);
    }

    pub(crate) fn set_show_diagnostics(&mut self, show: bool) {
        self.latest.show_diagnostics = show;
    }

    /// Send the latest snapshot to watchers if the publish interval has elapsed.
    pub(crate) fn publish_if_due(&mut self, time: f64) -> bool {
        let due = self
            .last_published
            .is_none_or(|last| time - last >= self.publish_interval);
        if due {
            self.publish(time);
        }
        due
    }

    fn publish(&mut self, time: f64) {
        self.publisher.send_replace(self.latest);
        self.last_published = Some(time);
    }
}

/// Wait on a snapshot receiver until the first valid step has been published.
pub async fn wait_until_ready(
    mut rx: watch::Receiver<AttitudeSnapshot>,
) -> Result<AttitudeSnapshot, AttitudeError> {
    let snapshot = *rx
        .wait_for(|snapshot| snapshot.first_step_completed)
        .await
        .map_err(|_| AttitudeError::SourceClosed)?;
    Ok(snapshot)
}
