//! Reference-frame attitude sampling
//!
//! The sensor collaborator delivers device attitude at its own cadence, on its
//! own callback context. The sampler keeps the latest value and reports it
//! relative to a resettable reference frame: the "zero" orientation captured
//! at the last reset.
//!
//! Two delivery strategies are supported behind [`AttitudeSource`]:
//! - push: the sensor calls [`SamplePublisher::on_sample`], the sampler reads
//!   from the paired [`SensorFeed`]
//! - poll: a [`PollingSource`] re-reads the device on demand

use std::sync::Arc;

use nalgebra::{Quaternion, UnitQuaternion};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::AttitudeError;
use crate::math;
use crate::types::AttitudeSample;

/// Anything that can report the most recent device attitude.
pub trait AttitudeSource {
    /// Latest sample, or `None` if the device has not produced one yet.
    fn latest(&self) -> Option<AttitudeSample>;
}

/// Create a connected publisher/feed pair for push-style sensors.
///
/// The publisher goes to the sensor callback context; the feed goes into an
/// [`AttitudeSampler`] on the render context.
pub fn sensor_channel() -> (SamplePublisher, SensorFeed) {
    let (tx, rx) = watch::channel(None);
    (SamplePublisher { tx: Arc::new(tx) }, SensorFeed { rx })
}

/// Sensor-side handle for pushing attitude samples.
#[derive(Debug, Clone)]
pub struct SamplePublisher {
    tx: Arc<watch::Sender<Option<AttitudeSample>>>,
}

impl SamplePublisher {
    /// Store a raw device attitude.
    ///
    /// The value is normalized (a degenerate reading becomes identity) and
    /// replaces the previous sample as a whole; readers never observe a
    /// partially written quaternion. Last write wins.
    pub fn on_sample(&self, raw: Quaternion<f32>, timestamp: f64) {
        self.publish(AttitudeSample::new(math::normalize(raw), timestamp));
    }

    /// Store an already-normalized sample.
    pub fn publish(&self, sample: AttitudeSample) {
        self.tx.send_replace(Some(sample));
    }
}

/// Render-side view of the samples pushed through a [`SamplePublisher`].
#[derive(Debug, Clone)]
pub struct SensorFeed {
    rx: watch::Receiver<Option<AttitudeSample>>,
}

impl SensorFeed {
    /// Resolve with the first sample, without blocking the calling thread.
    ///
    /// Resolves immediately if a sample already exists. Fails with
    /// [`AttitudeError::SourceClosed`] if every publisher is dropped first.
    pub async fn ready(&self) -> Result<AttitudeSample, AttitudeError> {
        let mut rx = self.rx.clone();
        let sample = *rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| AttitudeError::SourceClosed)?;
        sample.ok_or(AttitudeError::NoSample)
    }
}

impl AttitudeSource for SensorFeed {
    fn latest(&self) -> Option<AttitudeSample> {
        *self.rx.borrow()
    }
}

/// Attitude source that polls a closure each time it is read.
pub struct PollingSource<F> {
    poll: F,
}

impl<F> PollingSource<F>
where
    F: Fn() -> Option<AttitudeSample>,
{
    pub fn new(poll: F) -> Self {
        Self { poll }
    }
}

impl<F> AttitudeSource for PollingSource<F>
where
    F: Fn() -> Option<AttitudeSample>,
{
    fn latest(&self) -> Option<AttitudeSample> {
        (self.poll)()
    }
}

/// Device attitude relative to a resettable reference frame.
pub struct AttitudeSampler<S> {
    source: S,
    reference_frame: Option<UnitQuaternion<f32>>,
}

impl<S: AttitudeSource> AttitudeSampler<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            reference_frame: None,
        }
    }

    /// Capture the current raw attitude as the new zero orientation.
    ///
    /// Fails with [`AttitudeError::NoSample`] if the device has not reported
    /// yet; the previous reference frame, if any, is kept.
    pub fn reset_reference_frame(&mut self) -> Result<(), AttitudeError> {
        let Some(sample) = self.source.latest() else {
            warn!("reference frame reset requested before the first attitude sample");
            return Err(AttitudeError::NoSample);
        };
        self.reference_frame = Some(sample.quaternion);
        info!(timestamp = sample.timestamp, "Reference frame reset");
        Ok(())
    }

    /// Latest raw attitude relative to the reference frame.
    ///
    /// Returns `normalize(raw * inverse(reference))`. Refuses with
    /// [`AttitudeError::NoReferenceFrame`] until the first reset rather than
    /// guessing a zero point.
    pub fn current_relative_attitude(&self) -> Result<UnitQuaternion<f32>, AttitudeError> {
        let reference = self.reference_frame.ok_or(AttitudeError::NoReferenceFrame)?;
        let sample = self.source.latest().ok_or(AttitudeError::NoSample)?;
        Ok(math::multiply(&sample.quaternion, &math::inverse(&reference)))
    }

    /// Latest raw sample from the source.
    pub fn latest_sample(&self) -> Option<AttitudeSample> {
        self.source.latest()
    }

    pub fn reference_frame(&self) -> Option<UnitQuaternion<f32>> {
        self.reference_frame
    }

    pub fn has_reference_frame(&self) -> bool {
        self.reference_frame.is_some()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::from_angle_axis;
    use nalgebra::Vector3;
    use std::cell::Cell;

    fn close_to_identity(q: &UnitQuaternion<f32>) -> bool {
        q.imag().norm() < 1e-5 && (q.w.abs() - 1.0).abs() < 1e-5
    }

    #[test]
    fn test_relative_attitude_requires_reset() {
        let (publisher, feed) = sensor_channel();
        let sampler = AttitudeSampler::new(feed);

        publisher.on_sample(Quaternion::identity(), 0.0);
        assert_eq!(
            sampler.current_relative_attitude(),
            Err(AttitudeError::NoReferenceFrame)
        );
    }

    #[test]
    fn test_reset_without_sample_is_flagged() {
        let (_publisher, feed) = sensor_channel();
        let mut sampler = AttitudeSampler::new(feed);

        assert_eq!(sampler.reset_reference_frame(), Err(AttitudeError::NoSample));
        assert!(!sampler.has_reference_frame());
    }

    #[test]
    fn test_same_attitude_after_reset_is_identity() {
        let (publisher, feed) = sensor_channel();
        let mut sampler = AttitudeSampler::new(feed);
        let a = from_angle_axis(0.8, Vector3::new(0.3, -1.0, 0.4));

        publisher.publish(AttitudeSample::new(a, 0.0));
        sampler.reset_reference_frame().unwrap();
        assert!(close_to_identity(&sampler.current_relative_attitude().unwrap()));

        publisher.publish(AttitudeSample::new(a, 1.0 / 60.0));
        assert!(close_to_identity(&sampler.current_relative_attitude().unwrap()));
    }

    #[test]
    fn test_relative_attitude_tracks_rotation() {
        let (publisher, feed) = sensor_channel();
        let mut sampler = AttitudeSampler::new(feed);
        let reference = from_angle_axis(0.5, Vector3::y());

        publisher.publish(AttitudeSample::new(reference, 0.0));
        sampler.reset_reference_frame().unwrap();

        let turn = from_angle_axis(0.2, Vector3::z());
        publisher.publish(AttitudeSample::new(turn * reference, 0.1));

        let relative = sampler.current_relative_attitude().unwrap();
        let expected = turn;
        assert!((relative.coords - expected.coords).norm() < 1e-5);
    }

    #[test]
    fn test_last_write_wins() {
        let (publisher, feed) = sensor_channel();
        let other_context = publisher.clone();

        publisher.on_sample(Quaternion::new(1.0, 0.0, 0.0, 0.0), 1.0);
        other_context.on_sample(Quaternion::new(0.0, 0.0, 0.0, 2.0), 2.0);

        let latest = feed.latest().unwrap();
        assert_eq!(latest.timestamp, 2.0);
        assert!((latest.quaternion.k - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_samples_cross_threads() {
        let (publisher, feed) = sensor_channel();
        let handle = std::thread::spawn(move || {
            for i in 0..100 {
                let q = from_angle_axis(i as f32 * 0.01, Vector3::x());
                publisher.publish(AttitudeSample::new(q, i as f64));
            }
        });
        handle.join().unwrap();

        let latest = feed.latest().unwrap();
        assert_eq!(latest.timestamp, 99.0);
        assert!((latest.quaternion.norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_sample_becomes_identity() {
        let (publisher, feed) = sensor_channel();
        publisher.on_sample(Quaternion::new(0.0, 0.0, 0.0, 0.0), 0.5);
        assert_eq!(feed.latest().unwrap().quaternion, UnitQuaternion::identity());
    }

    #[test]
    fn test_polling_source() {
        let reads = Cell::new(0u32);
        let source = PollingSource::new(|| {
            reads.set(reads.get() + 1);
            Some(AttitudeSample::new(UnitQuaternion::identity(), 0.0))
        });
        let mut sampler = AttitudeSampler::new(source);

        sampler.reset_reference_frame().unwrap();
        sampler.current_relative_attitude().unwrap();
        assert_eq!(reads.get(), 2);
    }

    #[tokio::test]
    async fn test_ready_resolves_on_first_sample() {
        let (publisher, feed) = sensor_channel();
        let sensor = tokio::spawn(async move {
            tokio::task::yield_now().await;
            publisher.on_sample(Quaternion::identity(), 3.0);
            publisher
        });

        let first = feed.ready().await.unwrap();
        assert_eq!(first.timestamp, 3.0);
        drop(sensor.await.unwrap());
    }

    #[tokio::test]
    async fn test_ready_fails_when_publisher_dropped() {
        let (publisher, feed) = sensor_channel();
        drop(publisher);
        assert_eq!(feed.ready().await, Err(AttitudeError::SourceClosed));
    }
}
