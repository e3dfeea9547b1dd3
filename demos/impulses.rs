use fdai_attitude::{
    Burst, ConfigError, FlightDirector, OrientationSource, Thruster, TrackerSettings,
};
use nalgebra::UnitQuaternion;

const FRAME_PERIOD: f64 = 1.0 / 60.0;

fn main() -> Result<(), ConfigError> {
    let settings = TrackerSettings {
        source: OrientationSource::Impulse,
        impulse_angle: 0.5,
        ..Default::default()
    };
    let (mut director, _sensor) = FlightDirector::with_sensor_feed(settings)?;
    let handle = director.handle();
    let mut node = UnitQuaternion::identity();

    for frame in 0..90 {
        let time = frame as f64 * FRAME_PERIOD;

        // a short pitch-up burst followed by a starboard yaw burst
        match frame {
            10..=19 => {
                handle.fire(Thruster::PitchUp, Burst::Single);
            }
            40..=44 => {
                handle.fire(Thruster::YawStarboard, Burst::Double);
            }
            _ => {}
        }

        director.on_update(time, &mut node).ok();
    }

    let snapshot = director.state().snapshot();
    let counters = snapshot.impulse_counters;
    println!(
        "Counters roll {} pitch {} yaw {}",
        counters.roll, counters.pitch, counters.yaw
    );
    println!(
        "Angles roll {:.2} pitch {:.2} yaw {:.2}",
        snapshot.angles.roll, snapshot.angles.pitch, snapshot.angles.yaw
    );

    Ok(())
}
