use fdai_attitude::{ConfigError, FlightDirector, QuaternionExt, TrackerSettings};
use nalgebra::UnitQuaternion;

const FRAME_PERIOD: f64 = 1.0 / 60.0; // 60 Hz host callback

fn main() -> Result<(), ConfigError> {
    let (mut director, sensor) = FlightDirector::with_sensor_feed(TrackerSettings::default())?;
    let handle = director.handle();
    let mut node = UnitQuaternion::identity();

    for frame in 0..120 {
        let time = frame as f64 * FRAME_PERIOD;

        // this would come from the device's motion callback
        let attitude = UnitQuaternion::from_node_euler_degrees(0.0, 0.0, time as f32 * 15.0);
        sensor.on_sample(*attitude.quaternion(), time);

        if frame == 0 {
            handle.recenter();
        }

        if let Err(err) = director.on_update(time, &mut node) {
            println!("holding attitude: {err}");
        }

        if frame % 10 == 0 {
            let snapshot = handle.snapshot();
            let angles = snapshot.angles;
            println!(
                "Roll: {:.2} ({:.2}/s), Pitch: {:.2}, Yaw: {:.2}",
                angles.roll, snapshot.rates.roll, angles.pitch, angles.yaw
            );
        }
    }

    Ok(())
}
