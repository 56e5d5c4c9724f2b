use fusion_stream::SensorStream;
use nalgebra::Vector3;

const SAMPLE_RATE: f32 = 100.0;
const SAMPLE_PERIOD: f32 = 1.0 / SAMPLE_RATE;

fn main() {
    let mut stream = SensorStream::new(SAMPLE_RATE);

    for _ in 0..10 {
        // this loop should repeat each time new gyroscope data is available
        let gyroscope = Vector3::new(0.0, 0.0, 0.0); // replace this with actual gyroscope data in degrees/s
        let accelerometer = Vector3::new(0.0, 0.0, 1.0); // replace this with actual accelerometer data in g

        stream.update_no_magnetometer(gyroscope, accelerometer, SAMPLE_PERIOD);

        let (roll, pitch, yaw) = stream.quaternion().euler_angles();

        println!(
            "Roll: {:.2}, Pitch: {:.2}, Yaw: {:.2}",
            roll.to_degrees(),
            pitch.to_degrees(),
            yaw.to_degrees()
        );
    }
}
