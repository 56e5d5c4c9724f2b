//! Replay a recorded sensor log through a sensor stream
//!
//! Reads a CSV log of gyroscope, accelerometer and magnetometer samples,
//! runs it through the gyroscope offset estimator and the attitude filter,
//! and writes orientation plus rejection diagnostics as CSV to stdout.
//!
//! Run with: `cargo run --example replay -- path/to/sensor_data.csv > out.csv`

use fusion_stream::{AhrsSettings, Convention, OffsetSettings, QuaternionExt, SensorStream};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::io;

#[derive(Debug, Deserialize)]
struct SensorData {
    #[serde(rename = "Time (s)")]
    time: f32,
    #[serde(rename = "Gyroscope X (deg/s)")]
    gyro_x: f32,
    #[serde(rename = "Gyroscope Y (deg/s)")]
    gyro_y: f32,
    #[serde(rename = "Gyroscope Z (deg/s)")]
    gyro_z: f32,
    #[serde(rename = "Accelerometer X (g)")]
    accel_x: f32,
    #[serde(rename = "Accelerometer Y (g)")]
    accel_y: f32,
    #[serde(rename = "Accelerometer Z (g)")]
    accel_z: f32,
    #[serde(rename = "Magnetometer X (uT)")]
    mag_x: f32,
    #[serde(rename = "Magnetometer Y (uT)")]
    mag_y: f32,
    #[serde(rename = "Magnetometer Z (uT)")]
    mag_z: f32,
}

#[derive(Debug, Serialize)]
struct Output {
    time: f32,
    roll: f32,
    pitch: f32,
    yaw: f32,
    initialising: bool,
    acceleration_error: f32,
    accelerometer_ignored: bool,
    acceleration_recovery_trigger: u32,
    magnetic_error: f32,
    magnetometer_ignored: bool,
    magnetic_recovery_trigger: u32,
    gyroscope_offset_z: f32,
}

const SAMPLE_RATE: f32 = 100.0;

fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("usage: replay <sensor_data.csv>")?;

    let settings = AhrsSettings {
        convention: Convention::Nwu,
        gain: 0.5,
        gyroscope_range: 2000.0,
        acceleration_rejection: 10.0,
        magnetic_rejection: 10.0,
        recovery_trigger_period: (5.0 * SAMPLE_RATE) as u32,
        ..Default::default()
    };
    let mut stream = SensorStream::try_with_settings(settings, OffsetSettings::default(), SAMPLE_RATE)?;

    let mut reader = csv::Reader::from_path(path)?;
    let mut writer = csv::Writer::from_writer(io::stdout());
    let mut previous_time = None;

    for result in reader.deserialize() {
        let data: SensorData = result?;
        let delta_time = match previous_time {
            Some(previous) => data.time - previous,
            None => 1.0 / SAMPLE_RATE,
        };
        previous_time = Some(data.time);

        stream.update(
            Vector3::new(data.gyro_x, data.gyro_y, data.gyro_z),
            Vector3::new(data.accel_x, data.accel_y, data.accel_z),
            Vector3::new(data.mag_x, data.mag_y, data.mag_z),
            delta_time,
        );

        let euler = stream.quaternion().to_euler_degrees();
        let states = stream.internal_states();
        writer.serialize(Output {
            time: data.time,
            roll: euler.x,
            pitch: euler.y,
            yaw: euler.z,
            initialising: stream.flags().initialising,
            acceleration_error: states.acceleration_error,
            accelerometer_ignored: states.accelerometer_ignored,
            acceleration_recovery_trigger: states.acceleration_recovery_trigger,
            magnetic_error: states.magnetic_error,
            magnetometer_ignored: states.magnetometer_ignored,
            magnetic_recovery_trigger: states.magnetic_recovery_trigger,
            gyroscope_offset_z: stream.offset().offset().z,
        })?;
    }

    writer.flush()?;
    Ok(())
}
