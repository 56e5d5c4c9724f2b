use fusion_stream::{
    Ahrs, AhrsSettings, Convention, OffsetSettings, QuaternionExt, STANDARD_GRAVITY, SensorStream,
};
use nalgebra::{UnitQuaternion, Vector3};

const EPSILON: f32 = 1e-6;
const DT: f32 = 0.01;

fn up() -> Vector3<f32> {
    Vector3::new(0.0, 0.0, 1.0)
}

fn north() -> Vector3<f32> {
    Vector3::new(1.0, 0.0, 0.0)
}

fn assert_unit(quaternion: UnitQuaternion<f32>) {
    let norm = quaternion.into_inner().norm();
    assert!((norm - 1.0).abs() < EPSILON, "norm {}", norm);
}

/// Default settings keep the usual defaults and expose the ramp constants
#[test]
fn test_settings_defaults() {
    let ahrs = Ahrs::new();
    let settings = ahrs.settings();
    assert_eq!(settings.gain, 0.5);
    assert_eq!(settings.gyroscope_range, 0.0);
    assert_eq!(settings.acceleration_rejection, 90.0);
    assert_eq!(settings.magnetic_rejection, 90.0);
    assert_eq!(settings.recovery_trigger_period, 0);
    assert_eq!(settings.initial_gain, 10.0);
    assert_eq!(settings.initialisation_period, 3.0);
}

/// Stationary input starting from identity stays at identity
#[test]
fn test_stationary_input_holds_identity() {
    let mut ahrs = Ahrs::new();

    for _ in 0..400 {
        ahrs.update(Vector3::zeros(), up(), north(), DT);
        assert_unit(ahrs.quaternion());
    }
    assert!(!ahrs.flags().initialising);

    let quat = ahrs.quaternion();
    assert!((quat.w - 1.0).abs() < EPSILON);
    assert!(quat.i.abs() < EPSILON);
    assert!(quat.j.abs() < EPSILON);
    assert!(quat.k.abs() < EPSILON);
}

/// A tilted start converges to the measured tilt within the ramp
#[test]
fn test_initial_tilt_converges_during_ramp() {
    let mut ahrs = Ahrs::new();
    let tilt = UnitQuaternion::from_euler_degrees(20.0, -35.0, 0.0);
    let accel = tilt.inverse_transform_vector(&up());

    for _ in 0..300 {
        ahrs.update_no_magnetometer(Vector3::zeros(), accel, DT);
    }

    let predicted_up = ahrs.quaternion().inverse_transform_vector(&up());
    let error = predicted_up.angle(&accel).to_degrees();
    assert!(error < 0.1, "tilt error {} degrees", error);
}

/// Rotation about Z integrates into yaw
#[test]
fn test_quaternion_integration() {
    let mut ahrs = Ahrs::new();

    for _ in 0..400 {
        ahrs.update_no_magnetometer(Vector3::zeros(), up(), DT);
    }

    // 10 deg/s for 1 s
    for _ in 0..100 {
        ahrs.update_no_magnetometer(Vector3::new(0.0, 0.0, 10.0), up(), DT);
    }

    let euler = ahrs.quaternion().to_euler_degrees();
    assert!((euler.z - 10.0).abs() < 0.1, "yaw {}", euler.z);
    assert!(euler.x.abs() < 0.01);
    assert!(euler.y.abs() < 0.01);
}

/// A single outlier is ignored without moving the estimate
#[test]
fn test_single_accelerometer_outlier_is_ignored() {
    let mut ahrs = Ahrs::with_settings(AhrsSettings {
        acceleration_rejection: 10.0,
        recovery_trigger_period: 50,
        ..Default::default()
    });
    for _ in 0..400 {
        ahrs.update_no_magnetometer(Vector3::zeros(), up(), DT);
    }
    let before = ahrs.quaternion();

    ahrs.update_no_magnetometer(Vector3::zeros(), Vector3::new(2.0, 2.0, 1.0), DT);

    assert!(ahrs.flags().acceleration_rejection);
    assert!(ahrs.internal_states().accelerometer_ignored);
    assert!(ahrs.quaternion().angle_to(&before) < 1e-5);

    // The next good sample clears the counter
    ahrs.update_no_magnetometer(Vector3::zeros(), up(), DT);
    assert!(!ahrs.flags().acceleration_rejection);
    assert_eq!(ahrs.internal_states().acceleration_recovery_trigger, 0);
}

/// A sustained outlier is force-applied once the recovery period elapses
#[test]
fn test_sustained_outlier_forces_recovery() {
    let period = 50;
    let mut ahrs = Ahrs::with_settings(AhrsSettings {
        acceleration_rejection: 10.0,
        recovery_trigger_period: period,
        ..Default::default()
    });
    for _ in 0..400 {
        ahrs.update_no_magnetometer(Vector3::zeros(), up(), DT);
    }
    let large_accel = Vector3::new(2.0, 2.0, 1.0);

    for _ in 0..period {
        ahrs.update_no_magnetometer(Vector3::zeros(), large_accel, DT);
        assert!(ahrs.flags().acceleration_rejection);
    }
    assert_eq!(ahrs.internal_states().acceleration_recovery_trigger, period);
    let before = ahrs.quaternion();

    ahrs.update_no_magnetometer(Vector3::zeros(), large_accel, DT);
    let flags = ahrs.flags();
    assert!(!flags.acceleration_rejection);
    assert!(flags.acceleration_recovery);
    assert_eq!(ahrs.internal_states().acceleration_recovery_trigger, 0);
    assert!(ahrs.quaternion().angle_to(&before) > 1e-4);

    // Still an outlier, so the cycle starts over
    ahrs.update_no_magnetometer(Vector3::zeros(), large_accel, DT);
    assert!(ahrs.flags().acceleration_rejection);
    assert_eq!(ahrs.internal_states().acceleration_recovery_trigger, 1);
}

/// Magnetic interference is rejected like accelerometer outliers
#[test]
fn test_magnetometer_rejection() {
    let mut ahrs = Ahrs::with_settings(AhrsSettings {
        magnetic_rejection: 10.0,
        recovery_trigger_period: 50,
        ..Default::default()
    });
    for _ in 0..400 {
        ahrs.update(Vector3::zeros(), up(), north(), DT);
    }

    // East instead of north: 90° heading error
    let interfered_mag = Vector3::new(0.0, 1.0, 0.0);
    for expected in 1..=10 {
        ahrs.update(Vector3::zeros(), up(), interfered_mag, DT);
        let states = ahrs.internal_states();
        assert!(states.magnetometer_ignored);
        assert_eq!(states.magnetic_recovery_trigger, expected);
        assert!((states.magnetic_error - 90.0).abs() < 0.1);
    }
    assert!(!ahrs.flags().acceleration_rejection);
    assert!(ahrs.quaternion().angle() < 1e-5);
}

/// Magnetometer correction never changes roll or pitch
#[test]
fn test_magnetometer_corrects_heading_only() {
    let mut ahrs = Ahrs::new();
    for _ in 0..400 {
        ahrs.update_no_magnetometer(Vector3::zeros(), up(), DT);
    }

    // Field with inclination, pointing 30° away from north
    let heading = 30.0_f32.to_radians();
    let magnetometer = Vector3::new(heading.cos(), -heading.sin(), -1.5);
    for _ in 0..2000 {
        ahrs.update(Vector3::zeros(), up(), magnetometer, DT);
        let euler = ahrs.quaternion().to_euler_degrees();
        assert!(euler.x.abs() < 1e-3 && euler.y.abs() < 1e-3);
    }

    let yaw = ahrs.quaternion().to_euler_degrees().z;
    assert!((yaw - 30.0).abs() < 0.5, "yaw {}", yaw);
}

/// A rejected accelerometer sample cannot tilt the estimate through the
/// magnetometer correction
#[test]
fn test_rejected_accelerometer_does_not_leak_through_magnetometer() {
    let mut ahrs = Ahrs::with_settings(AhrsSettings {
        acceleration_rejection: 10.0,
        recovery_trigger_period: 50,
        ..Default::default()
    });
    for _ in 0..400 {
        ahrs.update(Vector3::zeros(), up(), north(), DT);
    }
    let before = ahrs.quaternion();

    // 40° about x, well beyond the rejection threshold
    let tilt = UnitQuaternion::from_euler_degrees(40.0, 0.0, 0.0);
    let tilted_accel = tilt.inverse_transform_vector(&up());
    let magnetometer = Vector3::new(1.0, 0.0, -0.8);
    for _ in 0..21 {
        ahrs.update(Vector3::zeros(), tilted_accel, magnetometer, DT);

        let states = ahrs.internal_states();
        assert!(states.accelerometer_ignored);
        assert!(!states.magnetometer_ignored);
        assert!(states.magnetic_error < 1e-3, "magnetic error {}", states.magnetic_error);
    }

    assert!(ahrs.quaternion().angle_to(&before) < 1e-5);
    let euler = ahrs.quaternion().to_euler_degrees();
    assert!(euler.x.abs() < 1e-3 && euler.y.abs() < 1e-3);
}

/// With a disturbed accelerometer that is still applied, the magnetometer
/// only ever moves heading
#[test]
fn test_magnetometer_heading_correction_with_disturbed_accelerometer() {
    let settings = AhrsSettings {
        acceleration_rejection: 0.0,
        ..Default::default()
    };
    let disturbed = UnitQuaternion::from_euler_degrees(15.0, 0.0, 0.0).inverse_transform_vector(&up());
    let heading = 30.0_f32.to_radians();
    let magnetometer = Vector3::new(heading.cos(), -heading.sin(), -1.5);

    let mut with_mag = Ahrs::with_settings(settings);
    let mut without_mag = Ahrs::with_settings(settings);
    for _ in 0..400 {
        with_mag.update_no_magnetometer(Vector3::zeros(), up(), DT);
        without_mag.update_no_magnetometer(Vector3::zeros(), up(), DT);
    }

    for _ in 0..200 {
        with_mag.update(Vector3::zeros(), disturbed, magnetometer, DT);
        without_mag.update_no_magnetometer(Vector3::zeros(), disturbed, DT);
    }

    // Tilt is driven by the accelerometer alone
    let tilted = with_mag.quaternion().inverse_transform_vector(&up());
    let reference = without_mag.quaternion().inverse_transform_vector(&up());
    assert!((tilted - reference).norm() < 5e-3, "{:?} vs {:?}", tilted, reference);
}

/// Zero thresholds disable rejection entirely
#[test]
fn test_zero_threshold_disables_rejection() {
    let mut ahrs = Ahrs::with_settings(AhrsSettings {
        acceleration_rejection: 0.0,
        magnetic_rejection: 0.0,
        recovery_trigger_period: 10,
        ..Default::default()
    });
    for _ in 0..400 {
        ahrs.update(Vector3::zeros(), up(), north(), DT);
    }
    for _ in 0..50 {
        ahrs.update(Vector3::zeros(), Vector3::new(1.0, 1.0, 0.2), Vector3::new(0.0, 1.0, 0.0), DT);
        let flags = ahrs.flags();
        assert!(!flags.acceleration_rejection && !flags.magnetic_rejection);
        assert!(!flags.acceleration_recovery && !flags.magnetic_recovery);
    }
}

/// Linear acceleration is zero when the accelerometer matches prediction
#[test]
fn test_linear_acceleration() {
    let mut ahrs = Ahrs::new();
    let orientation = UnitQuaternion::from_euler_degrees(10.0, 5.0, 40.0);
    ahrs.set_quaternion(orientation);

    let accel = orientation.inverse_transform_vector(&up());
    ahrs.update_no_magnetometer(Vector3::zeros(), accel, DT);
    assert!(ahrs.linear_acceleration().norm() < EPSILON);
    assert!(ahrs.earth_acceleration().norm() < EPSILON);

    // 0.5 g forward in the body frame shows up in both outputs
    let forward = Vector3::new(0.5, 0.0, 0.0);
    let mut level = Ahrs::new();
    level.update_no_magnetometer(Vector3::zeros(), up() + forward, DT);
    assert!((level.linear_acceleration() - forward).norm() < 1e-5);
    let expected_earth = level.quaternion() * forward;
    assert!((level.earth_acceleration() - expected_earth).norm() < 1e-5);
}

/// Gravity output is standard gravity along the body's down direction
#[test]
fn test_gravity_output() {
    let mut ahrs = Ahrs::new();
    for _ in 0..10 {
        ahrs.update_no_magnetometer(Vector3::zeros(), up(), DT);
    }
    let gravity = ahrs.gravity();
    assert!((gravity.norm() - STANDARD_GRAVITY).abs() < 1e-4);
    assert!((gravity.z + STANDARD_GRAVITY).abs() < 1e-4);
}

/// Gyroscope saturation restarts initialisation but keeps the orientation
#[test]
fn test_gyroscope_overflow() {
    let mut ahrs = Ahrs::with_settings(AhrsSettings {
        gyroscope_range: 500.0,
        ..Default::default()
    });
    for _ in 0..400 {
        ahrs.update(Vector3::zeros(), up(), north(), DT);
    }
    assert!(!ahrs.flags().initialising);

    // 495 deg/s is above 98% of the range
    ahrs.update(Vector3::new(0.0, 0.0, 495.0), up(), north(), DT);
    assert!(ahrs.flags().angular_rate_recovery);
    assert!(ahrs.flags().initialising);
    assert!(ahrs.quaternion().angle() > 4.0_f32.to_radians());
}

/// Reset returns to the constructed state whatever happened before
#[test]
fn test_reset_after_history() {
    let mut ahrs = Ahrs::with_settings(AhrsSettings {
        acceleration_rejection: 5.0,
        magnetic_rejection: 5.0,
        recovery_trigger_period: 1000,
        ..Default::default()
    });
    for i in 0..600 {
        let t = i as f32 * DT;
        ahrs.update(
            Vector3::new(30.0 * t.sin(), 10.0, -20.0),
            Vector3::new(t.cos(), 0.5, 0.3),
            Vector3::new(0.2, t.sin(), -0.4),
            DT,
        );
    }

    ahrs.reset();
    assert_eq!(ahrs.quaternion(), UnitQuaternion::identity());
    let flags = ahrs.flags();
    assert!(flags.initialising);
    assert!(!flags.angular_rate_recovery);
    let states = ahrs.internal_states();
    assert_eq!(states.acceleration_recovery_trigger, 0);
    assert_eq!(states.magnetic_recovery_trigger, 0);
    assert_eq!(ahrs.linear_acceleration(), Vector3::zeros());
}

/// Settings round trip; replacing them keeps orientation and counters
#[test]
fn test_settings_round_trip() {
    let settings = AhrsSettings {
        convention: Convention::Nwu,
        gain: 0.7,
        gyroscope_range: 1000.0,
        acceleration_rejection: 12.5,
        magnetic_rejection: 20.0,
        recovery_trigger_period: 300,
        initial_gain: 8.0,
        initialisation_period: 2.0,
    };
    let mut ahrs = Ahrs::new();
    ahrs.set_settings(settings);

    for _ in 0..300 {
        ahrs.update(Vector3::zeros(), up(), north(), DT);
    }
    for _ in 0..7 {
        ahrs.update_no_magnetometer(Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0), DT);
    }
    assert_eq!(ahrs.settings(), settings);
    assert_eq!(ahrs.internal_states().acceleration_recovery_trigger, 7);

    let quaternion = ahrs.quaternion();
    ahrs.set_settings(AhrsSettings {
        acceleration_rejection: 45.0,
        ..settings
    });
    assert_eq!(ahrs.quaternion(), quaternion);
    assert_eq!(ahrs.internal_states().acceleration_recovery_trigger, 7);

    // 90° error is still beyond the new 45° threshold
    ahrs.update_no_magnetometer(Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0), DT);
    assert_eq!(ahrs.internal_states().acceleration_recovery_trigger, 8);

    // 30° error is within it
    let thirty = Vector3::new(0.5, 0.0, 0.866);
    ahrs.update_no_magnetometer(Vector3::zeros(), thirty, DT);
    assert!(!ahrs.flags().acceleration_rejection);
}

/// Yaw drifts under gyro bias unless the offset estimator removes it
#[test]
fn test_offset_estimator_stops_yaw_drift() {
    let bias = Vector3::new(0.0, 0.0, 0.5);
    let samples = 6000; // 60 s at 100 Hz

    let mut ahrs = Ahrs::new();
    for _ in 0..samples {
        ahrs.update_no_magnetometer(bias, up(), DT);
    }
    let drift = ahrs.quaternion().to_euler_degrees().z;
    assert!((drift - 30.0).abs() < 0.5, "uncorrected drift {}", drift);

    let mut stream = SensorStream::with_settings(
        AhrsSettings::default(),
        OffsetSettings::default(),
        100.0,
    );
    for _ in 0..samples {
        stream.update_no_magnetometer(bias, up(), DT);
    }
    let corrected_drift = stream.quaternion().to_euler_degrees().z;
    assert!(corrected_drift.abs() < drift.abs() / 2.0);
    assert!((stream.offset().offset() - bias).norm() < 0.01);

    // Yaw no longer moves once the bias has been learnt
    let settled_yaw = corrected_drift;
    for _ in 0..1000 {
        stream.update_no_magnetometer(bias, up(), DT);
    }
    let later_yaw = stream.quaternion().to_euler_degrees().z;
    assert!((later_yaw - settled_yaw).abs() < 0.05);
}
