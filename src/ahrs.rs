//! Attitude filter
//!
//! A complementary filter that integrates gyroscope angular rate into a unit
//! quaternion and pulls it toward the gravity direction measured by the
//! accelerometer and the heading measured by the magnetometer using
//! proportional feedback.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::math::{Vector3Ext, try_normalize_quaternion};
use crate::types::{AhrsFlags, AhrsInternalStates, AhrsSettings, STANDARD_GRAVITY};

/// Fraction of the gyroscope range above which a reading counts as saturated
const GYROSCOPE_RANGE_FACTOR: f32 = 0.98;

/// Rejection and recovery bookkeeping for one reference sensor
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct Rejection {
    /// Last error angle in degrees
    error: f32,
    /// Feedback was skipped by rejection on the last update
    ignored: bool,
    /// Consecutive rejected samples
    recovery_trigger: u32,
    /// Feedback was force-applied on the last update
    recovered: bool,
}

impl Rejection {
    /// Decide whether feedback with the given error is applied this update
    fn accept(
        &mut self,
        error: f32,
        threshold: f32,
        recovery_trigger_period: u32,
        initialising: bool,
    ) -> bool {
        self.error = error;
        self.recovered = false;

        let outlier = !initialising && threshold > 0.0 && error > threshold;
        if !outlier {
            self.ignored = false;
            self.recovery_trigger = 0;
            return true;
        }

        self.recovery_trigger = self.recovery_trigger.saturating_add(1);
        if self.recovery_trigger > recovery_trigger_period {
            self.recovery_trigger = 0;
            self.ignored = false;
            self.recovered = true;
            return true;
        }

        self.ignored = true;
        false
    }

    /// The sensor gave no usable direction this update; the counter is kept
    fn skip(&mut self) {
        self.error = 0.0;
        self.ignored = false;
        self.recovered = false;
    }
}

/// Attitude and heading reference filter
///
/// Features automatic sensor rejection during motion or magnetic
/// interference, bounded recovery from sustained rejection, and a gain ramp
/// that converges quickly after start, reset or gyroscope saturation.
///
/// The filter never returns an error. Degenerate input (zero or non-finite
/// vectors, non-positive time steps) skips the affected correction instead
/// of corrupting the orientation.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use fusion_stream::Ahrs;
///
/// let mut ahrs = Ahrs::new();
/// ahrs.update_no_magnetometer(Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0), 0.01);
///
/// let norm = ahrs.quaternion().into_inner().norm();
/// assert!((norm - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ahrs {
    /// Algorithm settings
    settings: AhrsSettings,
    /// Current orientation, body frame to earth frame
    quaternion: UnitQuaternion<f32>,
    /// Whether the gain is still ramping down
    initialising: bool,
    /// Seconds of supplied time since initialisation started
    initialisation_timer: f32,
    /// Gain used while initialising
    ramped_gain: f32,
    /// Initialisation was restarted by gyroscope saturation
    angular_rate_recovery: bool,
    /// Accelerometer rejection state
    acceleration: Rejection,
    /// Magnetometer rejection state
    magnetic: Rejection,
    /// Accelerometer minus predicted gravity direction, in g
    linear_acceleration: Vector3<f32>,
    /// Linear acceleration in the earth frame, in g
    earth_acceleration: Vector3<f32>,
    /// Gravity in the body frame, in m/s²
    gravity: Vector3<f32>,
}

impl Ahrs {
    /// Create a filter with default settings
    pub fn new() -> Self {
        Self::with_settings(AhrsSettings::default())
    }

    /// Create a filter with the given settings
    pub fn with_settings(settings: AhrsSettings) -> Self {
        let mut ahrs = Ahrs {
            settings,
            quaternion: UnitQuaternion::identity(),
            initialising: true,
            initialisation_timer: 0.0,
            ramped_gain: settings.initial_gain,
            angular_rate_recovery: false,
            acceleration: Rejection::default(),
            magnetic: Rejection::default(),
            linear_acceleration: Vector3::zeros(),
            earth_acceleration: Vector3::zeros(),
            gravity: Vector3::zeros(),
        };
        ahrs.reset();
        ahrs
    }

    /// Return to the initial state, keeping the settings
    ///
    /// The orientation becomes identity, initialisation restarts and all
    /// rejection counters are cleared.
    pub fn reset(&mut self) {
        self.quaternion = UnitQuaternion::identity();
        self.restart_initialisation();
        self.angular_rate_recovery = false;
        self.acceleration = Rejection::default();
        self.magnetic = Rejection::default();
        self.linear_acceleration = Vector3::zeros();
        self.earth_acceleration = Vector3::zeros();
        self.gravity = -self.predicted_up() * STANDARD_GRAVITY;
    }

    /// Replace the settings
    ///
    /// Takes effect on the next update. The orientation and rejection
    /// counters are left as they are.
    pub fn set_settings(&mut self, settings: AhrsSettings) {
        self.settings = settings;
    }

    /// Current settings
    pub fn settings(&self) -> AhrsSettings {
        self.settings
    }

    /// Update with gyroscope, accelerometer and magnetometer
    ///
    /// # Arguments
    /// * `gyroscope` - Offset-corrected angular rate in degrees per second
    /// * `accelerometer` - Specific force in g
    /// * `magnetometer` - Magnetic field in any consistent unit
    /// * `delta_time` - Time since the previous sample in seconds
    pub fn update(
        &mut self,
        gyroscope: Vector3<f32>,
        accelerometer: Vector3<f32>,
        magnetometer: Vector3<f32>,
        delta_time: f32,
    ) {
        self.update_internal(gyroscope, accelerometer, Some(magnetometer), delta_time);
    }

    /// Update without magnetometer
    ///
    /// Heading is then only as accurate as the starting orientation and
    /// the gyroscope integration.
    pub fn update_no_magnetometer(
        &mut self,
        gyroscope: Vector3<f32>,
        accelerometer: Vector3<f32>,
        delta_time: f32,
    ) {
        self.update_internal(gyroscope, accelerometer, None, delta_time);
    }

    /// Current orientation, body frame to earth frame
    pub fn quaternion(&self) -> UnitQuaternion<f32> {
        self.quaternion
    }

    /// Overwrite the orientation, e.g. when restoring saved state
    pub fn set_quaternion(&mut self, quaternion: UnitQuaternion<f32>) {
        self.quaternion = quaternion;
    }

    /// Gravity in the body frame in m/s², from the last update
    pub fn gravity(&self) -> Vector3<f32> {
        self.gravity
    }

    /// Accelerometer minus gravity in g, body frame, from the last update
    pub fn linear_acceleration(&self) -> Vector3<f32> {
        self.linear_acceleration
    }

    /// Linear acceleration in g rotated into the earth frame, from the last
    /// update
    pub fn earth_acceleration(&self) -> Vector3<f32> {
        self.earth_acceleration
    }

    /// Diagnostic snapshot of the rejection state
    pub fn internal_states(&self) -> AhrsInternalStates {
        AhrsInternalStates {
            acceleration_error: self.acceleration.error,
            accelerometer_ignored: self.acceleration.ignored,
            acceleration_recovery_trigger: self.acceleration.recovery_trigger,
            magnetic_error: self.magnetic.error,
            magnetometer_ignored: self.magnetic.ignored,
            magnetic_recovery_trigger: self.magnetic.recovery_trigger,
        }
    }

    /// Operating flags
    pub fn flags(&self) -> AhrsFlags {
        AhrsFlags {
            initialising: self.initialising,
            angular_rate_recovery: self.angular_rate_recovery,
            acceleration_rejection: self.acceleration.ignored,
            magnetic_rejection: self.magnetic.ignored,
            acceleration_recovery: self.acceleration.recovered,
            magnetic_recovery: self.magnetic.recovered,
        }
    }

    fn update_internal(
        &mut self,
        gyroscope: Vector3<f32>,
        accelerometer: Vector3<f32>,
        magnetometer: Option<Vector3<f32>>,
        delta_time: f32,
    ) {
        // Nothing can be integrated; keep the state and refresh the outputs
        if !delta_time.is_finite() || delta_time <= 0.0 || !gyroscope.all_finite() {
            self.acceleration.skip();
            self.magnetic.skip();
            let up = self.predicted_up();
            self.cache_outputs(accelerometer, up);
            return;
        }

        if self.is_saturated(&gyroscope) {
            if !self.angular_rate_recovery {
                log_warn!("gyroscope saturated, restarting initialisation");
            }
            self.angular_rate_recovery = true;
            self.restart_initialisation();
        }

        let gain = self.step_gain(delta_time);
        let convention = self.settings.convention;
        let up = self.predicted_up();
        let mut feedback = Vector3::zeros();

        match accelerometer.try_normalize_finite() {
            Some(direction) => {
                let error = direction.angle_degrees(&up);
                if self.acceleration.accept(
                    error,
                    self.settings.acceleration_rejection,
                    self.settings.recovery_trigger_period,
                    self.initialising,
                ) {
                    feedback += Self::feedback(&direction, &up);
                }
                if self.acceleration.recovered {
                    log_debug!("accelerometer recovery forced, error {}", error);
                }
            }
            None => self.acceleration.skip(),
        }

        if let Some(magnetometer) = magnetometer {
            // Both west vectors are orthogonal to the predicted up, so the
            // feedback lies along up and only corrects heading
            let measured_west = up.cross(&magnetometer).try_normalize_finite();
            match measured_west {
                Some(west) => {
                    let predicted_west = self.quaternion.inverse_transform_vector(&convention.west());
                    let error = west.angle_degrees(&predicted_west);
                    if self.magnetic.accept(
                        error,
                        self.settings.magnetic_rejection,
                        self.settings.recovery_trigger_period,
                        self.initialising,
                    ) {
                        feedback += Self::feedback(&west, &predicted_west);
                    }
                    if self.magnetic.recovered {
                        log_debug!("magnetometer recovery forced, error {}", error);
                    }
                }
                None => self.magnetic.skip(),
            }
        } else {
            self.magnetic.skip();
        }

        let angular_rate = gyroscope.deg_to_rad() + feedback * gain;
        self.integrate_quaternion(angular_rate, delta_time);
        self.cache_outputs(accelerometer, up);
    }

    /// Advance the initialisation ramp and return the gain for this update
    fn step_gain(&mut self, delta_time: f32) -> f32 {
        if !self.initialising {
            return self.settings.gain;
        }

        self.initialisation_timer += delta_time;
        let period = self.settings.initialisation_period;
        if period.is_nan() || period <= 0.0 || self.initialisation_timer >= period {
            self.initialising = false;
            self.angular_rate_recovery = false;
            self.ramped_gain = self.settings.gain;
            log_info!("initialisation complete");
            return self.settings.gain;
        }

        let progress = self.initialisation_timer / period;
        self.ramped_gain =
            self.settings.initial_gain + (self.settings.gain - self.settings.initial_gain) * progress;
        self.ramped_gain
    }

    fn restart_initialisation(&mut self) {
        self.initialising = true;
        self.initialisation_timer = 0.0;
        self.ramped_gain = self.settings.initial_gain;
    }

    fn is_saturated(&self, gyroscope: &Vector3<f32>) -> bool {
        let range = self.settings.gyroscope_range;
        if range.is_nan() || range <= 0.0 {
            return false;
        }
        let limit = range * GYROSCOPE_RANGE_FACTOR;
        gyroscope.iter().any(|rate| *rate > limit || *rate < -limit)
    }

    /// Direction a stationary accelerometer should read, in the body frame
    fn predicted_up(&self) -> Vector3<f32> {
        self.quaternion
            .inverse_transform_vector(&self.settings.convention.up())
    }

    /// Rotation axis from the measured toward the predicted direction
    fn feedback(sensor: &Vector3<f32>, reference: &Vector3<f32>) -> Vector3<f32> {
        let cross = sensor.cross(reference);

        // Past 90° the cross product shrinks again; keep full strength
        if sensor.dot(reference) < 0.0 {
            cross.safe_normalize()
        } else {
            cross
        }
    }

    /// First-order integration of dq/dt = 0.5 × q ⊗ [0, ω]
    fn integrate_quaternion(&mut self, angular_rate: Vector3<f32>, delta_time: f32) {
        let q = self.quaternion.into_inner();
        let derivative = q * Quaternion::from_imag(angular_rate * 0.5);
        let integrated = q + derivative * delta_time;

        self.quaternion = match try_normalize_quaternion(integrated) {
            Some(quaternion) => quaternion,
            None => {
                log_warn!("degenerate quaternion, falling back to identity");
                UnitQuaternion::identity()
            }
        };
    }

    fn cache_outputs(&mut self, accelerometer: Vector3<f32>, up: Vector3<f32>) {
        self.gravity = -up * STANDARD_GRAVITY;
        if accelerometer.all_finite() {
            self.linear_acceleration = accelerometer - up;
            self.earth_acceleration = self.quaternion * self.linear_acceleration;
        } else {
            self.linear_acceleration = Vector3::zeros();
            self.earth_acceleration = Vector3::zeros();
        }
    }
}

impl Default for Ahrs {
    fn default() -> Self {
        Self::new()
    }
}
