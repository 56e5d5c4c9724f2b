//! One sensor stream: offset estimator feeding an attitude filter
//!
//! Each physical IMU gets exactly one `SensorStream`. It owns its filter and
//! its bias estimate; nothing is shared between streams.

use nalgebra::{UnitQuaternion, Vector3};

use crate::ahrs::Ahrs;
use crate::error::ConfigError;
use crate::offset::Offset;
use crate::types::{AhrsFlags, AhrsInternalStates, AhrsSettings, OffsetSettings};

/// Sample rate assumed by [`SensorStream::default`]
pub const DEFAULT_SAMPLE_RATE: f32 = 100.0;

/// Gyroscope offset estimator and attitude filter for one IMU
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use fusion_stream::SensorStream;
///
/// let mut stream = SensorStream::new(100.0);
/// for _ in 0..100 {
///     stream.update_no_magnetometer(Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0), 0.01);
/// }
/// assert!(stream.flags().initialising);
/// ```
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorStream {
    ahrs: Ahrs,
    offset: Offset,
    sample_rate: f32,
}

impl SensorStream {
    /// Create a stream with default settings
    pub fn new(sample_rate: f32) -> Self {
        Self::with_settings(AhrsSettings::default(), OffsetSettings::default(), sample_rate)
    }

    /// Create a stream with explicit settings
    pub fn with_settings(
        ahrs_settings: AhrsSettings,
        offset_settings: OffsetSettings,
        sample_rate: f32,
    ) -> Self {
        Self {
            ahrs: Ahrs::with_settings(ahrs_settings),
            offset: Offset::new(offset_settings, sample_rate),
            sample_rate,
        }
    }

    /// Create a stream, rejecting unusable settings
    pub fn try_with_settings(
        ahrs_settings: AhrsSettings,
        offset_settings: OffsetSettings,
        sample_rate: f32,
    ) -> Result<Self, ConfigError> {
        ahrs_settings.validate()?;
        let offset = Offset::try_new(offset_settings, sample_rate)?;
        Ok(Self {
            ahrs: Ahrs::with_settings(ahrs_settings),
            offset,
            sample_rate,
        })
    }

    /// Remove the gyroscope offset, then update the filter with all sensors
    pub fn update(
        &mut self,
        gyroscope: Vector3<f32>,
        accelerometer: Vector3<f32>,
        magnetometer: Vector3<f32>,
        delta_time: f32,
    ) {
        let gyroscope = self.offset.update(gyroscope);
        self.ahrs.update(gyroscope, accelerometer, magnetometer, delta_time);
    }

    /// Remove the gyroscope offset, then update the filter without
    /// magnetometer
    pub fn update_no_magnetometer(
        &mut self,
        gyroscope: Vector3<f32>,
        accelerometer: Vector3<f32>,
        delta_time: f32,
    ) {
        let gyroscope = self.offset.update(gyroscope);
        self.ahrs.update_no_magnetometer(gyroscope, accelerometer, delta_time);
    }

    /// Reset the filter, keeping the learned gyroscope offset
    ///
    /// Relearning the offset takes several seconds of stillness, so it
    /// survives an orientation reset.
    pub fn reset(&mut self) {
        self.ahrs.reset();
    }

    /// Reset the filter and discard the gyroscope offset estimate
    pub fn reset_all(&mut self) {
        self.ahrs.reset();
        self.offset.reset();
    }

    /// Replace the filter settings
    pub fn set_settings(&mut self, settings: AhrsSettings) {
        self.ahrs.set_settings(settings);
    }

    /// Filter settings
    pub fn settings(&self) -> AhrsSettings {
        self.ahrs.settings()
    }

    /// Current orientation
    pub fn quaternion(&self) -> UnitQuaternion<f32> {
        self.ahrs.quaternion()
    }

    /// Linear acceleration in g, body frame
    pub fn linear_acceleration(&self) -> Vector3<f32> {
        self.ahrs.linear_acceleration()
    }

    /// Linear acceleration in g, earth frame
    pub fn earth_acceleration(&self) -> Vector3<f32> {
        self.ahrs.earth_acceleration()
    }

    /// Gravity in m/s², body frame
    pub fn gravity(&self) -> Vector3<f32> {
        self.ahrs.gravity()
    }

    /// Filter flags from the last update
    pub fn flags(&self) -> AhrsFlags {
        self.ahrs.flags()
    }

    /// Filter diagnostics from the last update
    pub fn internal_states(&self) -> AhrsInternalStates {
        self.ahrs.internal_states()
    }

    /// The attitude filter
    pub fn ahrs(&self) -> &Ahrs {
        &self.ahrs
    }

    /// Mutable access to the attitude filter, e.g. to restore an orientation
    pub fn ahrs_mut(&mut self) -> &mut Ahrs {
        &mut self.ahrs
    }

    /// The gyroscope offset estimator
    pub fn offset(&self) -> &Offset {
        &self.offset
    }

    /// Mutable access to the offset estimator, e.g. to restore a bias
    pub fn offset_mut(&mut self) -> &mut Offset {
        &mut self.offset
    }

    /// Sample rate in Hz the offset estimator was built for
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

impl Default for SensorStream {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}
