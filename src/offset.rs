//! Gyroscope offset estimation
//!
//! Tracks the slowly drifting gyroscope bias while the sensor is still and
//! subtracts it from every reading before the reading reaches the attitude
//! filter.

use nalgebra::Vector3;

use crate::error::ConfigError;
use crate::math::Vector3Ext;
use crate::types::OffsetSettings;

/// Gyroscope offset estimator
///
/// Uses a first-order low-pass filter to pull the bias estimate toward the
/// raw reading once the sensor has been still for the configured timeout.
/// Any motion freezes the estimate and restarts the stillness timer, so a
/// body that never stops rotating keeps its last estimate.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Offset {
    /// Settings the derived values were computed from
    settings: OffsetSettings,
    /// Filter coefficient for offset estimation
    filter_coefficient: f32,
    /// Stillness timeout in samples
    timeout: u32,
    /// Samples the sensor has been still, saturating at `timeout`
    timer: u32,
    /// Estimated gyroscope offset
    gyroscope_offset: Vector3<f32>,
}

impl Offset {
    /// Create an offset estimator for the given sample rate
    ///
    /// An unusable sample rate produces an estimator that never adapts.
    /// Use [`Offset::try_new`] to get an error instead.
    ///
    /// # Example
    /// ```
    /// use fusion_stream::{Offset, OffsetSettings};
    ///
    /// let offset = Offset::new(OffsetSettings::default(), 100.0);
    /// assert_eq!(offset.timeout(), 500);
    /// ```
    pub fn new(settings: OffsetSettings, sample_rate: f32) -> Self {
        let mut offset = Self {
            settings,
            filter_coefficient: 0.0,
            timeout: 0,
            timer: 0,
            gyroscope_offset: Vector3::zeros(),
        };

        if sample_rate.is_finite() && sample_rate > 0.0 {
            // filterCoefficient = 2π × fc / fs
            offset.filter_coefficient =
                2.0 * core::f32::consts::PI * settings.cutoff_frequency / sample_rate;
            offset.timeout = (settings.timeout * sample_rate) as u32;
        } else {
            log_warn!("invalid sample rate {}, offset estimation disabled", sample_rate);
        }

        offset
    }

    /// Create an offset estimator, rejecting unusable settings
    ///
    /// # Example
    /// ```
    /// use fusion_stream::{ConfigError, Offset, OffsetSettings};
    ///
    /// let result = Offset::try_new(OffsetSettings::default(), 0.0);
    /// assert_eq!(result.unwrap_err(), ConfigError::InvalidSampleRate);
    /// ```
    pub fn try_new(settings: OffsetSettings, sample_rate: f32) -> Result<Self, ConfigError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        settings.validate()?;
        Ok(Self::new(settings, sample_rate))
    }

    /// Update offset estimation and return corrected gyroscope reading
    ///
    /// # Arguments
    /// * `gyroscope` - Raw gyroscope reading in degrees per second
    ///
    /// # Returns
    /// Gyroscope reading minus the current offset estimate
    ///
    /// # Example
    /// ```
    /// use nalgebra::Vector3;
    /// use fusion_stream::{Offset, OffsetSettings};
    ///
    /// let mut offset = Offset::new(OffsetSettings::default(), 100.0);
    /// let corrected = offset.update(Vector3::new(0.1, 0.2, 0.3));
    /// assert_eq!(corrected, Vector3::new(0.1, 0.2, 0.3));
    /// ```
    pub fn update(&mut self, gyroscope: Vector3<f32>) -> Vector3<f32> {
        let corrected_gyroscope = gyroscope - self.gyroscope_offset;

        // NaN fails every comparison below, so it has to be caught first
        if !corrected_gyroscope.all_finite() || !self.is_still(&corrected_gyroscope) {
            self.timer = 0;
            return corrected_gyroscope;
        }

        if self.timer < self.timeout {
            self.timer += 1;
            return corrected_gyroscope;
        }

        // offset_new = offset_old + α × gyroscope_corrected
        self.gyroscope_offset += corrected_gyroscope * self.filter_coefficient;

        corrected_gyroscope
    }

    /// Current offset estimate in degrees per second
    pub fn offset(&self) -> Vector3<f32> {
        self.gyroscope_offset
    }

    /// Restore a previously estimated offset
    ///
    /// The stillness timer is left untouched.
    pub fn set_offset(&mut self, offset: Vector3<f32>) {
        self.gyroscope_offset = offset;
    }

    /// Reset the estimate and stillness timer
    pub fn reset(&mut self) {
        self.timer = 0;
        self.gyroscope_offset = Vector3::zeros();
    }

    /// True once the sensor has been still for the whole timeout and the
    /// estimate is adapting
    pub fn is_active(&self) -> bool {
        self.timer >= self.timeout
    }

    /// Number of samples the sensor has been still
    pub fn timer(&self) -> u32 {
        self.timer
    }

    /// Low-pass filter coefficient used for offset updates
    pub fn filter_coefficient(&self) -> f32 {
        self.filter_coefficient
    }

    /// Number of still samples required before estimation begins
    pub fn timeout(&self) -> u32 {
        self.timeout
    }

    /// Settings this estimator was built with
    pub fn settings(&self) -> OffsetSettings {
        self.settings
    }

    fn is_still(&self, corrected_gyroscope: &Vector3<f32>) -> bool {
        let threshold = self.settings.threshold;
        corrected_gyroscope
            .iter()
            .all(|rate| *rate <= threshold && *rate >= -threshold)
    }
}

impl Default for Offset {
    fn default() -> Self {
        Self::new(OffsetSettings::default(), 100.0)
    }
}
