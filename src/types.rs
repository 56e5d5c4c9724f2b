//! Core types and conventions for the attitude filter

use nalgebra::Vector3;

use crate::error::ConfigError;

/// Standard gravity in m/s², used to scale the body-frame gravity output
pub const STANDARD_GRAVITY: f32 = 9.80665;

/// Earth axes convention
///
/// Defines the coordinate system used for Earth-relative calculations.
/// Each convention is a fixed table of earth-frame reference directions:
/// the direction an accelerometer at rest reads ("up"), and the horizontal
/// direction of `accelerometer × magnetometer` ("west").
///
/// # Conventions
/// - **NWU**: North-West-Up (X=North, Y=West, Z=Up)
/// - **ENU**: East-North-Up (X=East, Y=North, Z=Up)
/// - **NED**: North-East-Down (X=North, Y=East, Z=Down)
///
/// # Example
/// ```
/// use fusion_stream::{Convention, Ahrs, AhrsSettings};
///
/// let settings = AhrsSettings {
///     convention: Convention::Enu,
///     ..Default::default()
/// };
/// let ahrs = Ahrs::with_settings(settings);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Convention {
    /// North-West-Up coordinate system
    #[default]
    Nwu,
    /// East-North-Up coordinate system
    Enu,
    /// North-East-Down coordinate system
    Ned,
}

impl Convention {
    /// Unit vector, in earth axes, that a stationary accelerometer measures
    pub fn up(self) -> Vector3<f32> {
        match self {
            Convention::Nwu | Convention::Enu => Vector3::new(0.0, 0.0, 1.0),
            Convention::Ned => Vector3::new(0.0, 0.0, -1.0),
        }
    }

    /// Unit vector, in earth axes, pointing west
    pub fn west(self) -> Vector3<f32> {
        match self {
            Convention::Nwu => Vector3::new(0.0, 1.0, 0.0),
            Convention::Enu => Vector3::new(-1.0, 0.0, 0.0),
            Convention::Ned => Vector3::new(0.0, -1.0, 0.0),
        }
    }
}

/// Attitude filter settings
///
/// Every field may be changed between updates with
/// [`Ahrs::set_settings`](crate::Ahrs::set_settings); the new values apply
/// from the next update. Nothing is rejected: zero thresholds disable the
/// corresponding feature rather than being treated as errors.
///
/// # Example
/// ```
/// use fusion_stream::{AhrsSettings, Convention};
///
/// let settings = AhrsSettings {
///     convention: Convention::Enu,
///     gain: 0.25,
///     gyroscope_range: 1000.0,
///     acceleration_rejection: 15.0,
///     magnetic_rejection: 30.0,
///     recovery_trigger_period: 1024,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AhrsSettings {
    /// Earth axes convention (NWU, ENU, or NED)
    pub convention: Convention,
    /// Proportional feedback gain (typically 0.5)
    ///
    /// Higher values trust the accelerometer and magnetometer more,
    /// lower values trust the gyroscope more.
    pub gain: f32,
    /// Gyroscope range in degrees per second
    ///
    /// A reading above 98% of this range on any axis is treated as
    /// saturation and restarts initialisation. Set to 0 to disable.
    pub gyroscope_range: f32,
    /// Acceleration rejection threshold in degrees
    ///
    /// Accelerometer samples whose direction disagrees with the predicted
    /// gravity direction by more than this angle are not applied.
    /// Set to 0 to disable.
    pub acceleration_rejection: f32,
    /// Magnetic rejection threshold in degrees
    ///
    /// Same as `acceleration_rejection`, for the magnetometer heading
    /// error. Set to 0 to disable.
    pub magnetic_rejection: f32,
    /// Recovery trigger period in samples
    ///
    /// Number of consecutive rejected samples after which the sensor is
    /// force-applied once and its counter restarts.
    pub recovery_trigger_period: u32,
    /// Gain used at the start of initialisation
    pub initial_gain: f32,
    /// Duration in seconds over which the gain ramps from `initial_gain`
    /// down to `gain`
    pub initialisation_period: f32,
}

impl AhrsSettings {
    /// Settings tuned for fast motion such as head tracking
    ///
    /// Trusts the gyroscope more and tolerates larger transient errors
    /// before rejecting a sensor.
    pub fn fast_motion() -> Self {
        Self {
            convention: Convention::Enu,
            gain: 0.3,
            gyroscope_range: 2000.0,
            acceleration_rejection: 15.0,
            magnetic_rejection: 15.0,
            recovery_trigger_period: 150,
            ..Self::default()
        }
    }

    /// Checks the fields that the validated constructors rely on
    ///
    /// The filter accepts any settings at runtime; this is for callers that
    /// load settings from an external source and want to catch mistakes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initialisation_period.is_finite() || self.initialisation_period < 0.0 {
            return Err(ConfigError::InvalidInitialisationPeriod);
        }
        Ok(())
    }
}

impl Default for AhrsSettings {
    fn default() -> Self {
        Self {
            convention: Convention::default(),
            gain: 0.5,
            gyroscope_range: 0.0,
            acceleration_rejection: 90.0,
            magnetic_rejection: 90.0,
            recovery_trigger_period: 0,
            initial_gain: 10.0,
            initialisation_period: 3.0,
        }
    }
}

/// Attitude filter internal states
///
/// Diagnostic snapshot of the last update.
///
/// # Example
/// ```
/// use fusion_stream::Ahrs;
///
/// let ahrs = Ahrs::new();
/// let states = ahrs.internal_states();
///
/// assert!(!states.accelerometer_ignored);
/// assert_eq!(states.acceleration_recovery_trigger, 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AhrsInternalStates {
    /// Angle in degrees between measured and predicted gravity direction
    pub acceleration_error: f32,
    /// Accelerometer feedback was skipped on the last update by rejection
    pub accelerometer_ignored: bool,
    /// Consecutive rejected accelerometer samples
    pub acceleration_recovery_trigger: u32,
    /// Angle in degrees between measured and predicted heading reference
    pub magnetic_error: f32,
    /// Magnetometer feedback was skipped on the last update by rejection
    pub magnetometer_ignored: bool,
    /// Consecutive rejected magnetometer samples
    pub magnetic_recovery_trigger: u32,
}

/// Attitude filter flags
///
/// # Example
/// ```
/// use fusion_stream::Ahrs;
///
/// let ahrs = Ahrs::new();
/// let flags = ahrs.flags();
///
/// if flags.initialising {
///     // still converging with the ramped gain
/// }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AhrsFlags {
    /// The gain is still ramping down after start, reset or saturation
    pub initialising: bool,
    /// Initialisation was restarted by gyroscope saturation
    pub angular_rate_recovery: bool,
    /// Accelerometer feedback was rejected on the last update
    pub acceleration_rejection: bool,
    /// Magnetometer feedback was rejected on the last update
    pub magnetic_rejection: bool,
    /// Accelerometer feedback was force-applied on the last update
    pub acceleration_recovery: bool,
    /// Magnetometer feedback was force-applied on the last update
    pub magnetic_recovery: bool,
}

/// Gyroscope offset estimator settings
///
/// # Example
/// ```
/// use fusion_stream::OffsetSettings;
///
/// let settings = OffsetSettings {
///     timeout: 10.0,
///     ..Default::default()
/// };
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffsetSettings {
    /// Low-pass cutoff frequency of the bias estimate in Hz (typically 0.02)
    pub cutoff_frequency: f32,
    /// Seconds of stillness before the bias estimate starts adapting
    pub timeout: f32,
    /// Per-axis angular rate in deg/s below which the sensor is still
    pub threshold: f32,
}

impl OffsetSettings {
    /// Checks that every field is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.cutoff_frequency.is_finite() || self.cutoff_frequency <= 0.0 {
            return Err(ConfigError::InvalidCutoffFrequency);
        }
        if !self.timeout.is_finite() || self.timeout < 0.0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(ConfigError::InvalidThreshold);
        }
        Ok(())
    }
}

impl Default for OffsetSettings {
    fn default() -> Self {
        Self {
            cutoff_frequency: 0.02,
            timeout: 5.0,
            threshold: 3.0,
        }
    }
}
