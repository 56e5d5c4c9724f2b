//! Configuration errors
//!
//! The filter itself never fails at runtime. These errors are only produced
//! by the validated constructors, where a bad sample rate or offset setting
//! would otherwise silently disable bias tracking.

use core::fmt;

/// Invalid configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Sample rate must be finite and greater than zero
    InvalidSampleRate,
    /// Offset cutoff frequency must be finite and greater than zero
    InvalidCutoffFrequency,
    /// Stillness timeout must be finite and not negative
    InvalidTimeout,
    /// Stillness threshold must be finite and greater than zero
    InvalidThreshold,
    /// Initialisation period must be finite and not negative
    InvalidInitialisationPeriod,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidSampleRate => write!(f, "sample rate must be a positive number of Hz"),
            ConfigError::InvalidCutoffFrequency => write!(f, "offset cutoff frequency must be positive"),
            ConfigError::InvalidTimeout => write!(f, "offset timeout must not be negative"),
            ConfigError::InvalidThreshold => write!(f, "offset threshold must be positive"),
            ConfigError::InvalidInitialisationPeriod => {
                write!(f, "initialisation period must not be negative")
            }
        }
    }
}

impl core::error::Error for ConfigError {}
