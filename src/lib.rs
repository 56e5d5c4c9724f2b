#![no_std]

//! Fusion Stream - attitude and heading reference filter for IMU streams
//!
//! Estimates the orientation of a rigid body from gyroscope, accelerometer
//! and optionally magnetometer samples, and tracks the gyroscope bias while
//! the body is still.
//!
//! # Features
//!
//! - Complementary filter with proportional feedback
//! - Fast initial convergence through a time-based gain ramp
//! - Accelerometer rejection during motion, magnetometer rejection during
//!   magnetic interference, with bounded forced recovery
//! - Gyroscope offset correction while stationary
//! - NWU, ENU and NED earth conventions
//! - `#![no_std]`, no allocation, `defmt` and `serde` support behind features
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use fusion_stream::{SensorStream, AhrsSettings, OffsetSettings};
//!
//! let mut stream = SensorStream::with_settings(
//!     AhrsSettings::default(),
//!     OffsetSettings::default(),
//!     100.0,
//! );
//!
//! let gyroscope = Vector3::new(0.1, 0.2, 0.3);      // deg/s
//! let accelerometer = Vector3::new(0.0, 0.0, 1.0);  // g
//! let magnetometer = Vector3::new(1.0, 0.0, 0.0);   // µT
//!
//! stream.update(gyroscope, accelerometer, magnetometer, 0.01);
//!
//! let (roll, pitch, yaw) = stream.quaternion().euler_angles();
//! ```

#[macro_use]
mod logging;

mod ahrs;
mod error;
mod math;
pub mod offset;
pub mod stream;
mod types;

pub use ahrs::Ahrs;
pub use error::ConfigError;
pub use math::{DEG_TO_RAD, QuaternionExt, RAD_TO_DEG, Vector3Ext};
pub use offset::Offset;
pub use stream::SensorStream;
pub use types::*;
