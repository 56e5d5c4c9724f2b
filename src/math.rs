//! Mathematical utilities and nalgebra extensions

use nalgebra::{Quaternion, RealField, UnitQuaternion, Vector3};

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Norm below which a quaternion is treated as degenerate
const MIN_QUATERNION_NORM: f32 = 1e-6;

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Normalize the vector, returning `None` if it is zero or not finite
    fn try_normalize_finite(&self) -> Option<Vector3<f32>>;

    /// Normalize the vector, returning zero vector if magnitude is zero
    fn safe_normalize(&self) -> Vector3<f32>;

    /// Whether every component is finite
    fn all_finite(&self) -> bool;

    /// Angle in degrees between two vectors of any length
    fn angle_degrees(&self, other: &Vector3<f32>) -> f32;

    /// Convert degrees to radians
    fn deg_to_rad(&self) -> Vector3<f32>;

    /// Convert radians to degrees
    fn rad_to_deg(&self) -> Vector3<f32>;
}

impl Vector3Ext for Vector3<f32> {
    fn try_normalize_finite(&self) -> Option<Vector3<f32>> {
        if !self.all_finite() {
            return None;
        }
        let magnitude = self.norm();
        if magnitude > 0.0 && magnitude.is_finite() {
            Some(*self / magnitude)
        } else {
            None
        }
    }

    fn safe_normalize(&self) -> Vector3<f32> {
        self.try_normalize_finite().unwrap_or_else(Vector3::zeros)
    }

    fn all_finite(&self) -> bool {
        self.iter().all(|component| component.is_finite())
    }

    fn angle_degrees(&self, other: &Vector3<f32>) -> f32 {
        // atan2 stays accurate near 0° and 180° where acos does not
        let sine = self.cross(other).norm();
        let cosine = self.dot(other);
        RealField::atan2(sine, cosine) * RAD_TO_DEG
    }

    fn deg_to_rad(&self) -> Vector3<f32> {
        *self * DEG_TO_RAD
    }

    fn rad_to_deg(&self) -> Vector3<f32> {
        *self * RAD_TO_DEG
    }
}

/// Normalize a raw quaternion, returning `None` when the norm is zero, tiny
/// or not finite
pub(crate) fn try_normalize_quaternion(quaternion: Quaternion<f32>) -> Option<UnitQuaternion<f32>> {
    let norm = quaternion.norm();
    if norm.is_finite() && norm > MIN_QUATERNION_NORM {
        Some(UnitQuaternion::new_unchecked(quaternion / norm))
    } else {
        None
    }
}

/// Extension trait for UnitQuaternion operations
pub trait QuaternionExt {
    /// Convert quaternion to Euler angles (roll, pitch, yaw) in degrees
    fn to_euler_degrees(&self) -> Vector3<f32>;

    /// Create quaternion from Euler angles in degrees
    fn from_euler_degrees(roll: f32, pitch: f32, yaw: f32) -> UnitQuaternion<f32>;
}

impl QuaternionExt for UnitQuaternion<f32> {
    fn to_euler_degrees(&self) -> Vector3<f32> {
        let (roll, pitch, yaw) = self.euler_angles();
        Vector3::new(roll, pitch, yaw).rad_to_deg()
    }

    fn from_euler_degrees(roll: f32, pitch: f32, yaw: f32) -> UnitQuaternion<f32> {
        let euler_rad = Vector3::new(roll, pitch, yaw).deg_to_rad();
        UnitQuaternion::from_euler_angles(euler_rad.x, euler_rad.y, euler_rad.z)
    }
}
