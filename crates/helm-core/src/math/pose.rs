//! Vehicle pose: position and orientation in world space

use serde::{Deserialize, Serialize};

use super::{Quaternion, Vector3};

/// A rigid-body pose: position plus orientation
///
/// The vehicle frame convention is +Z forward, +Y up, +X right (the frame
/// the thrusters are mounted in).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position in world space
    pub position: Vector3,
    /// Orientation as a unit quaternion
    pub orientation: Quaternion,
}

impl Pose {
    /// Create a new pose from position and orientation
    #[inline]
    pub const fn new(position: Vector3, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Identity pose (origin, no rotation)
    #[inline]
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: Quaternion::identity(),
        }
    }

    /// Create from position only (identity rotation)
    #[inline]
    pub fn from_position(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            orientation: Quaternion::identity(),
        }
    }

    /// Create from orientation only (zero position)
    #[inline]
    pub fn from_orientation(orientation: Quaternion) -> Self {
        Self {
            position: Vector3::zeros(),
            orientation,
        }
    }

    /// The local forward axis (+Z) expressed in world space
    #[inline]
    pub fn forward(&self) -> Vector3 {
        self.orientation.rotate_vector(Vector3::z())
    }

    /// The local right axis (+X) expressed in world space
    #[inline]
    pub fn right(&self) -> Vector3 {
        self.orientation.rotate_vector(Vector3::x())
    }

    /// The local up axis (+Y) expressed in world space
    #[inline]
    pub fn up(&self) -> Vector3 {
        self.orientation.rotate_vector(Vector3::y())
    }

    /// Express a world-space vector in the local frame
    #[inline]
    pub fn to_local(&self, v: Vector3) -> Vector3 {
        self.orientation.inverse().rotate_vector(v)
    }

    /// Distance between two poses (translation only)
    #[inline]
    pub fn distance(&self, other: &Pose) -> f64 {
        (self.position - other.position).norm()
    }

    /// Angular distance between two poses (rotation only)
    #[inline]
    pub fn angular_distance(&self, other: &Pose) -> f64 {
        self.orientation.angular_distance(&other.orientation)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_identity_axes() {
        let p = Pose::identity();
        assert_relative_eq!(p.forward().z, 1.0);
        assert_relative_eq!(p.right().x, 1.0);
        assert_relative_eq!(p.up().y, 1.0);
    }

    #[test]
    fn test_yawed_forward() {
        // Half-turn about up: forward flips, up unchanged.
        let p = Pose::from_orientation(Quaternion::from_axis_angle(Vector3::y(), PI));
        assert_relative_eq!(p.forward().z, -1.0, epsilon = 1e-10);
        assert_relative_eq!(p.up().y, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_to_local() {
        let p = Pose::from_orientation(Quaternion::from_axis_angle(Vector3::y(), PI / 2.0));
        // World forward motion seen from a 90-degree-yawed vehicle
        let local = p.to_local(Vector3::z());
        assert_relative_eq!(local.norm(), 1.0, epsilon = 1e-10);
        assert_relative_eq!(local.z, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_distance() {
        let a = Pose::from_position(0.0, 0.0, 0.0);
        let b = Pose::from_position(3.0, 4.0, 0.0);
        assert_relative_eq!(a.distance(&b), 5.0);
        assert_relative_eq!(a.angular_distance(&b), 0.0, epsilon = 1e-10);
    }
}
