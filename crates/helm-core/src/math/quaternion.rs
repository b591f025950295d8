//! Quaternion implementation for 3D rotations
//!
//! Wrapper around nalgebra's UnitQuaternion with the rotation operations the
//! orientation controller needs: shortest-path rotation deltas, look
//! rotations, and the angular-velocity exponential map.

use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};

use super::{Matrix3, Vector3, Vector4};

/// A unit quaternion representing a 3D rotation
///
/// Uses Hamilton convention (w, x, y, z) where w is the scalar part.
/// Always normalized to unit length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    /// Scalar component (w)
    pub w: f64,
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Quaternion {
    /// Create a new quaternion from components (automatically normalized)
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        let norm_sq = w.mul_add(w, x.mul_add(x, y.mul_add(y, z * z)));
        if norm_sq > 1e-20 {
            let inv_norm = 1.0 / norm_sq.sqrt();
            Self {
                w: w * inv_norm,
                x: x * inv_norm,
                y: y * inv_norm,
                z: z * inv_norm,
            }
        } else {
            Self { w, x, y, z }
        }
    }

    /// Create a new quaternion from components without normalization (const-compatible)
    pub const fn new_unchecked(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Identity quaternion (no rotation)
    pub const fn identity() -> Self {
        Self {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Create from Euler angles (roll, pitch, yaw) in radians
    ///
    /// Uses ZYX convention (yaw around Z, then pitch around Y, then roll around X)
    pub fn from_euler(roll: f64, pitch: f64, yaw: f64) -> Self {
        let uq = UnitQuaternion::from_euler_angles(roll, pitch, yaw);
        Self::from_nalgebra(uq)
    }

    /// Create from axis-angle representation
    pub fn from_axis_angle(axis: Vector3, angle: f64) -> Self {
        if let Some(unit_axis) = nalgebra::Unit::try_new(axis, 1e-10) {
            let uq = UnitQuaternion::from_axis_angle(&unit_axis, angle);
            Self::from_nalgebra(uq)
        } else {
            Self::identity()
        }
    }

    /// Create from a rotation vector via the exponential map
    ///
    /// The direction of `v` is the rotation axis and its magnitude the angle
    /// in radians. Used to fold an angular-velocity sample into quaternion
    /// space.
    pub fn from_scaled_axis(v: Vector3) -> Self {
        Self::from_nalgebra(UnitQuaternion::from_scaled_axis(v))
    }

    /// Create from a rotation matrix
    pub fn from_rotation_matrix(matrix: &Matrix3) -> Self {
        let rot = nalgebra::Rotation3::from_matrix_unchecked(*matrix);
        let uq = UnitQuaternion::from_rotation_matrix(&rot);
        Self::from_nalgebra(uq)
    }

    /// Create a rotation whose local +Z axis points along `forward`
    ///
    /// `up` is a hint for the roll around the forward axis. If `forward` is
    /// parallel to `up`, an alternative hint is picked so the result is
    /// always a valid rotation.
    pub fn look_rotation(forward: Vector3, up: Vector3) -> Self {
        let f = forward.normalize();
        let mut right = up.cross(&f);
        if right.norm_squared() < 1e-12 {
            right = Vector3::z().cross(&f);
            if right.norm_squared() < 1e-12 {
                right = Vector3::x();
            }
        }
        let right = right.normalize();
        let up = f.cross(&right);
        Self::from_rotation_matrix(&Matrix3::from_columns(&[right, up, f]))
    }

    /// Convert from nalgebra's UnitQuaternion
    pub fn from_nalgebra(uq: UnitQuaternion<f64>) -> Self {
        Self {
            w: uq.w,
            x: uq.i,
            y: uq.j,
            z: uq.k,
        }
    }

    /// Convert to nalgebra's UnitQuaternion
    pub fn to_nalgebra(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(self.w, self.x, self.y, self.z))
    }

    /// Components as a 4-vector in (w, x, y, z) order
    #[inline]
    pub fn to_vector4(&self) -> Vector4 {
        Vector4::new(self.w, self.x, self.y, self.z)
    }

    /// Get Euler angles (roll, pitch, yaw) in radians
    pub fn to_euler(&self) -> (f64, f64, f64) {
        self.to_nalgebra().euler_angles()
    }

    /// Get axis-angle representation
    ///
    /// Returns the +Z axis with a zero angle for rotations too close to the
    /// identity to define an axis.
    pub fn to_axis_angle(&self) -> (Vector3, f64) {
        if let Some((axis, angle)) = self.to_nalgebra().axis_angle() {
            (axis.into_inner(), angle)
        } else {
            (Vector3::z(), 0.0)
        }
    }

    /// Multiply two quaternions (compose rotations)
    ///
    /// Uses the Hamilton product directly for performance, avoiding nalgebra conversion.
    #[inline]
    pub fn multiply(&self, other: &Quaternion) -> Quaternion {
        Self {
            w: self.w.mul_add(
                other.w,
                (-self.x).mul_add(other.x, (-self.y).mul_add(other.y, -self.z * other.z)),
            ),
            x: self.w.mul_add(
                other.x,
                self.x
                    .mul_add(other.w, self.y.mul_add(other.z, -self.z * other.y)),
            ),
            y: self.w.mul_add(
                other.y,
                (-self.x).mul_add(other.z, self.y.mul_add(other.w, self.z * other.x)),
            ),
            z: self.w.mul_add(
                other.z,
                self.x
                    .mul_add(other.y, (-self.y).mul_add(other.x, self.z * other.w)),
            ),
        }
    }

    /// Get the inverse (conjugate) quaternion
    ///
    /// For a unit quaternion, the inverse is the conjugate.
    #[inline]
    pub fn inverse(&self) -> Quaternion {
        Self {
            w: self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    /// Shortest-path rotation from `self` to `target`
    ///
    /// Computes `target * self⁻¹` with the sign normalized so the scalar
    /// component is non-negative. The normalization resolves the double-cover
    /// ambiguity: `q` and `-q` encode the same rotation, and without it the
    /// controller would occasionally command the long way around.
    #[inline]
    pub fn rotation_delta(&self, target: &Quaternion) -> Quaternion {
        let d = target.multiply(&self.inverse());
        if d.w < 0.0 {
            Self {
                w: -d.w,
                x: -d.x,
                y: -d.y,
                z: -d.z,
            }
        } else {
            d
        }
    }

    /// Rotate a 3D vector
    ///
    /// Uses the optimized qvq* formula directly for performance:
    /// v' = v + 2w(q x v) + 2(q x (q x v)) where q = (x, y, z) is the vector part.
    #[inline]
    pub fn rotate_vector(&self, v: Vector3) -> Vector3 {
        let qv = Vector3::new(self.x, self.y, self.z);
        let uv = qv.cross(&v);
        let uuv = qv.cross(&uv);
        v + (uv * self.w + uuv) * 2.0
    }

    /// Dot product between two quaternions
    #[inline]
    pub fn dot(&self, other: &Quaternion) -> f64 {
        self.w.mul_add(
            other.w,
            self.x
                .mul_add(other.x, self.y.mul_add(other.y, self.z * other.z)),
        )
    }

    /// Angular distance between two quaternions in radians
    #[inline]
    pub fn angular_distance(&self, other: &Quaternion) -> f64 {
        let dot = self.dot(other).abs().min(1.0);
        2.0 * dot.acos()
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Quaternion {
    type Output = Quaternion;

    fn mul(self, rhs: Self) -> Self::Output {
        self.multiply(&rhs)
    }
}

impl std::ops::Mul<&Quaternion> for Quaternion {
    type Output = Quaternion;

    fn mul(self, rhs: &Self) -> Self::Output {
        self.multiply(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_identity() {
        let q = Quaternion::identity();
        assert_relative_eq!(q.w, 1.0);
        assert_relative_eq!(q.x, 0.0);
        assert_relative_eq!(q.y, 0.0);
        assert_relative_eq!(q.z, 0.0);
    }

    #[test]
    fn test_euler_roundtrip() {
        let (roll, pitch, yaw) = (0.1, 0.2, 0.3);
        let q = Quaternion::from_euler(roll, pitch, yaw);
        let (r2, p2, y2) = q.to_euler();
        assert_relative_eq!(roll, r2, epsilon = 1e-10);
        assert_relative_eq!(pitch, p2, epsilon = 1e-10);
        assert_relative_eq!(yaw, y2, epsilon = 1e-10);
    }

    #[test]
    fn test_rotate_vector() {
        // 90 degree rotation around Z axis
        let q = Quaternion::from_euler(0.0, 0.0, PI / 2.0);
        let rotated = q.rotate_vector(Vector3::x());
        assert_relative_eq!(rotated.x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(rotated.y, 1.0, epsilon = 1e-10);
        assert_relative_eq!(rotated.z, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_inverse() {
        let q = Quaternion::from_euler(0.1, 0.2, 0.3);
        let result = q * q.inverse();
        let identity = Quaternion::identity();
        assert_relative_eq!(result.dot(&identity).abs(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_rotation_delta_of_self_is_identity() {
        for q in [
            Quaternion::identity(),
            Quaternion::from_euler(0.4, -0.2, 1.1),
            Quaternion::from_axis_angle(Vector3::new(1.0, 1.0, 0.0), 2.5),
        ] {
            let d = q.rotation_delta(&q);
            assert_relative_eq!(d.w, 1.0, epsilon = 1e-10);
            assert_relative_eq!(d.x, 0.0, epsilon = 1e-10);
            assert_relative_eq!(d.y, 0.0, epsilon = 1e-10);
            assert_relative_eq!(d.z, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_rotation_delta_sign_normalized() {
        // A 350-degree turn must come back as the short 10-degree rotation
        // with non-negative scalar part, not the long way around.
        let current = Quaternion::identity();
        let target = Quaternion::from_axis_angle(Vector3::y(), 350.0 * PI / 180.0);
        let d = current.rotation_delta(&target);
        assert!(d.w >= 0.0);
        let (_, angle) = d.to_axis_angle();
        assert_relative_eq!(angle, 10.0 * PI / 180.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rotation_delta_recovers_target() {
        let current = Quaternion::from_euler(0.3, -0.1, 0.7);
        let target = Quaternion::from_euler(-0.2, 0.5, -1.3);
        let d = current.rotation_delta(&target);
        let recovered = d.multiply(&current);
        assert_relative_eq!(recovered.dot(&target).abs(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_look_rotation_forward() {
        let q = Quaternion::look_rotation(Vector3::z(), Vector3::y());
        assert_relative_eq!(q.dot(&Quaternion::identity()).abs(), 1.0, epsilon = 1e-10);

        let q = Quaternion::look_rotation(Vector3::x(), Vector3::y());
        let f = q.rotate_vector(Vector3::z());
        assert_relative_eq!(f.x, 1.0, epsilon = 1e-10);
        assert_relative_eq!(f.y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(f.z, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_look_rotation_backward() {
        let q = Quaternion::look_rotation(-Vector3::z(), Vector3::y());
        let f = q.rotate_vector(Vector3::z());
        assert_relative_eq!(f.z, -1.0, epsilon = 1e-10);
        // Up stays up for a pure half-turn in the horizontal plane
        let u = q.rotate_vector(Vector3::y());
        assert_relative_eq!(u.y, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_look_rotation_degenerate_up() {
        // Forward parallel to the up hint still yields a valid rotation.
        let q = Quaternion::look_rotation(Vector3::y(), Vector3::y());
        let f = q.rotate_vector(Vector3::z());
        assert_relative_eq!(f.y, 1.0, epsilon = 1e-10);
        assert_relative_eq!(q.to_vector4().norm(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_from_scaled_axis() {
        let q = Quaternion::from_scaled_axis(Vector3::new(0.0, PI / 2.0, 0.0));
        let (axis, angle) = q.to_axis_angle();
        assert_relative_eq!(axis.y, 1.0, epsilon = 1e-10);
        assert_relative_eq!(angle, PI / 2.0, epsilon = 1e-10);

        // Zero rotation vector maps to the identity
        let q = Quaternion::from_scaled_axis(Vector3::zeros());
        assert_relative_eq!(q.w, 1.0, epsilon = 1e-10);
    }
}
