//! Quaternion-space orientation PID controller
//!
//! Produces a torque command from a current/target rotation pair by running
//! one scalar PID loop per quaternion component (x, y, z, w) and
//! re-projecting the result back into the rotation delta's frame. Operating
//! per-component rather than on a 3D angular-error vector is numerically
//! unusual and sensitive to the sign normalization of the rotation delta;
//! the test matrix below pins the behavior for known rotations.

use crate::math::{Matrix4, Quaternion, Vector3, Vector4};
use crate::Result;

use super::{DerivativeMode, GainSet, ScalarPid};

/// Quaternion component selector for per-component gain overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    X,
    Y,
    Z,
    W,
}

/// Below this delta scalar component the commanded rotation counts as a
/// half-turn, where the re-projection matrix annihilates the torque rows
/// and a turn would deadlock.
const ANTIPODAL_W: f64 = 0.1;

/// Angle subtracted from a near-half-turn delta, about its own axis, to pull
/// the command out of the dead zone.
const ANTIPODAL_NUDGE: f64 = 0.35;

/// Orientation PID controller
///
/// Four scalar PID loops, one per quaternion component, plus the quaternion
/// delta algebra that turns a rotation error into a torque vector.
#[derive(Debug, Clone, Copy)]
pub struct OrientationPid {
    components: [ScalarPid; 4],
}

impl OrientationPid {
    /// Create a new controller with the same gains on every component
    pub fn new(gains: GainSet) -> Self {
        Self {
            components: [ScalarPid::new(gains); 4],
        }
    }

    /// Set the output saturation limits on every component
    pub fn with_limits(mut self, min: f64, max: f64) -> Self {
        for c in &mut self.components {
            *c = c.with_limits(min, max);
        }
        self
    }

    /// Set the integral windup bound on every component
    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        for c in &mut self.components {
            *c = c.with_integral_limit(limit);
        }
        self
    }

    /// Replace the gains on every component
    pub fn set_gains(&mut self, gains: &GainSet) {
        for c in &mut self.components {
            c.set_gains(gains);
        }
    }

    /// Replace the gains on a single component
    pub fn set_component_gains(&mut self, component: Component, gains: &GainSet) {
        self.components[component as usize].set_gains(gains);
    }

    /// Pose-tracking update: torque command from a current/target rotation pair
    ///
    /// 1. Shortest-path delta from `current` to `target`, scalar part
    ///    non-negative (near a half-turn the delta is shortened about its own
    ///    axis, see `ANTIPODAL_NUDGE`).
    /// 2. The current angular velocity is folded into quaternion space via the
    ///    exponential map and composed with the delta.
    /// 3. One scalar loop per component runs against the identity-minus-delta
    ///    error and the velocity-adjusted delta.
    /// 4. The torque quaternion is re-projected through the delta's
    ///    orthogonalization matrix, negated, and its vector part returned.
    pub fn update(
        &mut self,
        angular_velocity: Vector3,
        current: Quaternion,
        target: Quaternion,
        dt: f64,
    ) -> Result<Vector3> {
        let mut delta = current.rotation_delta(&target);
        if delta.w < ANTIPODAL_W {
            let (axis, _) = delta.to_axis_angle();
            delta = Quaternion::from_axis_angle(axis, -ANTIPODAL_NUDGE).multiply(&delta);
        }

        let projection = orthogonalization_matrix(&delta);
        let error = Vector4::new(1.0 - delta.w, -delta.x, -delta.y, -delta.z);
        let spin = Quaternion::from_scaled_axis(angular_velocity);
        let adjusted = spin.multiply(&delta).to_vector4();

        let torque = Vector4::new(
            self.components[3].update_raw(error[0], adjusted[0], dt)?,
            self.components[0].update_raw(error[1], adjusted[1], dt)?,
            self.components[1].update_raw(error[2], adjusted[2], dt)?,
            self.components[2].update_raw(error[3], adjusted[3], dt)?,
        );
        let projected = projection * torque;

        Ok(-Vector3::new(projected[1], projected[2], projected[3]))
    }

    /// Rate-only update: torque command from an angular-velocity pair
    ///
    /// Per-axis error fed through the derivative-on-measurement scalar
    /// update. Simpler and numerically robust; prefer this path when only
    /// rate damping is needed (station-keeping).
    pub fn update_rates(
        &mut self,
        current: Vector3,
        target: Vector3,
        dt: f64,
    ) -> Result<Vector3> {
        Ok(Vector3::new(
            self.components[0].update(current.x, target.x, dt, DerivativeMode::Velocity)?,
            self.components[1].update(current.y, target.y, dt, DerivativeMode::Velocity)?,
            self.components[2].update(current.z, target.z, dt, DerivativeMode::Velocity)?,
        ))
    }

    /// Reset every component loop to its construction-time state
    pub fn reset(&mut self) {
        for c in &mut self.components {
            c.reset();
        }
    }
}

/// Re-projection matrix for the torque quaternion: the projector onto the
/// hyperplane orthogonal to the rotation delta in quaternion space,
/// `I - d dᵀ` over (w, x, y, z). Compensates for the nonlinearity of
/// quaternion composition versus a true angular-error vector; in particular
/// it cancels the bias the w-component loop would otherwise inject.
fn orthogonalization_matrix(delta: &Quaternion) -> Matrix4 {
    let d = delta.to_vector4();
    Matrix4::identity() - d * d.transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn wide(gains: GainSet) -> OrientationPid {
        OrientationPid::new(gains).with_limits(-1e6, 1e6)
    }

    #[test]
    fn test_projector_matches_componentwise_expansion() {
        let q = Quaternion::from_euler(0.7, -0.4, 1.9);
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);
        #[rustfmt::skip]
        let expanded = Matrix4::new(
            x * x + y * y + z * z, -w * x, -w * y, -w * z,
            -w * x, w * w + y * y + z * z, -x * y, -x * z,
            -w * y, -x * y, w * w + x * x + z * z, -y * z,
            -w * z, -x * z, -y * z, w * w + x * x + y * y,
        );
        let projector = orthogonalization_matrix(&q);
        for i in 0..4 {
            for j in 0..4 {
                assert_relative_eq!(projector[(i, j)], expanded[(i, j)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_zero_torque_at_identity() {
        // current == target: torque magnitude must be ~0 even with I and D
        // active, since the projector cancels the w-channel bias.
        let mut pid = wide(GainSet::new(5.0, 1.0, 0.5));
        for _ in 0..10 {
            let torque = pid
                .update(
                    Vector3::zeros(),
                    Quaternion::identity(),
                    Quaternion::identity(),
                    0.02,
                )
                .unwrap();
            assert_relative_eq!(torque.norm(), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_yaw_delta_closed_form() {
        // P-only controller, pure yaw delta of angle theta, zero spin:
        // torque = (0, kp * sin(theta) / 2, 0).
        let kp = 2.0;
        let theta = 0.4;
        let mut pid = wide(GainSet::p(kp));
        let torque = pid
            .update(
                Vector3::zeros(),
                Quaternion::identity(),
                Quaternion::from_axis_angle(Vector3::y(), theta),
                0.02,
            )
            .unwrap();
        assert_relative_eq!(torque.x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(torque.y, kp * theta.sin() / 2.0, epsilon = 1e-10);
        assert_relative_eq!(torque.z, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_pitch_and_roll_deltas_act_on_their_axis() {
        let kp = 2.0;
        let theta = 0.3;
        for (axis, pick) in [
            (Vector3::x(), 0usize),
            (Vector3::y(), 1),
            (Vector3::z(), 2),
        ] {
            let mut pid = wide(GainSet::p(kp));
            let torque = pid
                .update(
                    Vector3::zeros(),
                    Quaternion::identity(),
                    Quaternion::from_axis_angle(axis, theta),
                    0.02,
                )
                .unwrap();
            assert_relative_eq!(torque[pick], kp * theta.sin() / 2.0, epsilon = 1e-10);
            for other in 0..3 {
                if other != pick {
                    assert_relative_eq!(torque[other], 0.0, epsilon = 1e-10);
                }
            }
        }
    }

    #[test]
    fn test_torque_sign_reverses_with_delta() {
        let mut pid = wide(GainSet::p(2.0));
        let positive = pid
            .update(
                Vector3::zeros(),
                Quaternion::identity(),
                Quaternion::from_axis_angle(Vector3::y(), 0.5),
                0.02,
            )
            .unwrap();
        pid.reset();
        let negative = pid
            .update(
                Vector3::zeros(),
                Quaternion::identity(),
                Quaternion::from_axis_angle(Vector3::y(), -0.5),
                0.02,
            )
            .unwrap();
        assert!(positive.y > 0.0);
        assert!(negative.y < 0.0);
        assert_relative_eq!(positive.y, -negative.y, epsilon = 1e-10);
    }

    #[test]
    fn test_antipodal_target_produces_torque() {
        // Exactly opposed orientations sit on a saddle where the projector
        // would otherwise zero the command; the nudge must break it.
        for axis in [Vector3::x(), Vector3::y(), Vector3::z()] {
            let mut pid = wide(GainSet::p(2.0));
            let torque = pid
                .update(
                    Vector3::zeros(),
                    Quaternion::identity(),
                    Quaternion::from_axis_angle(axis, PI),
                    0.02,
                )
                .unwrap();
            assert!(
                torque.norm() > 0.1,
                "expected a usable kick at the antipode about {axis:?}, got {torque:?}"
            );
        }
    }

    #[test]
    fn test_rate_only_update() {
        let mut pid = wide(GainSet::p(3.0));
        let torque = pid
            .update_rates(Vector3::new(0.5, -1.0, 0.0), Vector3::zeros(), 0.02)
            .unwrap();
        assert_relative_eq!(torque.x, -1.5, epsilon = 1e-10);
        assert_relative_eq!(torque.y, 3.0, epsilon = 1e-10);
        assert_relative_eq!(torque.z, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_dt_precondition_propagates() {
        let mut pid = wide(GainSet::p(1.0));
        assert!(pid
            .update(
                Vector3::zeros(),
                Quaternion::identity(),
                Quaternion::identity(),
                -1.0,
            )
            .is_err());
        assert!(pid.update_rates(Vector3::zeros(), Vector3::zeros(), 0.0).is_err());
    }
}
