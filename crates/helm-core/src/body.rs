//! Physics boundary
//!
//! The autopilot never integrates physics itself: it reads pose and velocity
//! from, and writes force and torque commands to, a rigid body owned by the
//! host physics engine. This module defines that narrow interface; the
//! [`crate::sim`] module provides an implementation for tests and demos.

use serde::{Deserialize, Serialize};

use crate::math::{Pose, Vector3};

/// How a force or torque command is interpreted by the integrator
///
/// Matches the semantics of a standard rigid-body engine: `Force` and
/// `Acceleration` act over the timestep, `Impulse` and `VelocityChange`
/// apply instantaneously; the `Acceleration`/`VelocityChange` variants
/// ignore mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForceMode {
    /// Continuous force, mass-dependent: `dv = F * dt / m`
    Force,
    /// Instantaneous momentum change, mass-dependent: `dv = F / m`
    Impulse,
    /// Continuous acceleration, mass-independent: `dv = F * dt`
    Acceleration,
    /// Instantaneous velocity change, mass-independent: `dv = F`
    VelocityChange,
}

/// A rigid body the autopilot can observe and actuate
///
/// Read access supplies the instantaneous pose and velocities; write access
/// queues force and torque commands for the next integration step. All
/// vectors are in world space.
pub trait RigidBody {
    /// Current pose (position and orientation)
    fn pose(&self) -> Pose;

    /// Current linear velocity
    fn linear_velocity(&self) -> Vector3;

    /// Current angular velocity (axis-scaled, rad/s)
    fn angular_velocity(&self) -> Vector3;

    /// Apply a force through the center of mass
    fn apply_force(&mut self, force: Vector3, mode: ForceMode);

    /// Apply a torque
    fn apply_torque(&mut self, torque: Vector3, mode: ForceMode);
}
