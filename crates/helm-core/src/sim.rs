//! Minimal 6-DOF rigid-body simulation
//!
//! A semi-implicit Euler integrator over a single free body, just enough
//! physics to close the loop around the autopilot in tests and demos without
//! a real engine.

use serde::{Deserialize, Serialize};

use crate::body::{ForceMode, RigidBody};
use crate::math::{Pose, Quaternion, Vector3};

/// Physical parameters of the simulated body
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Mass in kg
    pub mass: f64,
    /// Principal moments of inertia (kg·m²)
    pub inertia: Vector3,
    /// Linear velocity damping per second (0 = spaceflight)
    pub linear_damping: f64,
    /// Angular velocity damping per second (0 = spaceflight)
    pub angular_damping: f64,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            mass: 1.0,
            inertia: Vector3::new(1.0, 1.0, 1.0),
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }
}

impl BodyConfig {
    /// Set the mass
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    /// Set uniform principal inertia
    pub fn with_inertia(mut self, inertia: f64) -> Self {
        self.inertia = Vector3::new(inertia, inertia, inertia);
        self
    }
}

/// A single simulated rigid body
///
/// Continuous commands (`Force`, `Acceleration`) accumulate and integrate on
/// the next [`SimBody::step`]; instantaneous commands (`Impulse`,
/// `VelocityChange`) take effect immediately, matching the conventions of a
/// standard game-physics integrator.
#[derive(Debug, Clone)]
pub struct SimBody {
    config: BodyConfig,
    pose: Pose,
    linear_velocity: Vector3,
    angular_velocity: Vector3,
    pending_accel: Vector3,
    pending_ang_accel: Vector3,
    time: f64,
}

impl SimBody {
    /// Create a body at the identity pose
    pub fn new(config: BodyConfig) -> Self {
        Self {
            config,
            pose: Pose::identity(),
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            pending_accel: Vector3::zeros(),
            pending_ang_accel: Vector3::zeros(),
            time: 0.0,
        }
    }

    /// Create a body at the given pose
    pub fn at_pose(config: BodyConfig, pose: Pose) -> Self {
        Self {
            pose,
            ..Self::new(config)
        }
    }

    /// Overwrite the pose (teleport)
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    /// Overwrite the velocities
    pub fn set_velocity(&mut self, linear: Vector3, angular: Vector3) {
        self.linear_velocity = linear;
        self.angular_velocity = angular;
    }

    /// Elapsed simulation time in seconds
    pub fn sim_time(&self) -> f64 {
        self.time
    }

    /// Integrate one fixed step
    pub fn step(&mut self, dt: f64) {
        self.linear_velocity += self.pending_accel * dt;
        self.angular_velocity += self.pending_ang_accel * dt;
        self.pending_accel = Vector3::zeros();
        self.pending_ang_accel = Vector3::zeros();

        let linear_decay = 1.0 - (self.config.linear_damping * dt).min(1.0);
        let angular_decay = 1.0 - (self.config.angular_damping * dt).min(1.0);
        self.linear_velocity *= linear_decay;
        self.angular_velocity *= angular_decay;

        self.pose.position += self.linear_velocity * dt;

        let spin = Quaternion::from_scaled_axis(self.angular_velocity * dt);
        let q = spin.multiply(&self.pose.orientation);
        // Renormalize so repeated products cannot drift off the unit sphere
        self.pose.orientation = Quaternion::new(q.w, q.x, q.y, q.z);

        self.time += dt;
    }
}

impl RigidBody for SimBody {
    fn pose(&self) -> Pose {
        self.pose
    }

    fn linear_velocity(&self) -> Vector3 {
        self.linear_velocity
    }

    fn angular_velocity(&self) -> Vector3 {
        self.angular_velocity
    }

    fn apply_force(&mut self, force: Vector3, mode: ForceMode) {
        match mode {
            ForceMode::Force => self.pending_accel += force / self.config.mass,
            ForceMode::Acceleration => self.pending_accel += force,
            ForceMode::Impulse => self.linear_velocity += force / self.config.mass,
            ForceMode::VelocityChange => self.linear_velocity += force,
        }
    }

    fn apply_torque(&mut self, torque: Vector3, mode: ForceMode) {
        match mode {
            ForceMode::Force => self.pending_ang_accel += torque.component_div(&self.config.inertia),
            ForceMode::Acceleration => self.pending_ang_accel += torque,
            ForceMode::Impulse => self.angular_velocity += torque.component_div(&self.config.inertia),
            ForceMode::VelocityChange => self.angular_velocity += torque,
        }
    }
}
