//! Maneuver state machine
//!
//! Sequences the autopilot's thrust and torque loops through an ordered
//! flight profile: turn toward the target, thrust up to cruise speed, flip
//! around, brake on the main engine, and hold station. A flat phase enum
//! with explicit match dispatch keeps the phase table exhaustive and each
//! handler testable in isolation.

use crate::body::RigidBody;
use crate::math::{Pose, Quaternion, Vector3};
use crate::{Error, Result};

use super::Autopilot;

/// Alignment threshold for leaving `TurnTowardsTarget` (~8 degrees)
const ALIGNMENT_DOT: f64 = 0.99;

/// Heading threshold for leaving `TurningAround` (~94 degrees off the
/// target bearing, i.e. committed to the flip)
const TURNAROUND_DOT: f64 = 0.1;

/// Phases of the approach-decelerate-align flight profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManeuverPhase {
    /// Torque until the nose points at the target
    TurnTowardsTarget,
    /// Thrust up to cruise speed while holding the bearing
    ForwardThrustMovement,
    /// Flip 180 degrees to brake on the main engine
    TurningAround,
    /// Thrust against the motion until inside the stopping sphere
    ForwardThrustDeceleration,
    /// Reserved for pure lateral-thruster maneuvering; intentionally inert
    SideThrustersMovement,
    /// Station-keeping: hold all velocities at zero
    NoMovement,
}

/// The maneuver sequencer
///
/// Owns the [`Autopilot`] controller suite and drives it once per physics
/// tick. The target pose is passed in every tick and never cached, so a
/// moving target provider is honored; the deceleration window is computed
/// from the distance at approach start.
///
/// Torque is always commanded before thrust within a tick: attitude decides
/// where thrust is effective, so the ordering is load-bearing.
#[derive(Debug, Clone)]
pub struct ManeuverSequencer {
    autopilot: Autopilot,
    phase: ManeuverPhase,
    deceleration_distance: f64,
    entered: bool,
}

impl ManeuverSequencer {
    /// Create a sequencer around a controller suite
    ///
    /// No maneuver is active until [`ManeuverSequencer::enter`] is called.
    pub fn new(autopilot: Autopilot) -> Self {
        Self {
            autopilot,
            phase: ManeuverPhase::TurnTowardsTarget,
            deceleration_distance: 0.0,
            entered: false,
        }
    }

    /// Begin a maneuver toward `target`
    ///
    /// Resets every controller, sizes the deceleration window from the
    /// current distance, and restarts the phase sequence. Call again to
    /// retarget; the old maneuver state is discarded.
    pub fn enter(&mut self, body: &dyn RigidBody, target: &Pose) {
        let distance = (target.position - body.pose().position).norm();
        self.phase = ManeuverPhase::TurnTowardsTarget;
        self.deceleration_distance = self.deceleration_window(distance);
        self.autopilot.reset();
        self.entered = true;
        tracing::info!(distance, deceleration_distance = self.deceleration_distance, "maneuver started");
    }

    /// Abort the active maneuver
    ///
    /// The sequencer stops commanding the body; a new maneuver requires
    /// another [`ManeuverSequencer::enter`].
    pub fn abort(&mut self) {
        if self.entered {
            tracing::info!(phase = ?self.phase, "maneuver aborted");
        }
        self.entered = false;
        self.autopilot.reset();
    }

    /// The current phase
    pub fn phase(&self) -> ManeuverPhase {
        self.phase
    }

    /// Whether a maneuver is active
    pub fn is_active(&self) -> bool {
        self.entered
    }

    /// The deceleration window for the active maneuver
    pub fn deceleration_distance(&self) -> f64 {
        self.deceleration_distance
    }

    /// The owned controller suite
    pub fn autopilot(&self) -> &Autopilot {
        &self.autopilot
    }

    /// Mutable access to the controller suite (gain edits, autotuning)
    pub fn autopilot_mut(&mut self) -> &mut Autopilot {
        &mut self.autopilot
    }

    /// Run one tick of the active maneuver
    ///
    /// Reads the body's pose and velocities, dispatches the current phase,
    /// and applies thrust/torque commands through the body. `target` must be
    /// re-fetched from the target provider by the caller each tick.
    ///
    /// # Errors
    /// `Error::InvalidState` if no maneuver has been entered (programming
    /// error; also asserts in debug builds). `Error::InvalidArgument` for a
    /// non-positive `dt`, propagated from the controllers.
    pub fn update(&mut self, body: &mut dyn RigidBody, target: &Pose, dt: f64) -> Result<()> {
        if !self.entered {
            debug_assert!(self.entered, "sequencer updated before enter");
            return Err(Error::InvalidState(
                "maneuver sequencer updated before enter".into(),
            ));
        }

        self.autopilot.push_gains();
        if self.autopilot.is_autotuning() {
            self.autopilot.tuning_step(dt);
        }

        let local_velocity = body.pose().to_local(body.linear_velocity());

        match self.phase {
            ManeuverPhase::TurnTowardsTarget => self.turn_towards_target(body, target, dt),
            ManeuverPhase::ForwardThrustMovement => self.forward_thrust(body, target, local_velocity, dt),
            ManeuverPhase::TurningAround => self.turning_around(body, target, dt),
            ManeuverPhase::ForwardThrustDeceleration => {
                self.decelerate(body, target, local_velocity, dt)
            }
            ManeuverPhase::SideThrustersMovement => Ok(()),
            ManeuverPhase::NoMovement => self.station_keep(body, local_velocity, dt),
        }
    }

    fn turn_towards_target(
        &mut self,
        body: &mut dyn RigidBody,
        target: &Pose,
        dt: f64,
    ) -> Result<()> {
        let pose = body.pose();
        let direction = bearing(&pose, target);
        let target_rotation = Quaternion::look_rotation(direction, Vector3::y());
        self.autopilot.update_torque(body, target_rotation, dt)?;

        if pose.forward().dot(&direction) > ALIGNMENT_DOT {
            let distance = (target.position - pose.position).norm();
            self.deceleration_distance = self.deceleration_window(distance);
            self.autopilot.reset();
            self.transition(ManeuverPhase::ForwardThrustMovement);
        }
        Ok(())
    }

    fn forward_thrust(
        &mut self,
        body: &mut dyn RigidBody,
        target: &Pose,
        local_velocity: Vector3,
        dt: f64,
    ) -> Result<()> {
        let pose = body.pose();
        let distance = (target.position - pose.position).norm();
        let direction = bearing(&pose, target);
        let cruise_speed = self.autopilot.config().cruise_speed;

        let target_rotation = Quaternion::look_rotation(direction, Vector3::y());
        self.autopilot.update_torque(body, target_rotation, dt)?;
        self.autopilot
            .update_main_thrust(body, local_velocity.z, cruise_speed, dt)?;

        if distance < self.deceleration_distance {
            self.autopilot.reset();
            self.transition(ManeuverPhase::TurningAround);
        }
        Ok(())
    }

    fn turning_around(&mut self, body: &mut dyn RigidBody, target: &Pose, dt: f64) -> Result<()> {
        let pose = body.pose();
        let direction = bearing(&pose, target);
        let heading = pose.forward().dot(&direction);

        let target_rotation = Quaternion::look_rotation(-direction, Vector3::y());
        self.autopilot.update_torque(body, target_rotation, dt)?;

        if heading.abs() < TURNAROUND_DOT {
            self.autopilot.reset();
            self.transition(ManeuverPhase::ForwardThrustDeceleration);
        }
        Ok(())
    }

    fn decelerate(
        &mut self,
        body: &mut dyn RigidBody,
        target: &Pose,
        local_velocity: Vector3,
        dt: f64,
    ) -> Result<()> {
        let pose = body.pose();
        let distance = (target.position - pose.position).norm();
        let direction = bearing(&pose, target);

        let target_rotation = Quaternion::look_rotation(-direction, Vector3::y());
        self.autopilot.update_torque(body, target_rotation, dt)?;
        self.autopilot
            .update_main_thrust(body, local_velocity.z, 0.0, dt)?;
        self.autopilot
            .update_side_thrust(body, local_velocity.x, 0.0, dt)?;

        if distance < self.autopilot.config().stopping_distance {
            self.autopilot.reset();
            self.transition(ManeuverPhase::NoMovement);
        }
        Ok(())
    }

    fn station_keep(
        &mut self,
        body: &mut dyn RigidBody,
        local_velocity: Vector3,
        dt: f64,
    ) -> Result<()> {
        self.autopilot.update_torque_rates(body, Vector3::zeros(), dt)?;
        self.autopilot
            .update_main_thrust(body, local_velocity.z, 0.0, dt)?;
        self.autopilot
            .update_side_thrust(body, local_velocity.x, 0.0, dt)?;
        Ok(())
    }

    fn deceleration_window(&self, distance: f64) -> f64 {
        let percent = self.autopilot.config().max_deceleration_percent;
        (distance / 1.5).min(distance * percent / 100.0)
    }

    fn transition(&mut self, to: ManeuverPhase) {
        tracing::debug!(from = ?self.phase, to = ?to, "maneuver phase transition");
        self.phase = to;
    }
}

/// Unit bearing from the vehicle to the target; falls back to the current
/// forward axis when the two coincide.
fn bearing(pose: &Pose, target: &Pose) -> Vector3 {
    let offset = target.position - pose.position;
    let distance = offset.norm();
    if distance < 1e-9 {
        pose.forward()
    } else {
        offset / distance
    }
}
