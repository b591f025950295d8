//! The autopilot controller suite
//!
//! Owns the thrust and torque PID loops, their gain sets, and the optional
//! relay autotuner, and applies every command through the rigid-body
//! boundary. The maneuver sequencer decides *what* to command each phase;
//! this type knows *how* each command maps onto the thrusters.

use crate::body::{ForceMode, RigidBody};
use crate::control::{
    Autotuner, DerivativeMode, OrientationPid, ScalarPid, TuningMethod, VectorPid,
};
use crate::math::{Quaternion, Vector3};
use crate::Result;

use super::AutopilotConfig;

/// PID controller suite for one vehicle
///
/// Thrust is only ever applied along the vehicle's own axes: the main
/// thruster pushes forward, the side and up thrusters trim lateral and
/// vertical velocity. Negative forward-thrust commands are suppressed
/// outright (the main thruster cannot pull); braking is flown by turning
/// the vehicle around and thrusting against the motion.
#[derive(Debug, Clone)]
pub struct Autopilot {
    config: AutopilotConfig,
    main_thrust: VectorPid,
    side_thrust: ScalarPid,
    up_thrust: ScalarPid,
    torque: OrientationPid,
    autotuner: Option<Autotuner>,
    last_thrust: Vector3,
    last_torque: Vector3,
}

impl Autopilot {
    /// Create a controller suite from a validated configuration
    ///
    /// # Errors
    /// `Error::Config` if any gain or limit is unusable; configuration
    /// problems are rejected here, never at update time.
    pub fn new(config: AutopilotConfig) -> Result<Self> {
        config.validate()?;
        let main_thrust = VectorPid::new(config.main_thrust)
            .with_limits(-config.main_output_limit, config.main_output_limit)
            .with_integral_limit(config.integral_saturation);
        // The up thruster shares the side-thrust gain set: both are small
        // trim loops with the same authority.
        let side_thrust = ScalarPid::new(config.side_thrust)
            .with_limits(-config.side_output_limit, config.side_output_limit)
            .with_integral_limit(config.integral_saturation);
        let up_thrust = ScalarPid::new(config.side_thrust)
            .with_limits(-config.side_output_limit, config.side_output_limit)
            .with_integral_limit(config.integral_saturation);
        let torque = OrientationPid::new(config.torque)
            .with_limits(-config.torque_output_limit, config.torque_output_limit)
            .with_integral_limit(config.integral_saturation);

        Ok(Self {
            config,
            main_thrust,
            side_thrust,
            up_thrust,
            torque,
            autotuner: None,
            last_thrust: Vector3::zeros(),
            last_torque: Vector3::zeros(),
        })
    }

    /// The active configuration
    pub fn config(&self) -> &AutopilotConfig {
        &self.config
    }

    /// Mutable access to the configuration (live gain editing)
    pub fn config_mut(&mut self) -> &mut AutopilotConfig {
        &mut self.config
    }

    /// Push the owned gain sets down into the controllers
    ///
    /// Called at the top of every tick so autotuner writes and live edits
    /// take effect on the tick they are made.
    pub fn push_gains(&mut self) {
        self.main_thrust.set_gains(&self.config.main_thrust);
        self.side_thrust.set_gains(&self.config.side_thrust);
        self.up_thrust.set_gains(&self.config.side_thrust);
        self.torque.set_gains(&self.config.torque);
    }

    /// Torque the vehicle toward a target orientation
    pub fn update_torque(
        &mut self,
        body: &mut dyn RigidBody,
        target_rotation: Quaternion,
        dt: f64,
    ) -> Result<()> {
        let pose = body.pose();
        let torque = self.torque.update(
            body.angular_velocity(),
            pose.orientation,
            target_rotation,
            dt,
        )?;
        self.last_torque = torque;
        body.apply_torque(torque * self.config.torque_multiplier, ForceMode::Force);
        Ok(())
    }

    /// Torque the vehicle toward a target angular velocity (rate damping)
    pub fn update_torque_rates(
        &mut self,
        body: &mut dyn RigidBody,
        target_rates: Vector3,
        dt: f64,
    ) -> Result<()> {
        let torque = self
            .torque
            .update_rates(body.angular_velocity(), target_rates, dt)?;
        self.last_torque = torque;
        body.apply_torque(torque * self.config.torque_multiplier, ForceMode::Force);
        Ok(())
    }

    /// Drive the local forward velocity toward a target speed
    ///
    /// The velocity loop runs on the local Z axis only. A negative command
    /// would mean thrusting backward through the main engine, which this
    /// vehicle cannot do, so it is dropped.
    pub fn update_main_thrust(
        &mut self,
        body: &mut dyn RigidBody,
        forward_velocity: f64,
        target_velocity: f64,
        dt: f64,
    ) -> Result<()> {
        let thrust = self.main_thrust.update_velocity(
            Vector3::new(0.0, 0.0, forward_velocity),
            Vector3::new(0.0, 0.0, target_velocity),
            dt,
        )?;
        self.last_thrust = thrust;
        if thrust.z < 0.0 {
            return Ok(());
        }
        let forward = body.pose().forward();
        body.apply_force(
            forward * thrust.z * self.config.main_thrust_multiplier,
            ForceMode::Force,
        );
        Ok(())
    }

    /// Trim the local lateral (X) velocity toward a target
    pub fn update_side_thrust(
        &mut self,
        body: &mut dyn RigidBody,
        lateral_velocity: f64,
        target_velocity: f64,
        dt: f64,
    ) -> Result<()> {
        let output = self.side_thrust.update(
            lateral_velocity,
            target_velocity,
            dt,
            DerivativeMode::Velocity,
        )?;
        let right = body.pose().right();
        body.apply_force(
            right * output * self.config.side_thrust_multiplier,
            ForceMode::Force,
        );
        Ok(())
    }

    /// Trim the local vertical (Y) velocity toward a target
    pub fn update_up_thrust(
        &mut self,
        body: &mut dyn RigidBody,
        vertical_velocity: f64,
        target_velocity: f64,
        dt: f64,
    ) -> Result<()> {
        let output = self.up_thrust.update(
            vertical_velocity,
            target_velocity,
            dt,
            DerivativeMode::Velocity,
        )?;
        let up = body.pose().up();
        body.apply_force(
            up * output * self.config.up_thrust_multiplier,
            ForceMode::Force,
        );
        Ok(())
    }

    /// Begin relay autotuning of the main-thrust gain set
    pub fn start_autotuning(&mut self) {
        self.autotuner = Some(Autotuner::new(TuningMethod::ZieglerNichols));
    }

    /// Whether an autotuning run is in progress
    pub fn is_autotuning(&self) -> bool {
        self.autotuner.is_some()
    }

    /// Abandon an autotuning run that never converged
    pub fn cancel_autotuning(&mut self) {
        self.autotuner = None;
    }

    /// Advance the active autotuning run by one tick
    ///
    /// Observes the forward-axis error of the main-thrust loop. Returns
    /// `true` on the tick tuning completes; the tuner detaches itself and
    /// the rewritten gains reach the controller on the next gain push.
    pub fn tuning_step(&mut self, dt: f64) -> bool {
        let Some(tuner) = self.autotuner.as_mut() else {
            return false;
        };
        let error = self.main_thrust.error();
        if tuner.update(&mut self.config.main_thrust, error, dt) {
            self.autotuner = None;
            return true;
        }
        false
    }

    /// Seconds the active autotuning run has observed, if any
    ///
    /// Exposed so the caller can impose a timeout on a loop that never
    /// oscillates.
    pub fn autotuning_elapsed(&self) -> Option<f64> {
        self.autotuner.as_ref().map(|t| t.elapsed())
    }

    /// The last commanded thrust vector (local frame, before multipliers)
    pub fn last_thrust(&self) -> Vector3 {
        self.last_thrust
    }

    /// The last commanded torque vector (world frame, before multipliers)
    pub fn last_torque(&self) -> Vector3 {
        self.last_torque
    }

    /// Reset every controller to its construction-time state
    pub fn reset(&mut self) {
        self.main_thrust.reset();
        self.side_thrust.reset();
        self.up_thrust.reset();
        self.torque.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::GainSet;
    use crate::math::Pose;
    use crate::sim::{BodyConfig, SimBody};
    use approx::assert_relative_eq;

    fn test_config() -> AutopilotConfig {
        AutopilotConfig {
            main_thrust: GainSet::p(2.0),
            side_thrust: GainSet::p(2.0),
            torque: GainSet::p(4.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = AutopilotConfig::default();
        config.cruise_speed = f64::NAN;
        assert!(Autopilot::new(config).is_err());
    }

    #[test]
    fn test_negative_forward_thrust_suppressed() {
        let mut pilot = Autopilot::new(test_config()).unwrap();
        let mut body = SimBody::new(BodyConfig::default());
        // Moving forward faster than commanded: the loop asks for reverse
        // thrust, which must be dropped, leaving the body untouched.
        pilot.update_main_thrust(&mut body, 5.0, 0.0, 0.02).unwrap();
        body.step(0.02);
        assert_relative_eq!(body.linear_velocity().norm(), 0.0, epsilon = 1e-12);
        assert!(pilot.last_thrust().z < 0.0);
    }

    #[test]
    fn test_forward_thrust_applied_along_forward_axis() {
        let mut pilot = Autopilot::new(test_config()).unwrap();
        let mut body = SimBody::new(BodyConfig::default());
        pilot.update_main_thrust(&mut body, 0.0, 5.0, 0.02).unwrap();
        body.step(0.02);
        let v = body.linear_velocity();
        assert!(v.z > 0.0);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_side_thrust_damps_lateral_motion() {
        let mut pilot = Autopilot::new(test_config()).unwrap();
        let mut body = SimBody::new(BodyConfig::default());
        body.set_velocity(Vector3::new(2.0, 0.0, 0.0), Vector3::zeros());
        for _ in 0..600 {
            let lateral = body.pose().to_local(body.linear_velocity()).x;
            pilot.update_side_thrust(&mut body, lateral, 0.0, 0.02).unwrap();
            body.step(0.02);
        }
        assert!(body.linear_velocity().norm() < 0.1);
    }

    #[test]
    fn test_up_thrust_damps_vertical_motion() {
        let mut pilot = Autopilot::new(test_config()).unwrap();
        let mut body = SimBody::new(BodyConfig::default());
        body.set_velocity(Vector3::new(0.0, 1.5, 0.0), Vector3::zeros());
        for _ in 0..600 {
            let vertical = body.pose().to_local(body.linear_velocity()).y;
            pilot.update_up_thrust(&mut body, vertical, 0.0, 0.02).unwrap();
            body.step(0.02);
        }
        assert!(body.linear_velocity().norm() < 0.1);
    }

    #[test]
    fn test_torque_turns_toward_target() {
        let mut pilot = Autopilot::new(test_config()).unwrap();
        let config = pilot.config().torque;
        assert!(config.kp > 0.0);

        let mut body = SimBody::new(BodyConfig::default());
        let target = Quaternion::from_axis_angle(Vector3::y(), 0.8);
        let before = body.pose().angular_distance(&Pose::from_orientation(target));
        for _ in 0..50 {
            pilot.update_torque(&mut body, target, 0.02).unwrap();
            body.step(0.02);
        }
        let after = body.pose().angular_distance(&Pose::from_orientation(target));
        assert!(after < before);
    }

    #[test]
    fn test_autotuner_rewrites_main_gains_in_place() {
        let mut pilot = Autopilot::new(test_config()).unwrap();
        pilot.start_autotuning();
        assert!(pilot.is_autotuning());

        let mut body = SimBody::new(BodyConfig::default());
        let dt = 1.0 / 128.0;
        // Drive the forward error positive for half a second, then negative.
        let mut done = false;
        for i in 0..200 {
            let target = if i < 64 { 1.0 } else { -1.0 };
            pilot.update_main_thrust(&mut body, 0.0, target, dt).unwrap();
            if pilot.tuning_step(dt) {
                done = true;
                break;
            }
        }
        assert!(done);
        assert!(!pilot.is_autotuning());
        let gains = pilot.config().main_thrust;
        assert_relative_eq!(gains.oscillation_period, 0.5, epsilon = 1e-9);
        assert_relative_eq!(gains.kp, 0.6 * 2.0, epsilon = 1e-12);
        assert!(gains.ki > 0.0);
        assert!(gains.kd > 0.0);
    }
}
