//! Three-axis position/velocity PID controller

use crate::math::Vector3;
use crate::Result;

use super::{DerivativeMode, GainSet, ScalarPid};

/// Axis selector for per-axis gain overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Three independent scalar PID loops composed for 3-axis control
///
/// There is no cross-axis coupling inside the controller; coupling, where
/// wanted, is applied by the caller before or after the update.
#[derive(Debug, Clone, Copy)]
pub struct VectorPid {
    axes: [ScalarPid; 3],
}

impl VectorPid {
    /// Create a new controller with the same gains on every axis
    pub fn new(gains: GainSet) -> Self {
        Self {
            axes: [ScalarPid::new(gains); 3],
        }
    }

    /// Set the output saturation limits on every axis
    pub fn with_limits(mut self, min: f64, max: f64) -> Self {
        for axis in &mut self.axes {
            *axis = axis.with_limits(min, max);
        }
        self
    }

    /// Set the integral windup bound on every axis
    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        for axis in &mut self.axes {
            *axis = axis.with_integral_limit(limit);
        }
        self
    }

    /// Replace the gains on every axis
    pub fn set_gains(&mut self, gains: &GainSet) {
        for axis in &mut self.axes {
            axis.set_gains(gains);
        }
    }

    /// Replace the gains on a single axis
    pub fn set_axis_gains(&mut self, axis: Axis, gains: &GainSet) {
        self.axes[axis as usize].set_gains(gains);
    }

    /// Position-error tracking update (error-rate derivative)
    pub fn update_position(
        &mut self,
        current: Vector3,
        target: Vector3,
        dt: f64,
    ) -> Result<Vector3> {
        Ok(Vector3::new(
            self.axes[0].update(current.x, target.x, dt, DerivativeMode::ErrorRate)?,
            self.axes[1].update(current.y, target.y, dt, DerivativeMode::ErrorRate)?,
            self.axes[2].update(current.z, target.z, dt, DerivativeMode::ErrorRate)?,
        ))
    }

    /// Velocity tracking update (derivative on measurement)
    pub fn update_velocity(
        &mut self,
        current: Vector3,
        target: Vector3,
        dt: f64,
    ) -> Result<Vector3> {
        Ok(Vector3::new(
            self.axes[0].update(current.x, target.x, dt, DerivativeMode::Velocity)?,
            self.axes[1].update(current.y, target.y, dt, DerivativeMode::Velocity)?,
            self.axes[2].update(current.z, target.z, dt, DerivativeMode::Velocity)?,
        ))
    }

    /// Reset every axis to its construction-time state
    pub fn reset(&mut self) {
        for axis in &mut self.axes {
            axis.reset();
        }
    }

    /// The most recent raw error on the forward (Z) axis
    ///
    /// The sequencer drives only local Z through this controller, so the
    /// forward axis is the error signal a relay autotuner observes.
    pub fn error(&self) -> f64 {
        self.axes[2].error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_axes_independent() {
        let mut pid = VectorPid::new(GainSet::p(2.0)).with_limits(-100.0, 100.0);
        let out = pid
            .update_position(Vector3::zeros(), Vector3::new(1.0, -2.0, 3.0), 0.02)
            .unwrap();
        assert_relative_eq!(out.x, 2.0, epsilon = 1e-10);
        assert_relative_eq!(out.y, -4.0, epsilon = 1e-10);
        assert_relative_eq!(out.z, 6.0, epsilon = 1e-10);
    }

    #[test]
    fn test_per_axis_gains() {
        let mut pid = VectorPid::new(GainSet::p(1.0)).with_limits(-100.0, 100.0);
        pid.set_axis_gains(Axis::Z, &GainSet::p(10.0));
        let out = pid
            .update_velocity(Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0), 0.02)
            .unwrap();
        assert_relative_eq!(out.x, 1.0, epsilon = 1e-10);
        assert_relative_eq!(out.z, 10.0, epsilon = 1e-10);
    }

    #[test]
    fn test_dt_precondition_propagates() {
        let mut pid = VectorPid::new(GainSet::p(1.0));
        assert!(pid
            .update_velocity(Vector3::zeros(), Vector3::zeros(), 0.0)
            .is_err());
    }

    #[test]
    fn test_forward_axis_error() {
        let mut pid = VectorPid::new(GainSet::p(1.0)).with_limits(-100.0, 100.0);
        pid.update_velocity(Vector3::new(0.0, 0.0, 4.0), Vector3::new(0.0, 0.0, 10.0), 0.02)
            .unwrap();
        assert_relative_eq!(pid.error(), 6.0, epsilon = 1e-10);
    }

    #[test]
    fn test_reset() {
        let mut pid = VectorPid::new(GainSet::pi(1.0, 1.0)).with_limits(-100.0, 100.0);
        pid.update_velocity(Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0), 0.1)
            .unwrap();
        pid.reset();
        assert_relative_eq!(pid.error(), 0.0);
        let out = pid
            .update_velocity(Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0), 0.1)
            .unwrap();
        // Fresh integral after reset: P + I = 1.0 + 0.1
        assert_relative_eq!(out.z, 1.1, epsilon = 1e-10);
    }
}
