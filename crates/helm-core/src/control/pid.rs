//! Scalar PID feedback loop
//!
//! A single-axis PID controller with integral windup clamping, dual
//! derivative modes, optional derivative smoothing, and output saturation.
//! The composite controllers ([`crate::control::VectorPid`],
//! [`crate::control::OrientationPid`]) are built from arrays of these.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Which signal feeds the derivative term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DerivativeMode {
    /// Derive on the measured value (`-(value - prev_value) / dt`).
    ///
    /// Standard technique to avoid "derivative kick" when the setpoint
    /// jumps; use for velocity tracking.
    Velocity,
    /// Derive on the error (`(error - prev_error) / dt`).
    ///
    /// Use when the target itself moves relative to the controlled value,
    /// e.g. position tracking.
    ErrorRate,
}

/// A mutable set of PID gains
///
/// Owned by the autopilot and pushed down into the bound controllers at the
/// top of every tick, so live edits and autotuner writes take effect on the
/// same tick they are made.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GainSet {
    /// Proportional gain
    pub kp: f64,
    /// Integral gain
    pub ki: f64,
    /// Derivative gain
    pub kd: f64,
    /// Oscillation period measured by the last relay-tuning run (seconds)
    pub oscillation_period: f64,
    /// Low-pass smoothing factor for the derivative term (0-1, 1 = no smoothing)
    pub lowpass_alpha: f64,
}

impl Default for GainSet {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.0,
            kd: 0.0,
            oscillation_period: 0.0,
            lowpass_alpha: 1.0,
        }
    }
}

impl GainSet {
    /// Create a new gain set with the given gains
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            ..Default::default()
        }
    }

    /// Create a P-only gain set
    pub fn p(kp: f64) -> Self {
        Self::new(kp, 0.0, 0.0)
    }

    /// Create a PI gain set
    pub fn pi(kp: f64, ki: f64) -> Self {
        Self::new(kp, ki, 0.0)
    }

    /// Create a PD gain set
    pub fn pd(kp: f64, kd: f64) -> Self {
        Self::new(kp, 0.0, kd)
    }

    /// Set the derivative low-pass smoothing factor
    pub fn with_lowpass(mut self, alpha: f64) -> Self {
        self.lowpass_alpha = alpha;
        self
    }

    /// Check that every field is usable
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("kp", self.kp),
            ("ki", self.ki),
            ("kd", self.kd),
            ("oscillation_period", self.oscillation_period),
        ] {
            if !v.is_finite() {
                return Err(Error::Config(format!("gain {name} must be finite, got {v}")));
            }
        }
        if !(0.0..=1.0).contains(&self.lowpass_alpha) {
            return Err(Error::Config(format!(
                "lowpass_alpha must be in [0, 1], got {}",
                self.lowpass_alpha
            )));
        }
        Ok(())
    }
}

/// Scalar PID controller internal state
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PidState {
    /// Accumulated integral term
    pub integral: f64,
    /// Previous raw error
    pub prev_error: f64,
    /// Previous measured value
    pub prev_value: f64,
    /// Smoothed derivative sample
    pub derivative_filtered: f64,
    /// Previous output
    pub prev_output: f64,
    /// Whether a prior sample exists for the derivative
    pub derivative_initialized: bool,
}

/// A single-axis PID feedback loop
///
/// Not idempotent: every `update` mutates the integral accumulator and the
/// previous-sample state. `reset` returns the controller to its
/// construction-time state.
///
/// # Example
/// ```
/// use helm_core::control::{DerivativeMode, GainSet, ScalarPid};
///
/// let mut pid = ScalarPid::new(GainSet::new(1.0, 0.1, 0.05))
///     .with_limits(-10.0, 10.0)
///     .with_integral_limit(5.0);
///
/// let output = pid.update(0.5, 1.0, 0.02, DerivativeMode::Velocity).unwrap();
/// assert!(output > 0.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ScalarPid {
    gains: GainSet,
    output_min: f64,
    output_max: f64,
    integral_saturation: f64,
    state: PidState,
}

impl ScalarPid {
    /// Create a new controller with the given gains
    ///
    /// Defaults: output clamped to [-1, 1], unbounded integral.
    pub fn new(gains: GainSet) -> Self {
        Self {
            gains,
            output_min: -1.0,
            output_max: 1.0,
            integral_saturation: f64::INFINITY,
            state: PidState::default(),
        }
    }

    /// Set the output saturation limits
    pub fn with_limits(mut self, min: f64, max: f64) -> Self {
        self.output_min = min;
        self.output_max = max;
        self
    }

    /// Set the integral accumulator bound (windup clamp)
    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.integral_saturation = limit;
        self
    }

    /// Replace the gains (push-down from the owning gain set)
    pub fn set_gains(&mut self, gains: &GainSet) {
        self.gains = *gains;
    }

    /// Get the current gains
    pub fn gains(&self) -> &GainSet {
        &self.gains
    }

    /// Get the internal state
    pub fn state(&self) -> &PidState {
        &self.state
    }

    /// The most recent raw error (autotuner input)
    pub fn error(&self) -> f64 {
        self.state.prev_error
    }

    /// Run one feedback step
    ///
    /// Error is `target - current`. The integral accumulator is clamped to
    /// the integral saturation bound and the output to the output limits.
    /// On the very first call after construction or reset the derivative
    /// term is forced to zero, since no prior sample exists.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if `dt` is not a positive finite number.
    pub fn update(
        &mut self,
        current: f64,
        target: f64,
        dt: f64,
        mode: DerivativeMode,
    ) -> Result<f64> {
        check_dt(dt)?;

        let error = target - current;
        let p_term = self.gains.kp * error;

        self.state.integral = (self.state.integral + error * dt)
            .clamp(-self.integral_saturation, self.integral_saturation);
        let i_term = self.gains.ki * self.state.integral;

        // Both derivative samples advance every call; the mode only selects
        // which one feeds the D term.
        let error_rate = (error - self.state.prev_error) / dt;
        self.state.prev_error = error;

        let value_rate = (current - self.state.prev_value) / dt;
        self.state.prev_value = current;

        let raw_derivative = if self.state.derivative_initialized {
            match mode {
                DerivativeMode::Velocity => -value_rate,
                DerivativeMode::ErrorRate => error_rate,
            }
        } else {
            self.state.derivative_initialized = true;
            0.0
        };
        let d_term = self.gains.kd * self.smooth_derivative(raw_derivative);

        let output = (p_term + i_term + d_term).clamp(self.output_min, self.output_max);
        self.state.prev_output = output;
        Ok(output)
    }

    /// Run one feedback step from a pre-computed error and rate sample
    ///
    /// Used by the orientation controller, which supplies per-quaternion-
    /// component errors and angular-velocity-adjusted rate samples directly.
    /// The derivative is `rate / dt`; integral and output clamping behave
    /// exactly as in [`ScalarPid::update`].
    pub fn update_raw(&mut self, error: f64, rate: f64, dt: f64) -> Result<f64> {
        check_dt(dt)?;

        self.state.integral = (self.state.integral + error * dt)
            .clamp(-self.integral_saturation, self.integral_saturation);

        let derivative = rate / dt;
        let output = (self.gains.kp * error
            + self.gains.ki * self.state.integral
            + self.gains.kd * derivative)
            .clamp(self.output_min, self.output_max);

        self.state.prev_error = error;
        self.state.prev_output = output;
        Ok(output)
    }

    /// Reset the controller to its construction-time state
    pub fn reset(&mut self) {
        self.state = PidState::default();
    }

    fn smooth_derivative(&mut self, raw: f64) -> f64 {
        let alpha = self.gains.lowpass_alpha.clamp(0.0, 1.0);
        self.state.derivative_filtered += alpha * (raw - self.state.derivative_filtered);
        self.state.derivative_filtered
    }
}

fn check_dt(dt: f64) -> Result<()> {
    if !(dt > 0.0 && dt.is_finite()) {
        return Err(Error::InvalidArgument(format!(
            "dt must be positive and finite, got {dt}"
        )));
    }
    Ok(())
}
