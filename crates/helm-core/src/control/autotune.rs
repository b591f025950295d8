//! Relay-based PID autotuning
//!
//! Watches a live controller's error signal for zero crossings, measures the
//! oscillation period, and derives gains with the Ziegler-Nichols rules.

use super::GainSet;

/// Tuning rule used to derive gains from the observed oscillation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningMethod {
    ZieglerNichols,
}

/// Relay autotuner
///
/// While active, the attached gain set's integral and derivative gains are
/// held at zero so only proportional action drives the loop; the caller is
/// responsible for raising the proportional gain until the loop oscillates.
/// Once one half-cycle of oscillation has been observed, the Ziegler-Nichols
/// rules are written into the gain set and tuning reports completion.
///
/// If the loop never oscillates, [`Autotuner::update`] simply keeps
/// returning `false`; bound that with a timeout on [`Autotuner::elapsed`].
#[derive(Debug, Clone, Copy)]
pub struct Autotuner {
    method: TuningMethod,
    clock: f64,
    oscillation_start: f64,
    oscillation_end: f64,
    oscillating: bool,
}

impl Autotuner {
    /// Create a new autotuner
    pub fn new(method: TuningMethod) -> Self {
        Self {
            method,
            clock: 0.0,
            oscillation_start: 0.0,
            oscillation_end: 0.0,
            oscillating: false,
        }
    }

    /// Change the tuning method
    pub fn set_method(&mut self, method: TuningMethod) {
        self.method = method;
    }

    /// Time observed so far, in seconds
    pub fn elapsed(&self) -> f64 {
        self.clock
    }

    /// Observe one tick of the attached controller's error signal
    ///
    /// `error` is the controller's most recent raw error, `dt` the tick
    /// duration. Returns `true` when tuning has completed and the gain set
    /// has been rewritten.
    pub fn update(&mut self, gains: &mut GainSet, error: f64, dt: f64) -> bool {
        self.clock += dt;
        match self.method {
            TuningMethod::ZieglerNichols => self.ziegler_nichols(gains, error),
        }
    }

    fn ziegler_nichols(&mut self, gains: &mut GainSet, error: f64) -> bool {
        // Proportional action only while tuning; P itself is raised by the
        // caller until the loop goes marginally stable.
        gains.ki = 0.0;
        gains.kd = 0.0;

        if error > 0.0 && !self.oscillating {
            self.oscillation_start = self.clock;
            self.oscillating = true;
        } else if error < 0.0 && self.oscillating {
            self.oscillation_end = self.clock;
            self.oscillating = false;

            let ku = gains.kp;
            let tu = self.oscillation_end - self.oscillation_start;

            gains.kp = 0.6 * ku;
            gains.ki = 2.0 * gains.kp / tu;
            gains.kd = gains.kp * tu / 8.0;
            gains.oscillation_period = tu;

            tracing::info!(
                ku,
                tu,
                kp = gains.kp,
                ki = gains.ki,
                kd = gains.kd,
                "relay tuning complete"
            );
            return true;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ziegler_nichols_formulas() {
        let ku = 4.0;
        let mut gains = GainSet::new(ku, 0.7, 0.3);
        let mut tuner = Autotuner::new(TuningMethod::ZieglerNichols);

        // Power-of-two tick so the accumulated clock is exact: the error is
        // positive for 64 ticks (0.5 s), then goes negative.
        let dt = 1.0 / 128.0;
        let mut tuned_at = None;
        for i in 0..200 {
            let error = if i < 64 { 1.0 } else { -1.0 };
            if tuner.update(&mut gains, error, dt) {
                tuned_at = Some(i);
                break;
            }
        }

        assert_eq!(tuned_at, Some(64));
        let tu = 0.5;
        assert_relative_eq!(gains.oscillation_period, tu, epsilon = 1e-12);
        assert_relative_eq!(gains.kp, 0.6 * ku, epsilon = 1e-12);
        assert_relative_eq!(gains.ki, 2.0 * gains.kp / tu, epsilon = 1e-12);
        assert_relative_eq!(gains.kd, gains.kp * tu / 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_holds_integral_and_derivative_at_zero_while_active() {
        let mut gains = GainSet::new(2.0, 5.0, 5.0);
        let mut tuner = Autotuner::new(TuningMethod::ZieglerNichols);
        assert!(!tuner.update(&mut gains, 1.0, 0.01));
        assert_eq!(gains.ki, 0.0);
        assert_eq!(gains.kd, 0.0);
        assert_eq!(gains.kp, 2.0);
    }

    #[test]
    fn test_one_signed_error_never_completes() {
        let mut gains = GainSet::p(3.0);
        let mut tuner = Autotuner::new(TuningMethod::ZieglerNichols);
        for _ in 0..10_000 {
            assert!(!tuner.update(&mut gains, 1.0, 0.01));
        }
        // Not fatal; the caller imposes the timeout.
        assert!(tuner.elapsed() > 99.0);
        assert_eq!(gains.kp, 3.0);
    }

    #[test]
    fn test_negative_start_is_not_an_edge() {
        // Error starting negative must not be mistaken for a falling edge.
        let mut gains = GainSet::p(1.0);
        let mut tuner = Autotuner::new(TuningMethod::ZieglerNichols);
        for _ in 0..10 {
            assert!(!tuner.update(&mut gains, -1.0, 0.01));
        }
        // Rising then falling edge completes as usual afterwards.
        assert!(!tuner.update(&mut gains, 1.0, 0.01));
        assert!(tuner.update(&mut gains, -1.0, 0.01));
    }
}
