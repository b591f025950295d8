//! Fixed-rate tick driver
//!
//! Runs a per-tick callback at a specified frequency on the current thread,
//! with timing statistics. The control core is single-threaded by design:
//! every controller is exclusively owned by one sequencer and updated once
//! per tick, so the driver deliberately offers no spawned variant.

use std::time::{Duration, Instant};

/// Configuration for a tick loop
#[derive(Debug, Clone)]
pub struct TickLoopConfig {
    /// Target tick rate in Hz
    pub rate_hz: f64,
    /// Name for logging/debugging
    pub name: String,
    /// Whether to warn on timing overruns
    pub warn_on_overrun: bool,
}

impl Default for TickLoopConfig {
    fn default() -> Self {
        Self {
            rate_hz: 50.0,
            name: "tick_loop".into(),
            warn_on_overrun: true,
        }
    }
}

impl TickLoopConfig {
    /// Create a new config with the given rate
    pub fn new(rate_hz: f64) -> Self {
        Self {
            rate_hz,
            ..Default::default()
        }
    }

    /// Set the loop name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Get the target tick period
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate_hz)
    }
}

/// Timing statistics for a tick loop
#[derive(Debug, Clone, Copy, Default)]
pub struct TickLoopStats {
    /// Number of ticks executed
    pub iterations: u64,
    /// Number of timing overruns
    pub overruns: u64,
    /// Total callback execution time
    pub total_execution_time: Duration,
    /// Maximum tick time
    pub max_tick_time: Duration,
    /// Minimum tick time
    pub min_tick_time: Duration,
    /// Last tick time
    pub last_tick_time: Duration,
}

impl TickLoopStats {
    fn update(&mut self, execution_time: Duration, target_period: Duration) {
        self.iterations += 1;
        self.total_execution_time += execution_time;
        self.last_tick_time = execution_time;

        if self.iterations == 1 {
            self.min_tick_time = execution_time;
            self.max_tick_time = execution_time;
        } else {
            self.min_tick_time = self.min_tick_time.min(execution_time);
            self.max_tick_time = self.max_tick_time.max(execution_time);
        }

        if execution_time > target_period {
            self.overruns += 1;
        }
    }

    /// Average tick time
    pub fn avg_tick_time(&self) -> Duration {
        if self.iterations == 0 {
            Duration::ZERO
        } else {
            self.total_execution_time.div_f64(self.iterations as f64)
        }
    }

    /// Fraction of ticks that overran the period (0.0 to 1.0)
    pub fn overrun_ratio(&self) -> f64 {
        if self.iterations == 0 {
            0.0
        } else {
            self.overruns as f64 / self.iterations as f64
        }
    }
}

/// A blocking fixed-rate tick loop
///
/// The callback receives the tick count and the fixed timestep in seconds,
/// and returns `true` to continue or `false` to stop. The timestep handed to
/// the callback is always the configured period: the control laws assume a
/// fixed physics step, so wall-clock jitter is absorbed by the pacing sleep
/// rather than leaked into `dt`.
///
/// # Example
/// ```
/// use helm_core::control::{TickLoop, TickLoopConfig};
///
/// let config = TickLoopConfig::new(1000.0).with_name("demo");
/// let stats = TickLoop::run(config, |tick, _dt| tick < 10);
/// assert_eq!(stats.iterations, 10);
/// ```
pub struct TickLoop;

impl TickLoop {
    /// Run the loop on the current thread until the callback returns `false`
    pub fn run<F>(config: TickLoopConfig, mut callback: F) -> TickLoopStats
    where
        F: FnMut(u64, f64) -> bool,
    {
        let period = config.period();
        let dt = period.as_secs_f64();
        let mut stats = TickLoopStats::default();
        let mut tick = 0u64;

        loop {
            let tick_start = Instant::now();

            let should_continue = callback(tick, dt);

            let execution_time = tick_start.elapsed();

            if !should_continue {
                break;
            }

            stats.update(execution_time, period);

            if let Some(sleep_time) = period.checked_sub(execution_time) {
                std::thread::sleep(sleep_time);
            } else if config.warn_on_overrun {
                tracing::warn!(
                    "{}: tick overrun by {:?}",
                    config.name,
                    execution_time - period
                );
            }

            tick += 1;
        }

        stats
    }

    /// Run the loop for at most `duration` of wall time
    pub fn run_for<F>(config: TickLoopConfig, duration: Duration, mut callback: F) -> TickLoopStats
    where
        F: FnMut(u64, f64) -> bool,
    {
        let start = Instant::now();
        Self::run(config, |tick, dt| {
            if start.elapsed() >= duration {
                return false;
            }
            callback(tick, dt)
        })
    }
}
