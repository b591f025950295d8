//! Control systems for the autopilot
//!
//! Scalar, vector, and orientation PID loops, relay-based autotuning, and a
//! fixed-rate tick driver.

mod autotune;
mod orientation_pid;
mod pid;
mod tick_loop;
mod vector_pid;

pub use autotune::{Autotuner, TuningMethod};
pub use orientation_pid::{Component, OrientationPid};
pub use pid::{DerivativeMode, GainSet, PidState, ScalarPid};
pub use tick_loop::{TickLoop, TickLoopConfig, TickLoopStats};
pub use vector_pid::{Axis, VectorPid};
