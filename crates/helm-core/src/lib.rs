//! helm-core: cascaded-PID spacecraft autopilot
//!
//! A 6-degree-of-freedom autopilot built from PID feedback loops driving a
//! rigid-body actuator (thrust and torque), plus a relay-based autotuner and
//! a maneuver state machine that flies a vehicle from an arbitrary pose to a
//! target pose and holds station there.
//!
//! # Modules
//!
//! - [`math`] - Vector/quaternion/pose utilities built on nalgebra
//! - [`control`] - Scalar, vector and orientation PID loops, relay autotuning,
//!   and a fixed-rate tick driver
//! - [`body`] - The physics boundary: rigid-body read/write traits
//! - [`autopilot`] - Controller suite, configuration, and the maneuver sequencer
//! - [`sim`] - A minimal 6-DOF rigid-body integrator for tests and demos
//!
//! # Architecture
//!
//! ```text
//! ManeuverSequencer ──phase dispatch──► Autopilot ──thrust/torque──► RigidBody
//!        │                                  │
//!        └──── reads pose/velocity ◄────────┴──── Autotuner mutates GainSet
//! ```
//!
//! The whole core is single-threaded and tick-driven: one `update(dt)` per
//! fixed physics step, invoked by an external scheduler (or [`control::TickLoop`]).

#![warn(unused_must_use)]

pub mod autopilot;
pub mod body;
pub mod control;
pub mod math;
pub mod sim;

// Re-exports for convenience
pub use autopilot::{Autopilot, AutopilotConfig, ManeuverPhase, ManeuverSequencer};
pub use body::{ForceMode, RigidBody};
pub use control::{Autotuner, DerivativeMode, GainSet, OrientationPid, ScalarPid, VectorPid};
pub use math::{Pose, Quaternion, Vector3};
pub use sim::SimBody;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for helm-core
///
/// All errors should be handled appropriately. Use pattern matching to handle
/// specific error cases, or use `?` to propagate errors.
#[derive(Debug, thiserror::Error)]
#[must_use = "errors must be handled or explicitly ignored with let _ = ..."]
#[non_exhaustive]
pub enum Error {
    /// A caller violated a call-site precondition (e.g. `dt <= 0`).
    /// This is a programming error, not a recoverable runtime condition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid configuration value (non-finite gain, non-positive limit, ...).
    /// Rejected at construction time, never at `update` time.
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation attempted in an invalid state (e.g. sequencer updated
    /// before a maneuver was entered).
    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias for helm-core operations
pub type Result<T> = std::result::Result<T, Error>;
