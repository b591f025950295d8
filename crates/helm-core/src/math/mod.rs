//! Math utilities for the autopilot: vectors, quaternions, and poses
//!
//! This module provides the mathematical primitives the control loops are
//! built on, backed by nalgebra for performance and correctness.

mod pose;
mod quaternion;

pub use pose::Pose;
pub use quaternion::Quaternion;

/// Type alias for 3D vectors
pub type Vector3 = nalgebra::Vector3<f64>;

/// Type alias for 4-component vectors (quaternion components in w-x-y-z order)
pub type Vector4 = nalgebra::Vector4<f64>;

/// Type alias for 3x3 rotation matrices
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Type alias for 4x4 matrices
pub type Matrix4 = nalgebra::Matrix4<f64>;
