//! Autopilot configuration
//!
//! Gain presets and maneuver parameters, loadable from TOML. The core never
//! persists configuration; it only consumes values the host loaded or edited.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::control::GainSet;
use crate::{Error, Result};

/// Full autopilot configuration: gain sets, saturation limits, and the
/// maneuver parameters of the flight profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    /// Gains for the main (forward) thrust velocity loop
    pub main_thrust: GainSet,
    /// Gains for the lateral and vertical velocity loops
    pub side_thrust: GainSet,
    /// Gains for the orientation loop
    pub torque: GainSet,

    /// Symmetric output saturation for the main thrust loop
    pub main_output_limit: f64,
    /// Symmetric output saturation for the side/up thrust loops
    pub side_output_limit: f64,
    /// Symmetric output saturation for the torque loop
    pub torque_output_limit: f64,
    /// Integral accumulator bound shared by all loops
    pub integral_saturation: f64,

    /// Forward cruise speed commanded during the approach phase (m/s)
    pub cruise_speed: f64,
    /// Upper bound on the deceleration window, as a percentage of the
    /// initial target distance
    pub max_deceleration_percent: f64,
    /// Distance at which the vehicle switches to station-keeping (m)
    pub stopping_distance: f64,

    /// Scale applied to main thrust commands
    pub main_thrust_multiplier: f64,
    /// Scale applied to side thrust commands
    pub side_thrust_multiplier: f64,
    /// Scale applied to up thrust commands
    pub up_thrust_multiplier: f64,
    /// Scale applied to torque commands
    pub torque_multiplier: f64,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            main_thrust: GainSet::new(2.0, 0.0, 0.4),
            side_thrust: GainSet::new(1.5, 0.0, 0.1),
            torque: GainSet::new(12.0, 0.0, 0.22),
            main_output_limit: 2.0,
            side_output_limit: 1.0,
            torque_output_limit: 20.0,
            integral_saturation: 100.0,
            cruise_speed: 10.0,
            max_deceleration_percent: 45.0,
            stopping_distance: 15.0,
            main_thrust_multiplier: 1.0,
            side_thrust_multiplier: 1.0,
            up_thrust_multiplier: 1.0,
            torque_multiplier: 1.0,
        }
    }
}

impl AutopilotConfig {
    /// Parse a configuration from a TOML string
    ///
    /// Missing fields take their defaults, so partial presets are fine.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| Error::Config(format!("bad autopilot TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("cannot read {}: {e}", path.as_ref().display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check every parameter is usable
    ///
    /// A bad value here is a fatal configuration error; the autopilot
    /// refuses to construct rather than clamp or guess.
    pub fn validate(&self) -> Result<()> {
        self.main_thrust.validate()?;
        self.side_thrust.validate()?;
        self.torque.validate()?;

        for (name, v) in [
            ("main_output_limit", self.main_output_limit),
            ("side_output_limit", self.side_output_limit),
            ("torque_output_limit", self.torque_output_limit),
            ("integral_saturation", self.integral_saturation),
            ("cruise_speed", self.cruise_speed),
            ("stopping_distance", self.stopping_distance),
        ] {
            if !(v > 0.0) || !v.is_finite() {
                return Err(Error::Config(format!(
                    "{name} must be positive and finite, got {v}"
                )));
            }
        }
        if !(self.max_deceleration_percent > 0.0 && self.max_deceleration_percent <= 100.0) {
            return Err(Error::Config(format!(
                "max_deceleration_percent must be in (0, 100], got {}",
                self.max_deceleration_percent
            )));
        }
        for (name, v) in [
            ("main_thrust_multiplier", self.main_thrust_multiplier),
            ("side_thrust_multiplier", self.side_thrust_multiplier),
            ("up_thrust_multiplier", self.up_thrust_multiplier),
            ("torque_multiplier", self.torque_multiplier),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::Config(format!(
                    "{name} must be non-negative and finite, got {v}"
                )));
            }
        }
        Ok(())
    }
}
