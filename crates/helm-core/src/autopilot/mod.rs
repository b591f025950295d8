//! The autopilot: controller suite, configuration, and maneuver sequencing

mod agent;
mod config;
mod sequencer;

pub use agent::Autopilot;
pub use config::AutopilotConfig;
pub use sequencer::{ManeuverPhase, ManeuverSequencer};
