//! Fly the simulated vehicle to a target and hold station there.
//!
//! Run with: cargo run --example flight_demo

use helm_core::autopilot::{Autopilot, AutopilotConfig, ManeuverSequencer};
use helm_core::RigidBody;
use helm_core::control::{TickLoop, TickLoopConfig};
use helm_core::math::Pose;
use helm_core::sim::{BodyConfig, SimBody};

/// Simulated physics step (50 Hz flight dynamics)
const SIM_DT: f64 = 0.02;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("helm_core=debug")),
        )
        .init();

    let config = AutopilotConfig::default();
    let autopilot = Autopilot::new(config).expect("default config is valid");
    let mut sequencer = ManeuverSequencer::new(autopilot);
    let mut body = SimBody::new(BodyConfig::default());
    let target = Pose::from_position(0.0, 0.0, 100.0);

    sequencer.enter(&body, &target);

    // Drive the 50 Hz flight dynamics at 10x real time.
    let loop_config = TickLoopConfig::new(500.0).with_name("flight_demo");
    let stats = TickLoop::run(loop_config, |tick, _dt| {
        sequencer
            .update(&mut body, &target, SIM_DT)
            .expect("maneuver tick failed");
        body.step(SIM_DT);

        if tick % 100 == 0 {
            tracing::info!(
                t = body.sim_time(),
                phase = ?sequencer.phase(),
                distance = body.pose().distance(&target),
                speed = body.linear_velocity().norm(),
            );
        }

        // Fly 45 simulated seconds, then report.
        tick < (45.0 / SIM_DT) as u64
    });

    tracing::info!(
        ticks = stats.iterations,
        overruns = stats.overruns,
        final_distance = body.pose().distance(&target),
        final_speed = body.linear_velocity().norm(),
        "flight complete"
    );
}
