//! Desktop match simulator.
//!
//! Runs the full turret core against mock hardware and a first-order plant
//! model: commanded duty becomes yaw velocity, yaw velocity becomes encoder
//! counts. A synthetic heat source sits off-axis, the start button is
//! pressed shortly after power-up, and the simulation runs one complete
//! match: pre-rotation, acquisition, the shot, and the return leg.
//!
//! # Run
//!
//! ```bash
//! cargo run --bin sim --features sim
//! ```

use anyhow::Context;
use rs_turret::hal::{
    MockMotorPwm, MockServoPwm, MockSwitch, SharedButton, SharedCounter, SharedThermal,
    SystemClock,
};
use rs_turret::traits::{Clock, FrameCells};
use rs_turret::{CooperativeScheduler, MatchPhase, ShooterState, TurretConfig};

/// Sensor geometry for the simulated camera.
const FRAME_WIDTH: usize = 32;
/// Rows in the simulated camera.
const FRAME_HEIGHT: usize = 24;
/// Simulated yaw speed at full duty, in encoder counts per second.
const FULL_DUTY_COUNTS_PER_S: f64 = 40_000.0;
/// Where the simulated heat source sits.
const HOT_COLUMN: usize = 24;
/// How long the simulation may run before giving up (ms).
const DEADLINE_MS: u64 = 30_000;

fn hotspot_scene(hot_col: usize, hot_row: usize) -> anyhow::Result<FrameCells> {
    let mut cells = FrameCells::new();
    for row in 0..FRAME_HEIGHT {
        for col in 0..FRAME_WIDTH {
            let temp = if col == hot_col && row == hot_row {
                36.0
            } else {
                20.0
            };
            cells
                .push(temp)
                .ok()
                .context("frame capacity exceeded")?;
        }
    }
    Ok(cells)
}

fn main() -> anyhow::Result<()> {
    println!();
    println!("================================");
    println!("  rs-turret match simulator");
    println!("================================");
    println!();

    let wall_clock = SystemClock::new();
    let config = TurretConfig::default();
    config.validate()?;

    let button = SharedButton::new();
    let counter = SharedCounter::new(65_536);
    let sensor = SharedThermal::new(FRAME_WIDTH, FRAME_HEIGHT, 5);
    sensor.set_scene(hotspot_scene(HOT_COLUMN, 10)?);

    let mut turret = CooperativeScheduler::assemble(
        button.clone(),
        MockMotorPwm::new(),
        counter.clone(),
        MockServoPwm::new(),
        MockSwitch::new(),
        sensor.clone(),
        &config,
    )?;
    println!("[OK] Turret assembled ({FRAME_WIDTH}x{FRAME_HEIGHT} sensor, hotspot at column {HOT_COLUMN})");

    // Plant state: exact yaw position in counts, with the fractional part
    // carried between steps.
    let mut yaw_counts = 0.0f64;
    let mut matches_completed = false;

    let mut last_phase = MatchPhase::WaitForInput;
    let mut last_state = ShooterState::Init;

    for now_ms in 0..DEADLINE_MS {
        if now_ms == 200 {
            println!("[{now_ms:>6} ms] start button pressed");
            button.press();
        }
        if now_ms == 400 {
            button.release();
        }

        turret.tick(now_ms);

        // First-order plant: duty drives yaw velocity directly.
        let duty = turret.shooting().commanded_duty();
        let before = yaw_counts.round() as i64;
        yaw_counts += f64::from(duty) / 100.0 * FULL_DUTY_COUNTS_PER_S / 1_000.0;
        counter.advance(yaw_counts.round() as i64 - before);

        let status = turret.status();
        if status.phase != last_phase || status.state != last_state {
            println!(
                "[{now_ms:>6} ms] phase={:<14} state={:<14} pos={:>6} target={:>6} duty={:>6.1}",
                status.phase.as_str(),
                status.state.as_str(),
                status.position_counts,
                status.aim_target_counts,
                status.duty,
            );
            last_phase = status.phase;
            last_state = status.state;
        }
        if let Some(fault) = turret.shooting_mut().take_fault() {
            println!("[{now_ms:>6} ms] fault recorded: {}", fault.as_str());
        }

        // One full cycle: a shot taken and the machine re-armed.
        if status.shots_fired > 0
            && status.state == ShooterState::WaitForStart
            && status.phase == MatchPhase::WaitForInput
        {
            matches_completed = true;
            println!();
            println!(
                "match complete: {now_ms} ms simulated in {} ms wall-clock",
                wall_clock.now_ms()
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&status).context("status serialization")?
            );
            break;
        }
    }

    anyhow::ensure!(
        matches_completed,
        "simulation deadline reached without completing a match"
    );
    Ok(())
}
