//! End-to-end match tests for the full turret core.
//!
//! The scheduler runs against shared mocks and a first-order plant model:
//! commanded duty becomes yaw velocity, yaw velocity becomes encoder counts.

use rs_turret::hal::{MockMotorPwm, MockServoPwm, MockSwitch, SharedButton, SharedCounter, SharedThermal};
use rs_turret::traits::FrameCells;
use rs_turret::{CooperativeScheduler, MatchPhase, ShooterState, TurretConfig};

const W: usize = 32;
const H: usize = 24;

/// Simulated yaw speed at full duty, in counts per millisecond.
const FULL_DUTY_COUNTS_PER_MS: f64 = 40.0;

type Turret = CooperativeScheduler<
    SharedButton,
    MockMotorPwm,
    SharedCounter,
    MockServoPwm,
    MockSwitch,
    SharedThermal,
>;

fn scene(hot_col: Option<usize>) -> FrameCells {
    let mut cells = FrameCells::new();
    for row in 0..H {
        for col in 0..W {
            let temp = if Some(col) == hot_col && row == 10 {
                36.0
            } else {
                20.0
            };
            cells.push(temp).unwrap();
        }
    }
    cells
}

struct Rig {
    turret: Turret,
    button: SharedButton,
    counter: SharedCounter,
    sensor: SharedThermal,
    yaw: f64,
}

impl Rig {
    fn new(hot_col: Option<usize>) -> Self {
        let button = SharedButton::new();
        let counter = SharedCounter::new(65_536);
        let sensor = SharedThermal::new(W, H, 5);
        sensor.set_scene(scene(hot_col));

        let turret = CooperativeScheduler::assemble(
            button.clone(),
            MockMotorPwm::new(),
            counter.clone(),
            MockServoPwm::new(),
            MockSwitch::new(),
            sensor.clone(),
            &TurretConfig::default(),
        )
        .unwrap();
        Self {
            turret,
            button,
            counter,
            sensor,
            yaw: 0.0,
        }
    }

    /// One millisecond of simulated time: scheduler pass, then plant step.
    fn step(&mut self, now_ms: u64) {
        self.turret.tick(now_ms);
        let duty = self.turret.shooting().commanded_duty();
        let before = self.yaw.round() as i64;
        self.yaw += f64::from(duty) / 100.0 * FULL_DUTY_COUNTS_PER_MS;
        self.counter.advance(self.yaw.round() as i64 - before);
    }

    fn run(&mut self, from_ms: u64, to_ms: u64) {
        for now_ms in from_ms..to_ms {
            self.step(now_ms);
        }
    }
}

#[test]
fn full_match_fires_exactly_once_and_returns() {
    let mut rig = Rig::new(Some(24));
    let config = TurretConfig::default();

    rig.run(0, 200);
    rig.button.press();
    rig.run(200, 400);
    rig.button.release();

    let mut aim_error_at_shot: Option<i64> = None;
    for now_ms in 400..25_000 {
        rig.step(now_ms);
        let status = rig.turret.status();
        if status.shots_fired == 1 && aim_error_at_shot.is_none() {
            aim_error_at_shot = Some((status.position_counts - status.aim_target_counts).abs());
        }
        if status.shots_fired > 0
            && status.state == ShooterState::WaitForStart
            && status.phase == MatchPhase::WaitForInput
        {
            break;
        }
    }

    let status = rig.turret.status();
    assert_eq!(status.shots_fired, 1, "exactly one shot per match");
    assert_eq!(status.state, ShooterState::WaitForStart);
    assert_eq!(status.phase, MatchPhase::WaitForInput);
    assert!(!status.flywheel_on);

    // The shot happened with the turret settled on the target.
    let err = aim_error_at_shot.expect("a shot was taken");
    assert!(err <= config.aim.aim_tolerance_counts, "aim error {err}");

    // And the return leg brought the turret near its reference.
    assert!(status.position_counts.abs() <= config.aim.return_tolerance_counts);
}

#[test]
fn aim_converges_on_the_hotspot_offset() {
    // Hot cell at column 24 of 32 with a 55-degree field of view.
    let mut rig = Rig::new(Some(24));
    let config = TurretConfig::default();

    rig.run(0, 200);
    rig.button.press();
    rig.run(200, 400);
    rig.button.release();
    // Run well into the shoot window.
    rig.run(400, 8_000);

    let deg_per_col = config.thermal.fov_deg / W as f32;
    let offset_deg = (24.0 - W as f32 / 2.0) * deg_per_col;
    let expected = config.aim.prerotation_counts
        + (offset_deg * config.aim.counts_per_degree) as i64;

    let status = rig.turret.status();
    assert!(
        (status.aim_target_counts - expected).abs() <= 2,
        "target {} vs expected {expected}",
        status.aim_target_counts
    );
    assert!((status.position_counts - expected).abs() <= config.aim.aim_tolerance_counts);
}

#[test]
fn no_start_edge_means_no_motion() {
    let mut rig = Rig::new(Some(24));
    rig.run(0, 2_000);

    let status = rig.turret.status();
    assert_eq!(status.phase, MatchPhase::WaitForInput);
    assert_eq!(status.state, ShooterState::WaitForStart);
    assert_eq!(status.duty, 0.0);
    assert_eq!(status.position_counts, 0);
    assert_eq!(status.shots_fired, 0);
}

#[test]
fn moving_hotspot_retargets_every_tick() {
    let mut rig = Rig::new(Some(24));

    rig.run(0, 200);
    rig.button.press();
    rig.run(200, 400);
    rig.button.release();
    rig.run(400, 3_000);
    let first_target = rig.turret.status().aim_target_counts;

    // The heat source moves to the other side of the axis.
    rig.sensor.set_scene(scene(Some(8)));
    rig.run(3_000, 4_500);
    let second_target = rig.turret.status().aim_target_counts;

    let prerotation = TurretConfig::default().aim.prerotation_counts;
    assert!(first_target > prerotation, "hotspot right of axis");
    assert!(second_target < prerotation, "hotspot left of axis");
}

#[test]
fn second_match_rearms_and_fires_again() {
    let mut rig = Rig::new(Some(24));

    // First match.
    rig.run(0, 200);
    rig.button.press();
    rig.run(200, 400);
    rig.button.release();
    rig.run(400, 22_000);
    assert_eq!(rig.turret.status().shots_fired, 1);
    assert_eq!(rig.turret.status().phase, MatchPhase::WaitForInput);

    // Second match on a fresh edge.
    rig.button.press();
    rig.run(22_000, 22_200);
    rig.button.release();
    rig.run(22_200, 44_000);

    let status = rig.turret.status();
    assert_eq!(status.shots_fired, 2, "one shot per match, re-armed");
    assert_eq!(status.state, ShooterState::WaitForStart);
}
