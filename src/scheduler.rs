//! Cooperative two-task scheduler and the host-facing entry point.
//!
//! Exactly two logical tasks run here, each at its own fixed period: the
//! timing sequencer and the shooting machine. Within one pass the timing
//! task always runs (and publishes its phase) before the shooting task
//! consumes it; that ordering is the scheduler's invariant and is what
//! makes the phase snapshot race-free without locks.
//!
//! The host firmware calls [`CooperativeScheduler::tick`] from its main
//! loop; there are no other entry points.
//!
//! # Example
//!
//! ```rust
//! use rs_turret::config::TurretConfig;
//! use rs_turret::hal::{
//!     MockButton, MockCounter, MockMotorPwm, MockServoPwm, MockSwitch, MockThermalSensor,
//! };
//! use rs_turret::scheduler::CooperativeScheduler;
//!
//! let mut turret = CooperativeScheduler::assemble(
//!     MockButton::new(),
//!     MockMotorPwm::new(),
//!     MockCounter::new(65_536),
//!     MockServoPwm::new(),
//!     MockSwitch::new(),
//!     MockThermalSensor::new(32, 24),
//!     &TurretConfig::default(),
//! )
//! .unwrap();
//!
//! // Host main loop
//! for now_ms in 0..100 {
//!     turret.tick(now_ms);
//! }
//! ```

use crate::centroid::CentroidExtractor;
use crate::config::{ConfigError, SchedulerConfig, TurretConfig};
use crate::encoder::EncoderReader;
use crate::motor::MotorDriver;
use crate::pid::PositionController;
use crate::servo::ServoActuator;
use crate::shooter::{ShooterState, ShootingStateMachine};
use crate::thermal::ThermalFrameSource;
use crate::timing::{MatchPhase, TimingStateMachine};
use crate::traits::{
    DigitalOutput, FaultKind, MotorPwm, QuadratureCounter, ServoPwm, StartInput, ThermalSensor,
};

/// Full state snapshot for hosts, displays, and logs.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurretStatus {
    /// Phase published by the timing task.
    pub phase: MatchPhase,
    /// State of the shooting task.
    pub state: ShooterState,
    /// Last sampled encoder position (counts).
    pub position_counts: i64,
    /// Current aim target (counts).
    pub aim_target_counts: i64,
    /// Last commanded motor duty (percent).
    pub duty: f32,
    /// Darts fired since power-up.
    pub shots_fired: u32,
    /// Whether the flywheel line is enabled.
    pub flywheel_on: bool,
    /// Most recent recorded fault, if any.
    pub fault: Option<FaultKind>,
}

/// Runs the timing and shooting tasks at their fixed periods.
///
/// Single-threaded: each task runs its current state's logic to completion
/// before the other is considered. No task ever blocks, so a pass through
/// `tick` is bounded.
pub struct CooperativeScheduler<B, P, C, S, F, T>
where
    B: StartInput,
    P: MotorPwm,
    C: QuadratureCounter,
    S: ServoPwm,
    F: DigitalOutput,
    T: ThermalSensor,
{
    timing: TimingStateMachine<B>,
    shooting: ShootingStateMachine<P, C, S, F, T>,
    timing_period_ms: u64,
    shooting_period_ms: u64,
    timing_last_ms: Option<u64>,
    shooting_last_ms: Option<u64>,
}

impl<B, P, C, S, F, T> CooperativeScheduler<B, P, C, S, F, T>
where
    B: StartInput,
    P: MotorPwm,
    C: QuadratureCounter,
    S: ServoPwm,
    F: DigitalOutput,
    T: ThermalSensor,
{
    /// Create a scheduler over already-built machines.
    pub fn new(
        timing: TimingStateMachine<B>,
        shooting: ShootingStateMachine<P, C, S, F, T>,
        cfg: SchedulerConfig,
    ) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            timing,
            shooting,
            timing_period_ms: cfg.timing_period_ms,
            shooting_period_ms: cfg.shooting_period_ms,
            timing_last_ms: None,
            shooting_last_ms: None,
        })
    }

    /// Build every component of the turret from raw capabilities and one
    /// validated configuration.
    ///
    /// Any invalid calibration aborts construction; the scheduler never
    /// starts on a bad config.
    pub fn assemble(
        button: B,
        motor_pwm: P,
        counter: C,
        servo_pwm: S,
        flywheel: F,
        sensor: T,
        config: &TurretConfig,
    ) -> Result<Self, ConfigError> {
        let timing = TimingStateMachine::new(button, config.timing)?;
        let motor = MotorDriver::new(motor_pwm, config.motor)?;
        let encoder = EncoderReader::new(counter, config.encoder)?;
        let servo = ServoActuator::new(servo_pwm, config.servo)?;
        let camera = ThermalFrameSource::new(sensor, &config.thermal)?;
        let pid = PositionController::new(config.pid, config.motor.max_duty)?;
        let extractor = CentroidExtractor::new(&config.thermal)?;
        let shooting = ShootingStateMachine::new(
            motor,
            encoder,
            servo,
            flywheel,
            camera,
            pid,
            extractor,
            config.aim,
            config.scheduler.shooting_period_ms,
        )?;
        Self::new(timing, shooting, config.scheduler)
    }

    /// Run one scheduler pass at the given time. Never blocks.
    ///
    /// Each task runs when at least its period has elapsed since its last
    /// run; the timing task is always considered first so the shooting task
    /// reads the phase published this pass.
    pub fn tick(&mut self, now_ms: u64) {
        if Self::due(self.timing_last_ms, self.timing_period_ms, now_ms) {
            self.timing.tick(now_ms);
            self.timing_last_ms = Some(now_ms);
        }
        if Self::due(self.shooting_last_ms, self.shooting_period_ms, now_ms) {
            let phase = self.timing.phase();
            self.shooting.tick(phase, now_ms);
            self.shooting_last_ms = Some(now_ms);
        }
    }

    /// Snapshot of the whole system for hosts and displays.
    pub fn status(&self) -> TurretStatus {
        TurretStatus {
            phase: self.timing.phase(),
            state: self.shooting.state(),
            position_counts: self.shooting.position(),
            aim_target_counts: self.shooting.aim_target(),
            duty: self.shooting.commanded_duty(),
            shots_fired: self.shooting.shots_fired(),
            flywheel_on: self.shooting.flywheel_on(),
            fault: self.shooting.last_fault(),
        }
    }

    /// The timing task.
    pub fn timing(&self) -> &TimingStateMachine<B> {
        &self.timing
    }

    /// The timing task, mutably (simulation and tests).
    pub fn timing_mut(&mut self) -> &mut TimingStateMachine<B> {
        &mut self.timing
    }

    /// The shooting task.
    pub fn shooting(&self) -> &ShootingStateMachine<P, C, S, F, T> {
        &self.shooting
    }

    /// The shooting task, mutably (simulation and tests).
    pub fn shooting_mut(&mut self) -> &mut ShootingStateMachine<P, C, S, F, T> {
        &mut self.shooting
    }

    fn due(last_ms: Option<u64>, period_ms: u64, now_ms: u64) -> bool {
        match last_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= period_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{
        MockButton, MockCounter, MockMotorPwm, MockServoPwm, MockSwitch, MockThermalSensor,
    };

    type MockScheduler = CooperativeScheduler<
        MockButton,
        MockMotorPwm,
        MockCounter,
        MockServoPwm,
        MockSwitch,
        MockThermalSensor,
    >;

    fn turret(config: &TurretConfig) -> Result<MockScheduler, ConfigError> {
        CooperativeScheduler::assemble(
            MockButton::new(),
            MockMotorPwm::new(),
            MockCounter::new(65_536),
            MockServoPwm::new(),
            MockSwitch::new(),
            MockThermalSensor::new(32, 24),
            config,
        )
    }

    #[test]
    fn assemble_with_defaults() {
        let mut scheduler = turret(&TurretConfig::default()).unwrap();
        scheduler.tick(0);
        let status = scheduler.status();
        assert_eq!(status.phase, MatchPhase::WaitForInput);
        assert_eq!(status.state, ShooterState::WaitForStart);
        assert_eq!(status.shots_fired, 0);
    }

    #[test]
    fn bad_config_never_starts() {
        let config =
            TurretConfig::default().with_scheduler(SchedulerConfig::default().with_timing_period_ms(0));
        assert!(turret(&config).is_err());
    }

    #[test]
    fn tasks_respect_their_periods() {
        // 20 ms timing, 7 ms shooting; at t=0 both run, then shooting
        // leads until the timing period comes due again.
        let mut scheduler = turret(&TurretConfig::default()).unwrap();
        scheduler.tick(0);
        scheduler.timing_mut().input_mut().pressed = true;

        // Before the timing period elapses, the edge is not yet consumed.
        scheduler.tick(7);
        assert_eq!(scheduler.status().phase, MatchPhase::WaitForInput);

        // At 20 ms the timing task runs and opens the start window.
        scheduler.tick(20);
        assert_eq!(scheduler.status().phase, MatchPhase::Starting);
    }

    #[test]
    fn shooting_sees_phase_published_same_pass() {
        let mut scheduler = turret(&TurretConfig::default()).unwrap();
        scheduler.tick(0);
        scheduler.timing_mut().input_mut().pressed = true;

        // Single pass: timing publishes Starting, and the shooting task in
        // that same pass must already leave WaitForStart.
        scheduler.tick(20);
        assert_eq!(scheduler.status().phase, MatchPhase::Starting);
        assert_ne!(scheduler.status().state, ShooterState::WaitForStart);
    }
}
