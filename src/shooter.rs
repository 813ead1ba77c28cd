//! Aim-fire-reset task.
//!
//! Owns every actuator and sensor on the turret: the yaw motor and encoder,
//! the trigger servo, the flywheel line, and the thermal camera. Each tick
//! it reads the phase published by the timing task and advances its own
//! state machine. All faults are resolved or degraded before the tick
//! returns; nothing propagates across the task boundary.
//!
//! The locate and target states are fused per tick: `Locate` runs one
//! extraction and hands off, then `Target` re-locates on every tick while
//! driving the loop, so the aim point tracks a moving heat source until the
//! settle window and the shoot phase line up.

use crate::centroid::CentroidExtractor;
use crate::config::{AimConfig, ConfigError};
use crate::encoder::EncoderReader;
use crate::motor::MotorDriver;
use crate::pid::PositionController;
use crate::servo::ServoActuator;
use crate::thermal::ThermalFrameSource;
use crate::timing::MatchPhase;
use crate::traits::{
    DigitalOutput, FaultKind, MotorPwm, QuadratureCounter, ServoPwm, ThermalSensor,
};

/// States of the shooting task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ShooterState {
    /// One-shot setup: safe all actuators, reset the controller.
    Init,
    /// Holding with the pre-rotation target staged, waiting for the start.
    WaitForStart,
    /// First thermal extraction of the engagement.
    Locate,
    /// Closed-loop aim; re-locates every tick.
    Target,
    /// Flywheel spin-up, trigger pull, trigger release.
    Shoot,
    /// Everything safed; holding before the return leg.
    Stop,
    /// Driving back to the zero reference.
    Return,
}

impl ShooterState {
    /// Returns the state as a lowercase string for logs and displays.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ShooterState::Init => "init",
            ShooterState::WaitForStart => "wait_for_start",
            ShooterState::Locate => "locate",
            ShooterState::Target => "target",
            ShooterState::Shoot => "shoot",
            ShooterState::Stop => "stop",
            ShooterState::Return => "return",
        }
    }
}

/// The aim-and-fire state machine.
///
/// # Type Parameters
///
/// One per owned capability: motor PWM, quadrature counter, servo pulse
/// output, flywheel line, thermal sensor.
pub struct ShootingStateMachine<P, C, S, F, T>
where
    P: MotorPwm,
    C: QuadratureCounter,
    S: ServoPwm,
    F: DigitalOutput,
    T: ThermalSensor,
{
    motor: MotorDriver<P>,
    encoder: EncoderReader<C>,
    servo: ServoActuator<S>,
    flywheel: F,
    camera: ThermalFrameSource<T>,
    pid: PositionController,
    extractor: CentroidExtractor,
    aim: AimConfig,
    dt_s: f32,

    state: ShooterState,
    entered_ms: u64,
    position: i64,
    aim_target: i64,
    settle_since: Option<u64>,
    flywheel_on: bool,
    fired: bool,
    fired_at_ms: u64,
    shots: u32,
    fault: Option<FaultKind>,
}

impl<P, C, S, F, T> ShootingStateMachine<P, C, S, F, T>
where
    P: MotorPwm,
    C: QuadratureCounter,
    S: ServoPwm,
    F: DigitalOutput,
    T: ThermalSensor,
{
    /// Create the machine in its init state.
    ///
    /// `tick_period_ms` is the shooting task's fixed period; it becomes the
    /// PID sample time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        motor: MotorDriver<P>,
        encoder: EncoderReader<C>,
        servo: ServoActuator<S>,
        flywheel: F,
        camera: ThermalFrameSource<T>,
        pid: PositionController,
        extractor: CentroidExtractor,
        aim: AimConfig,
        tick_period_ms: u64,
    ) -> Result<Self, ConfigError> {
        aim.validate()?;
        if tick_period_ms == 0 {
            return Err(ConfigError::ZeroDuration("shooting task period"));
        }
        Ok(Self {
            motor,
            encoder,
            servo,
            flywheel,
            camera,
            pid,
            extractor,
            aim,
            dt_s: tick_period_ms as f32 / 1_000.0,
            state: ShooterState::Init,
            entered_ms: 0,
            position: 0,
            aim_target: 0,
            settle_since: None,
            flywheel_on: false,
            fired: false,
            fired_at_ms: 0,
            shots: 0,
            fault: None,
        })
    }

    /// Run one pass of the state machine. Never blocks.
    ///
    /// `phase` is the snapshot published by the timing task earlier in the
    /// same scheduler pass.
    pub fn tick(&mut self, phase: MatchPhase, now_ms: u64) {
        // Drive the capture process every tick; frames complete on the
        // sensor's own slower cadence. A failed bus transaction is a
        // transient, and the staleness bound covers persistent loss.
        self.camera.poll(now_ms).ok();

        self.position = self.encoder.sample(now_ms).count;
        let glitch = self.encoder.take_glitch();
        if glitch {
            self.fault = Some(FaultKind::EncoderGlitch);
        }

        match self.state {
            ShooterState::Init => {
                self.pid.reset();
                self.extractor.clear_history();
                let safed = self.servo.rest().is_ok()
                    && self.flywheel.set_low().is_ok()
                    && self.motor.stop().is_ok();
                if !safed {
                    self.actuator_fault(now_ms);
                    return;
                }
                self.flywheel_on = false;
                self.enter_wait_for_start(now_ms);
            }

            ShooterState::WaitForStart => match phase {
                MatchPhase::Starting | MatchPhase::Shooting => self.enter_locate(now_ms),
                MatchPhase::Stopped => self.enter_stop(now_ms),
                _ => {}
            },

            ShooterState::Locate => {
                if phase == MatchPhase::Stopped {
                    self.enter_stop(now_ms);
                } else {
                    self.update_aim_point(now_ms);
                    self.state = ShooterState::Target;
                }
            }

            ShooterState::Target => {
                if phase == MatchPhase::Stopped {
                    self.enter_stop(now_ms);
                    return;
                }
                self.update_aim_point(now_ms);
                if glitch {
                    // Position untrusted this tick: hold the last duty.
                    return;
                }
                let duty = self
                    .pid
                    .update(self.aim_target as f32, self.position as f32, self.dt_s);
                if self.motor.set_duty(duty).is_err() {
                    self.actuator_fault(now_ms);
                    return;
                }
                let in_band =
                    (self.position - self.aim_target).abs() <= self.aim.aim_tolerance_counts;
                if self.settled(in_band, now_ms, self.aim.aim_settle_ms)
                    && phase == MatchPhase::Shooting
                {
                    self.enter_shoot(now_ms);
                }
            }

            ShooterState::Shoot => {
                if phase == MatchPhase::Stopped {
                    self.enter_stop(now_ms);
                    return;
                }
                if !self.fired {
                    if now_ms.saturating_sub(self.entered_ms) >= self.aim.spin_up_ms {
                        if self.servo.fire().is_err() {
                            self.actuator_fault(now_ms);
                            return;
                        }
                        self.fired = true;
                        self.fired_at_ms = now_ms;
                        self.shots += 1;
                    }
                } else if self.flywheel_on
                    && now_ms.saturating_sub(self.fired_at_ms) >= self.aim.trigger_dwell_ms
                {
                    let released = self.servo.rest().is_ok() && self.flywheel.set_low().is_ok();
                    if !released {
                        self.actuator_fault(now_ms);
                        return;
                    }
                    self.flywheel_on = false;
                }
            }

            ShooterState::Stop => {
                if now_ms.saturating_sub(self.entered_ms) >= self.aim.stop_hold_ms {
                    self.enter_return(now_ms);
                }
            }

            ShooterState::Return => {
                let mut home = phase == MatchPhase::WaitForInput;
                if !glitch {
                    let duty = self.pid.update(0.0, self.position as f32, self.dt_s);
                    if self.motor.set_duty(duty).is_err() {
                        self.actuator_fault(now_ms);
                        return;
                    }
                    let in_band = self.position.abs() <= self.aim.return_tolerance_counts;
                    home = self.settled(in_band, now_ms, self.aim.return_settle_ms) || home;
                }
                if home {
                    if self.motor.stop().is_err() {
                        self.actuator_fault(now_ms);
                        return;
                    }
                    self.enter_wait_for_start(now_ms);
                }
            }
        }
    }

    /// Current state.
    pub fn state(&self) -> ShooterState {
        self.state
    }

    /// Last sampled encoder position in counts.
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Current aim target in counts.
    pub fn aim_target(&self) -> i64 {
        self.aim_target
    }

    /// Last duty commanded to the motor (post-clamp).
    pub fn commanded_duty(&self) -> f32 {
        self.motor.last_duty()
    }

    /// Darts fired since construction.
    pub fn shots_fired(&self) -> u32 {
        self.shots
    }

    /// Whether the flywheel line is currently enabled.
    pub fn flywheel_on(&self) -> bool {
        self.flywheel_on
    }

    /// Last angle commanded to the trigger servo.
    pub fn servo_angle_deg(&self) -> f32 {
        self.servo.last_angle_deg()
    }

    /// The most recent recorded fault, without clearing it.
    pub fn last_fault(&self) -> Option<FaultKind> {
        self.fault
    }

    /// Returns and clears the most recent recorded fault.
    pub fn take_fault(&mut self) -> Option<FaultKind> {
        self.fault.take()
    }

    /// Access the frame source (simulation and tests).
    pub fn camera_mut(&mut self) -> &mut ThermalFrameSource<T> {
        &mut self.camera
    }

    /// Access the encoder reader (simulation and tests).
    pub fn encoder_mut(&mut self) -> &mut EncoderReader<C> {
        &mut self.encoder
    }

    // Pull the freshest usable frame and re-derive the aim point. A missing
    // or stale frame, or one with no hotspot, holds the previous target.
    fn update_aim_point(&mut self, now_ms: u64) {
        match self.camera.latest_frame(now_ms) {
            Some(frame) => {
                let estimate = self.extractor.extract(frame);
                if estimate.hotspot {
                    let offset = estimate.angle_offset_deg * self.aim.counts_per_degree;
                    self.aim_target = self.aim.prerotation_counts + offset as i64;
                }
            }
            None => self.fault = Some(FaultKind::StaleFrame),
        }
    }

    // Stay-within-range check: true once the position has been inside the
    // band continuously for `hold_ms`.
    fn settled(&mut self, in_band: bool, now_ms: u64, hold_ms: u64) -> bool {
        if !in_band {
            self.settle_since = None;
            return false;
        }
        let since = *self.settle_since.get_or_insert(now_ms);
        now_ms.saturating_sub(since) >= hold_ms
    }

    fn enter_wait_for_start(&mut self, now_ms: u64) {
        self.state = ShooterState::WaitForStart;
        self.entered_ms = now_ms;
        self.pid.reset();
        self.settle_since = None;
        self.fired = false;
        // The fixed 180-degree pre-rotation is staged here; the aim states
        // drive toward it once the phase leaves WaitForInput.
        self.aim_target = self.aim.prerotation_counts;
        if self.motor.stop().is_err() {
            self.actuator_fault(now_ms);
        }
    }

    fn enter_locate(&mut self, now_ms: u64) {
        self.state = ShooterState::Locate;
        self.entered_ms = now_ms;
        self.pid.reset();
        self.settle_since = None;
    }

    fn enter_shoot(&mut self, now_ms: u64) {
        self.state = ShooterState::Shoot;
        self.entered_ms = now_ms;
        let staged = self.motor.stop().is_ok() && self.flywheel.set_high().is_ok();
        if !staged {
            self.actuator_fault(now_ms);
            return;
        }
        self.flywheel_on = true;
    }

    fn enter_stop(&mut self, now_ms: u64) {
        self.state = ShooterState::Stop;
        self.entered_ms = now_ms;
        self.settle_since = None;
        // Best effort: this state exists to get everything safe, so a
        // rejected command here must not divert the machine again.
        let _ = self.motor.stop();
        let _ = self.flywheel.set_low();
        let _ = self.servo.rest();
        self.flywheel_on = false;
    }

    fn enter_return(&mut self, now_ms: u64) {
        self.state = ShooterState::Return;
        self.entered_ms = now_ms;
        self.pid.reset();
        self.settle_since = None;
        self.aim_target = 0;
    }

    fn actuator_fault(&mut self, now_ms: u64) {
        self.fault = Some(FaultKind::Actuator);
        self.enter_stop(now_ms);
    }
}
