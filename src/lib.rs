//! # rs-turret
//!
//! An autonomous heat-seeking Nerf turret controller: a low-resolution
//! thermal camera finds the target, a PID loop over a quadrature encoder
//! pans the turret onto it, and a flywheel-plus-servo launcher takes the
//! shot.
//!
//! ## Features
//!
//! - **Hardware abstraction**: capability traits for motor PWM, encoder
//!   capture, servo pulse output, the flywheel line, the start button, and
//!   the thermal camera
//! - **Cooperative dual-task core**: a timing sequencer and a shooting
//!   machine on independent fixed periods, no blocking anywhere
//! - **Closed-loop yaw**: discrete PID with integral clamping and
//!   conditional anti-windup, saturated to the motor's duty range
//! - **Deterministic targeting**: thresholded, windowed centroid extraction
//!   with a stable tie-break rule
//! - **Fail-safe degradation**: sensor transients degrade locally, actuator
//!   faults force a safe stop, bad calibration never starts the scheduler
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - hardware capability interfaces
//! - `hal` - mock and desktop implementations
//! - `config` - every calibrated value, with fail-fast validation
//! - `encoder`, `motor`, `servo`, `thermal` - device-facing components
//! - `centroid`, `pid` - the signal path from frame to duty command
//! - `timing`, `shooter` - the two cooperative state machines
//! - `scheduler` - fixed-period task loop and the host entry point
//!
//! ## Example
//!
//! ```rust
//! use rs_turret::{
//!     config::TurretConfig,
//!     hal::{MockButton, MockCounter, MockMotorPwm, MockServoPwm, MockSwitch, MockThermalSensor},
//!     CooperativeScheduler,
//! };
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
//! // Host main loop: thread the time through; nothing here blocks.
//! for now_ms in (0..1_000).step_by(7) {
//!     turret.tick(now_ms);
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

/// Hotspot/centroid extraction from thermal frames.
pub mod centroid;
/// Calibration and timing configuration with fail-fast validation.
pub mod config;
/// Wrap-aware encoder position accumulation.
pub mod encoder;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Signed-duty motor drive over two-channel PWM.
pub mod motor;
/// Discrete PID position controller.
pub mod pid;
/// Cooperative two-task scheduler and host entry point.
pub mod scheduler;
/// Open-loop trigger servo with calibrated endpoints.
pub mod servo;
/// The aim-fire-reset state machine.
pub mod shooter;
/// Thermal frame snapshots with bounded staleness.
pub mod thermal;
/// Match-phase sequencing state machine.
pub mod timing;
/// Core traits for hardware abstraction.
pub mod traits;

// Re-exports for convenience
pub use centroid::{CentroidExtractor, TargetEstimate};
pub use config::{
    AimConfig, ConfigError, EncoderConfig, MotorConfig, PidConfig, SchedulerConfig, ServoConfig,
    ThermalConfig, TimingConfig, TurretConfig,
};
pub use encoder::{EncoderReader, EncoderSample};
pub use motor::MotorDriver;
pub use pid::PositionController;
pub use scheduler::{CooperativeScheduler, TurretStatus};
pub use servo::ServoActuator;
pub use shooter::{ShooterState, ShootingStateMachine};
pub use thermal::{ThermalFrame, ThermalFrameSource};
pub use timing::{MatchPhase, TimingStateMachine};
pub use traits::{
    Clock, DigitalOutput, FaultKind, FrameCells, MotorPwm, QuadratureCounter, ServoPwm,
    StartInput, ThermalSensor, MAX_FRAME_PIXELS,
};
