//! Hardware capability traits for the turret's peripherals.
//!
//! This module defines the narrow interfaces through which the control core
//! touches hardware. Everything here is a non-blocking poll or a write-only
//! command; no trait method may block the cooperative scheduler.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`MotorPwm`] | Two-channel PWM output for an H-bridge DC motor driver |
//! | [`QuadratureCounter`] | Raw hardware counter fed by quadrature edges |
//! | [`ServoPwm`] | Pulse-width output for a hobby servo |
//! | [`DigitalOutput`] | Single on/off line (flywheel enable MOSFET) |
//! | [`StartInput`] | Debounced start-button level |
//! | [`ThermalSensor`] | Low-resolution IR frame capture |
//! | [`Clock`] | Time source for host loops in `no_std` environments |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations from
//! [`crate::hal::mock`]. Hardware backends live outside this crate and only
//! need to implement these traits.

use heapless::Vec;

/// Largest frame the core will accept, sized for an MLX90640-class sensor.
pub const MAX_FRAME_PIXELS: usize = 32 * 24;

/// One complete frame of per-pixel temperatures in row-major order.
///
/// Fixed capacity so frame hand-off never allocates; sensors with a smaller
/// native resolution simply fill fewer cells.
pub type FrameCells = Vec<f32, MAX_FRAME_PIXELS>;

/// Two-channel PWM capability for an H-bridge motor driver.
///
/// The turret's [`MotorDriver`] translates a signed duty into a pair of
/// channel levels; this trait is the raw pin-level surface below it.
///
/// # Implementation Notes
///
/// - Levels are percentages in `0.0..=100.0`, one per H-bridge input
/// - At most one channel is nonzero at a time for a brushed DC motor
/// - Implementations must not block; queue the compare-register update
///
/// [`MotorDriver`]: crate::motor::MotorDriver
pub trait MotorPwm {
    /// Error type for PWM writes.
    type Error;

    /// Set both channel levels as percentages (`0.0..=100.0`).
    fn set_levels(&mut self, in1: f32, in2: f32) -> Result<(), Self::Error>;
}

/// Raw quadrature counter capability.
///
/// Exposes the hardware timer register that counts encoder edges. The
/// counter wraps at its modulus; [`EncoderReader`] turns successive raw
/// reads into an unbounded signed position.
///
/// [`EncoderReader`]: crate::encoder::EncoderReader
pub trait QuadratureCounter {
    /// Counter modulus (auto-reload + 1), e.g. `65536` for a 16-bit timer.
    fn modulus(&self) -> u32;

    /// Latest raw counter value, in `0..modulus()`.
    fn raw_count(&mut self) -> u32;
}

/// Pulse-width output capability for a hobby servo.
///
/// The [`ServoActuator`] owns the angle-to-pulse calibration; this trait
/// only carries the resulting pulse width to the timer peripheral.
///
/// [`ServoActuator`]: crate::servo::ServoActuator
pub trait ServoPwm {
    /// Error type for pulse writes.
    type Error;

    /// Command a pulse width in microseconds.
    fn set_pulse_us(&mut self, us: u16) -> Result<(), Self::Error>;
}

/// Single digital output line, used for the flywheel enable MOSFET.
pub trait DigitalOutput {
    /// Error type for pin writes.
    type Error;

    /// Drive the line high (`true`) or low (`false`).
    fn set(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Convenience: drive the line high.
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true)
    }

    /// Convenience: drive the line low.
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false)
    }
}

/// Start-button input, already debounced by the wiring or a lower layer.
///
/// The timing task performs its own rising-edge detection on this level,
/// so implementations only report the current state.
pub trait StartInput {
    /// Returns true while the start input reads active.
    fn is_active(&self) -> bool;
}

/// Low-resolution thermal imager capability.
///
/// Frame capture runs on the sensor's own cadence, which is slower than the
/// control tick. `poll_frame` must return immediately: `None` while a frame
/// is still being assembled, `Some` exactly once per completed frame.
pub trait ThermalSensor {
    /// Error type for bus transactions.
    type Error;

    /// Native resolution as `(width, height)` in pixels.
    fn resolution(&self) -> (usize, usize);

    /// Poll the capture process; returns a completed frame when one is ready.
    fn poll_frame(&mut self) -> Result<Option<FrameCells>, Self::Error>;
}

/// Time source trait for `no_std` compatibility.
///
/// The core itself never reads a clock; the host loop samples one of these
/// and threads `now_ms` through [`CooperativeScheduler::tick`].
///
/// [`CooperativeScheduler::tick`]: crate::scheduler::CooperativeScheduler::tick
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}

/// Faults the shooting task records while degrading.
///
/// None of these halt the machine: sensor transients degrade locally and
/// actuator faults force the safe `Stop` state. The host polls them via
/// [`ShootingStateMachine::take_fault`].
///
/// [`ShootingStateMachine::take_fault`]: crate::shooter::ShootingStateMachine::take_fault
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FaultKind {
    /// Encoder delta exceeded the plausible per-read maximum.
    ///
    /// The reading was discarded and the last good position held.
    EncoderGlitch,

    /// No usable thermal frame (missing, or older than the staleness bound).
    ///
    /// The aim target from the previous confident estimate is held.
    StaleFrame,

    /// A servo, motor, or flywheel command was rejected by the peripheral.
    ///
    /// Forces a transition to the safe `Stop` state.
    Actuator,
}

impl FaultKind {
    /// Returns the fault as a lowercase string for logs and displays.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            FaultKind::EncoderGlitch => "encoder_glitch",
            FaultKind::StaleFrame => "stale_frame",
            FaultKind::Actuator => "actuator",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestPin {
        level: bool,
        writes: usize,
    }

    impl DigitalOutput for TestPin {
        type Error = ();

        fn set(&mut self, high: bool) -> Result<(), ()> {
            self.level = high;
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn digital_output_default_helpers() {
        let mut pin = TestPin {
            level: false,
            writes: 0,
        };

        pin.set_high().unwrap();
        assert!(pin.level);

        pin.set_low().unwrap();
        assert!(!pin.level);
        assert_eq!(pin.writes, 2);
    }

    #[test]
    fn fault_kind_as_str() {
        assert_eq!(FaultKind::EncoderGlitch.as_str(), "encoder_glitch");
        assert_eq!(FaultKind::StaleFrame.as_str(), "stale_frame");
        assert_eq!(FaultKind::Actuator.as_str(), "actuator");
    }

    #[test]
    fn fault_kind_copy_equality() {
        let fault = FaultKind::Actuator;
        let copied = fault;
        assert_eq!(fault, copied);
        assert_ne!(FaultKind::EncoderGlitch, FaultKind::StaleFrame);
    }
}
