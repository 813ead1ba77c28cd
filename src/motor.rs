//! Signed-duty drive for the yaw motor over a two-channel H-bridge.
//!
//! Positive duty torques one direction, negative the other; the sign is
//! split across the two PWM inputs so exactly one channel carries the
//! magnitude at a time. Out-of-range commands are clamped, never rejected.
//!
//! # Example
//!
//! ```rust
//! use rs_turret::motor::MotorDriver;
//! use rs_turret::config::MotorConfig;
//! use rs_turret::hal::MockMotorPwm;
//!
//! let mut motor = MotorDriver::new(MockMotorPwm::new(), MotorConfig::default()).unwrap();
//! motor.set_duty(-42.0).unwrap();
//! assert_eq!(motor.last_duty(), -42.0);
//! ```

use crate::config::{ConfigError, MotorConfig};
use crate::traits::MotorPwm;

/// Translates signed duty commands into two-pin PWM output.
///
/// # Type Parameter
///
/// - `P`: the raw PWM capability ([`MotorPwm`] trait)
pub struct MotorDriver<P: MotorPwm> {
    pwm: P,
    max_duty: f32,
    last_duty: f32,
}

impl<P: MotorPwm> MotorDriver<P> {
    /// Create a driver with the motor held stopped.
    pub fn new(pwm: P, cfg: MotorConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            pwm,
            max_duty: cfg.max_duty,
            last_duty: 0.0,
        })
    }

    /// Command a signed duty in percent, clamped to the configured range.
    ///
    /// Clamping is idempotent: re-applying an already-clamped value writes
    /// the same channel levels.
    pub fn set_duty(&mut self, duty: f32) -> Result<(), P::Error> {
        let duty = if duty.is_finite() {
            duty.clamp(-self.max_duty, self.max_duty)
        } else {
            0.0
        };
        if duty > 0.0 {
            self.pwm.set_levels(duty, 0.0)?;
        } else {
            self.pwm.set_levels(0.0, -duty)?;
        }
        self.last_duty = duty;
        Ok(())
    }

    /// Force zero duty; both bridge inputs released low.
    pub fn stop(&mut self) -> Result<(), P::Error> {
        self.set_duty(0.0)
    }

    /// The last duty actually commanded (post-clamp).
    pub fn last_duty(&self) -> f32 {
        self.last_duty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockMotorPwm;

    fn driver() -> MotorDriver<MockMotorPwm> {
        MotorDriver::new(MockMotorPwm::new(), MotorConfig::default()).unwrap()
    }

    #[test]
    fn positive_duty_drives_first_channel() {
        let mut motor = driver();
        motor.set_duty(42.0).unwrap();
        assert_eq!(motor.pwm.in1, 42.0);
        assert_eq!(motor.pwm.in2, 0.0);
    }

    #[test]
    fn negative_duty_drives_second_channel() {
        let mut motor = driver();
        motor.set_duty(-42.0).unwrap();
        assert_eq!(motor.pwm.in1, 0.0);
        assert_eq!(motor.pwm.in2, 42.0);
    }

    #[test]
    fn duty_clamped_to_range() {
        let mut motor = driver();
        motor.set_duty(250.0).unwrap();
        assert_eq!(motor.last_duty(), 100.0);
        motor.set_duty(-250.0).unwrap();
        assert_eq!(motor.last_duty(), -100.0);
    }

    #[test]
    fn clamping_is_idempotent() {
        let mut motor = driver();
        motor.set_duty(250.0).unwrap();
        let first = (motor.pwm.in1, motor.pwm.in2);
        motor.set_duty(motor.last_duty()).unwrap();
        assert_eq!((motor.pwm.in1, motor.pwm.in2), first);
    }

    #[test]
    fn non_finite_duty_treated_as_stop() {
        let mut motor = driver();
        motor.set_duty(f32::NAN).unwrap();
        assert_eq!(motor.last_duty(), 0.0);
    }

    #[test]
    fn stop_zeroes_both_channels() {
        let mut motor = driver();
        motor.set_duty(60.0).unwrap();
        motor.stop().unwrap();
        assert_eq!(motor.pwm.in1, 0.0);
        assert_eq!(motor.pwm.in2, 0.0);
        assert_eq!(motor.last_duty(), 0.0);
    }

    #[test]
    fn reduced_max_duty_narrows_range() {
        let cfg = MotorConfig::default().with_max_duty(60.0);
        let mut motor = MotorDriver::new(MockMotorPwm::new(), cfg).unwrap();
        motor.set_duty(80.0).unwrap();
        assert_eq!(motor.last_duty(), 60.0);
    }
}
