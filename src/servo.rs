//! Open-loop trigger servo with calibrated fire and rest endpoints.
//!
//! The servo's internal controller closes its own loop; this side only maps
//! an angle to a pulse width and refuses to command past the two calibrated
//! endpoints that bracket the trigger linkage's safe travel.

use crate::config::{ConfigError, ServoConfig};
use crate::traits::ServoPwm;

/// Angle-commanded trigger actuator.
///
/// # Type Parameter
///
/// - `S`: the pulse output capability ([`ServoPwm`] trait)
pub struct ServoActuator<S: ServoPwm> {
    out: S,
    cfg: ServoConfig,
    last_angle_deg: f32,
}

impl<S: ServoPwm> ServoActuator<S> {
    /// Create an actuator; the first commanded move should be [`rest`].
    ///
    /// Calibration outside the physical travel or pulse range is fatal.
    ///
    /// [`rest`]: Self::rest
    pub fn new(out: S, cfg: ServoConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let rest = cfg.rest_deg;
        Ok(Self {
            out,
            cfg,
            last_angle_deg: rest,
        })
    }

    /// Move to an absolute angle, clamped between the two calibrated
    /// endpoints.
    pub fn move_to(&mut self, angle_deg: f32) -> Result<(), S::Error> {
        let lo = self.cfg.rest_deg.min(self.cfg.fire_deg);
        let hi = self.cfg.rest_deg.max(self.cfg.fire_deg);
        let angle = if angle_deg.is_finite() {
            angle_deg.clamp(lo, hi)
        } else {
            self.cfg.rest_deg
        };
        self.out.set_pulse_us(self.pulse_for(angle))?;
        self.last_angle_deg = angle;
        Ok(())
    }

    /// Move to the calibrated fire endpoint (trigger pulled).
    pub fn fire(&mut self) -> Result<(), S::Error> {
        self.move_to(self.cfg.fire_deg)
    }

    /// Move to the calibrated rest endpoint (trigger released).
    pub fn rest(&mut self) -> Result<(), S::Error> {
        self.move_to(self.cfg.rest_deg)
    }

    /// The last commanded angle (post-clamp).
    pub fn last_angle_deg(&self) -> f32 {
        self.last_angle_deg
    }

    // Linear datasheet mapping over the full travel.
    fn pulse_for(&self, angle_deg: f32) -> u16 {
        let span = f32::from(self.cfg.max_pulse_us - self.cfg.min_pulse_us);
        let us = angle_deg / self.cfg.travel_deg * span + f32::from(self.cfg.min_pulse_us);
        us as u16
    }
}
