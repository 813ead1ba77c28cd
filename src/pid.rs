//! Discrete PID position controller for the yaw axis.
//!
//! Closes the loop between a target encoder position and the motor duty
//! command. The integral term is doubly protected: clamped to a configured
//! bound, and frozen whenever the raw output already saturates in the
//! error's direction, so a long slew can't wind up weeks of correction.
//!
//! `reset()` must be called on every transition into an active-control
//! state; stale windup from a previous engagement must never leak into a
//! fresh one.

use crate::config::{ConfigError, PidConfig};

/// Stateful PID over position error.
///
/// Units: error in encoder counts, `dt` in seconds, output in duty percent.
pub struct PositionController {
    cfg: PidConfig,
    output_limit: f32,
    integral: f32,
    prev_error: Option<f32>,
}

impl PositionController {
    /// Create a controller saturating at `±output_limit`.
    pub fn new(cfg: PidConfig, output_limit: f32) -> Result<Self, ConfigError> {
        cfg.validate()?;
        if !output_limit.is_finite() || output_limit <= 0.0 {
            return Err(ConfigError::InvalidLimit("output limit"));
        }
        Ok(Self {
            cfg,
            output_limit,
            integral: 0.0,
            prev_error: None,
        })
    }

    /// One controller step. Call once per shooting-task tick with the
    /// tick's nominal period as `dt` (measured elapsed time under jitter).
    ///
    /// A non-positive `dt` degrades to a proportional-only step: no
    /// derivative, no accumulation.
    pub fn update(&mut self, target: f32, current: f32, dt: f32) -> f32 {
        let error = target - current;

        if !(dt > 0.0) || !dt.is_finite() {
            self.prev_error = Some(error);
            let raw = self.cfg.kp * error + self.cfg.ki * self.integral;
            return raw.clamp(-self.output_limit, self.output_limit);
        }

        let derivative = match self.prev_error {
            Some(prev) => (error - prev) / dt,
            None => 0.0,
        };

        // Conditional integration: while the raw output already saturates
        // in the error's direction, accumulating would only deepen windup.
        let raw = self.cfg.kp * error + self.cfg.ki * self.integral + self.cfg.kd * derivative;
        let saturating = raw.abs() > self.output_limit && raw * error > 0.0;
        if !saturating {
            self.integral = (self.integral + error * dt)
                .clamp(-self.cfg.integral_limit, self.cfg.integral_limit);
        }

        self.prev_error = Some(error);
        let output = self.cfg.kp * error + self.cfg.ki * self.integral + self.cfg.kd * derivative;
        output.clamp(-self.output_limit, self.output_limit)
    }

    /// Zero the integral accumulator and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }

    /// Retune the gains at runtime; the anti-windup bound is unchanged.
    pub fn set_gains(&mut self, kp: f32, ki: f32, kd: f32) -> Result<(), ConfigError> {
        let cfg = self.cfg.with_gains(kp, ki, kd);
        cfg.validate()?;
        self.cfg = cfg;
        Ok(())
    }

    /// Current integral accumulator (diagnostics and tests).
    pub fn integral(&self) -> f32 {
        self.integral
    }
}
