//! Configuration for every calibrated value in the turret core.
//!
//! Gains, windows, thresholds, and mappings are runtime inputs, not
//! constants: matches of different lengths and re-tuned mechanics are
//! supported without code changes. Construction of the core fails fast on
//! an invalid configuration.
//!
//! # Example
//!
//! ```rust
//! use rs_turret::config::{TurretConfig, TimingConfig, PidConfig};
//!
//! // Use defaults
//! let config = TurretConfig::default();
//! assert!(config.validate().is_ok());
//!
//! // Or customize
//! let config = TurretConfig::default()
//!     .with_timing(TimingConfig::default().with_shoot_window_ms(15_000))
//!     .with_pid(PidConfig::default().with_gains(0.25, 0.0, 0.0));
//! ```

use core::fmt;

/// A rejected configuration value.
///
/// Fatal at initialization: constructors return this instead of starting
/// the scheduler with a bad calibration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A duration or period that must be nonzero was zero.
    ZeroDuration(&'static str),
    /// A gain or mapping factor was negative or not finite.
    InvalidGain(&'static str),
    /// A saturation or tolerance bound was not positive.
    InvalidLimit(&'static str),
    /// Servo calibration outside the physical travel or pulse range.
    InvalidServoCalibration(&'static str),
    /// Sensor resolution exceeds the frame capacity or is zero.
    InvalidResolution,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroDuration(what) => write!(f, "{what} must be nonzero"),
            ConfigError::InvalidGain(what) => {
                write!(f, "{what} must be finite and non-negative")
            }
            ConfigError::InvalidLimit(what) => write!(f, "{what} must be positive"),
            ConfigError::InvalidServoCalibration(what) => {
                write!(f, "servo calibration invalid: {what}")
            }
            ConfigError::InvalidResolution => {
                write!(f, "sensor resolution is zero or exceeds frame capacity")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

// ============================================================================
// Main Config
// ============================================================================

/// Complete turret configuration.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurretConfig {
    /// Match-phase window durations.
    pub timing: TimingConfig,
    /// Task periods for the cooperative scheduler.
    pub scheduler: SchedulerConfig,
    /// Yaw position controller gains and limits.
    pub pid: PidConfig,
    /// Aiming and firing sequence calibration.
    pub aim: AimConfig,
    /// Trigger servo calibration.
    pub servo: ServoConfig,
    /// Yaw motor limits.
    pub motor: MotorConfig,
    /// Encoder accumulation calibration.
    pub encoder: EncoderConfig,
    /// Thermal sensing and centroid extraction calibration.
    pub thermal: ThermalConfig,
}

impl TurretConfig {
    /// Set the timing configuration.
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Set the scheduler configuration.
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Set the PID configuration.
    pub fn with_pid(mut self, pid: PidConfig) -> Self {
        self.pid = pid;
        self
    }

    /// Set the aim configuration.
    pub fn with_aim(mut self, aim: AimConfig) -> Self {
        self.aim = aim;
        self
    }

    /// Set the servo configuration.
    pub fn with_servo(mut self, servo: ServoConfig) -> Self {
        self.servo = servo;
        self
    }

    /// Set the motor configuration.
    pub fn with_motor(mut self, motor: MotorConfig) -> Self {
        self.motor = motor;
        self
    }

    /// Set the encoder configuration.
    pub fn with_encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }

    /// Set the thermal configuration.
    pub fn with_thermal(mut self, thermal: ThermalConfig) -> Self {
        self.thermal = thermal;
        self
    }

    /// Validate every section.
    ///
    /// Individual component constructors validate their own sections; this
    /// checks the whole tree up front for hosts that want one early gate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()?;
        self.scheduler.validate()?;
        self.pid.validate()?;
        self.aim.validate()?;
        self.servo.validate()?;
        self.motor.validate()?;
        self.encoder.validate()?;
        self.thermal.validate()
    }
}

// ============================================================================
// Timing Config
// ============================================================================

/// Durations of the four timed match phases.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingConfig {
    /// Start window: target may still move, turret pre-rotates (ms).
    pub start_window_ms: u64,
    /// Shoot window: firing is allowed (ms).
    pub shoot_window_ms: u64,
    /// Settling delay after the shoot window closes (ms).
    pub stop_delay_ms: u64,
    /// Window for the turret to return to its reference (ms).
    pub return_window_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            start_window_ms: 5_000,
            shoot_window_ms: 10_000,
            stop_delay_ms: 1_000,
            return_window_ms: 3_000,
        }
    }
}

impl TimingConfig {
    /// Set the start window duration.
    pub fn with_start_window_ms(mut self, ms: u64) -> Self {
        self.start_window_ms = ms;
        self
    }

    /// Set the shoot window duration.
    pub fn with_shoot_window_ms(mut self, ms: u64) -> Self {
        self.shoot_window_ms = ms;
        self
    }

    /// Set the stop settling delay.
    pub fn with_stop_delay_ms(mut self, ms: u64) -> Self {
        self.stop_delay_ms = ms;
        self
    }

    /// Set the return window duration.
    pub fn with_return_window_ms(mut self, ms: u64) -> Self {
        self.return_window_ms = ms;
        self
    }

    /// Reject zero-length windows.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_window_ms == 0 {
            return Err(ConfigError::ZeroDuration("start window"));
        }
        if self.shoot_window_ms == 0 {
            return Err(ConfigError::ZeroDuration("shoot window"));
        }
        if self.stop_delay_ms == 0 {
            return Err(ConfigError::ZeroDuration("stop delay"));
        }
        if self.return_window_ms == 0 {
            return Err(ConfigError::ZeroDuration("return window"));
        }
        Ok(())
    }
}

// ============================================================================
// Scheduler Config
// ============================================================================

/// Fixed periods for the two cooperative tasks.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerConfig {
    /// Timing task period (ms).
    pub timing_period_ms: u64,
    /// Shooting task period (ms); also the PID sample time.
    pub shooting_period_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timing_period_ms: 20,
            shooting_period_ms: 7,
        }
    }
}

impl SchedulerConfig {
    /// Set the timing task period.
    pub fn with_timing_period_ms(mut self, ms: u64) -> Self {
        self.timing_period_ms = ms;
        self
    }

    /// Set the shooting task period.
    pub fn with_shooting_period_ms(mut self, ms: u64) -> Self {
        self.shooting_period_ms = ms;
        self
    }

    /// Reject zero periods.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing_period_ms == 0 {
            return Err(ConfigError::ZeroDuration("timing task period"));
        }
        if self.shooting_period_ms == 0 {
            return Err(ConfigError::ZeroDuration("shooting task period"));
        }
        Ok(())
    }
}

// ============================================================================
// PID Config
// ============================================================================

/// Gains and anti-windup bound for the yaw position controller.
///
/// Units: error in encoder counts, output in duty percent, time in seconds.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidConfig {
    /// Proportional gain.
    pub kp: f32,
    /// Integral gain.
    pub ki: f32,
    /// Derivative gain.
    pub kd: f32,
    /// Clamp bound on the integral accumulator (count-seconds).
    pub integral_limit: f32,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 0.2,
            ki: 0.0,
            kd: 0.0,
            integral_limit: 40_000.0,
        }
    }
}

impl PidConfig {
    /// Set all three gains at once.
    pub fn with_gains(mut self, kp: f32, ki: f32, kd: f32) -> Self {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
        self
    }

    /// Set the integral accumulator bound.
    pub fn with_integral_limit(mut self, limit: f32) -> Self {
        self.integral_limit = limit;
        self
    }

    /// Reject negative or non-finite gains and a non-positive bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for gain in [self.kp, self.ki, self.kd] {
            if !gain.is_finite() || gain < 0.0 {
                return Err(ConfigError::InvalidGain("pid gain"));
            }
        }
        if !self.integral_limit.is_finite() || self.integral_limit <= 0.0 {
            return Err(ConfigError::InvalidLimit("integral limit"));
        }
        Ok(())
    }
}

// ============================================================================
// Aim Config
// ============================================================================

/// Calibration for the aim-fire-return sequence.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AimConfig {
    /// Encoder counts for the fixed 180-degree pre-rotation.
    pub prerotation_counts: i64,
    /// Encoder counts per degree of yaw.
    pub counts_per_degree: f32,
    /// Stay-within band around the aim target (counts).
    pub aim_tolerance_counts: i64,
    /// Time the position must stay inside the aim band (ms).
    pub aim_settle_ms: u64,
    /// Stay-within band around the home position (counts).
    pub return_tolerance_counts: i64,
    /// Time the position must stay inside the home band (ms).
    pub return_settle_ms: u64,
    /// Flywheel spin-up delay before pulling the trigger (ms).
    pub spin_up_ms: u64,
    /// How long the trigger servo holds the fire endpoint (ms).
    pub trigger_dwell_ms: u64,
    /// How long the safe Stop state holds everything before returning (ms).
    pub stop_hold_ms: u64,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            prerotation_counts: 80_000,
            counts_per_degree: 80_000.0 / 180.0,
            aim_tolerance_counts: 2_000,
            aim_settle_ms: 100,
            return_tolerance_counts: 2_500,
            return_settle_ms: 1_000,
            spin_up_ms: 500,
            trigger_dwell_ms: 200,
            stop_hold_ms: 1_000,
        }
    }
}

impl AimConfig {
    /// Set the pre-rotation target in counts.
    pub fn with_prerotation_counts(mut self, counts: i64) -> Self {
        self.prerotation_counts = counts;
        self
    }

    /// Set the counts-per-degree mapping.
    pub fn with_counts_per_degree(mut self, counts: f32) -> Self {
        self.counts_per_degree = counts;
        self
    }

    /// Set the aim tolerance band and settle time.
    pub fn with_aim_window(mut self, tolerance_counts: i64, settle_ms: u64) -> Self {
        self.aim_tolerance_counts = tolerance_counts;
        self.aim_settle_ms = settle_ms;
        self
    }

    /// Set the return tolerance band and settle time.
    pub fn with_return_window(mut self, tolerance_counts: i64, settle_ms: u64) -> Self {
        self.return_tolerance_counts = tolerance_counts;
        self.return_settle_ms = settle_ms;
        self
    }

    /// Set the flywheel spin-up delay.
    pub fn with_spin_up_ms(mut self, ms: u64) -> Self {
        self.spin_up_ms = ms;
        self
    }

    /// Set the trigger dwell.
    pub fn with_trigger_dwell_ms(mut self, ms: u64) -> Self {
        self.trigger_dwell_ms = ms;
        self
    }

    /// Set the Stop-state hold time.
    pub fn with_stop_hold_ms(mut self, ms: u64) -> Self {
        self.stop_hold_ms = ms;
        self
    }

    /// Reject non-positive bands and mappings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.counts_per_degree.is_finite() || self.counts_per_degree <= 0.0 {
            return Err(ConfigError::InvalidGain("counts per degree"));
        }
        if self.aim_tolerance_counts <= 0 {
            return Err(ConfigError::InvalidLimit("aim tolerance"));
        }
        if self.return_tolerance_counts <= 0 {
            return Err(ConfigError::InvalidLimit("return tolerance"));
        }
        Ok(())
    }
}

// ============================================================================
// Servo Config
// ============================================================================

/// Trigger servo calibration.
///
/// The pulse mapping follows the usual hobby-servo datasheet form: the full
/// travel spans linearly between the two pulse endpoints.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServoConfig {
    /// Full mechanical travel (degrees).
    pub travel_deg: f32,
    /// Pulse width at 0 degrees (microseconds).
    pub min_pulse_us: u16,
    /// Pulse width at full travel (microseconds).
    pub max_pulse_us: u16,
    /// Calibrated rest endpoint (degrees).
    pub rest_deg: f32,
    /// Calibrated fire endpoint (degrees).
    pub fire_deg: f32,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            travel_deg: 270.0,
            min_pulse_us: 500,
            max_pulse_us: 2_500,
            rest_deg: 80.0,
            fire_deg: 45.0,
        }
    }
}

impl ServoConfig {
    /// Set the full mechanical travel.
    pub fn with_travel_deg(mut self, deg: f32) -> Self {
        self.travel_deg = deg;
        self
    }

    /// Set the pulse endpoints.
    pub fn with_pulse_range_us(mut self, min_us: u16, max_us: u16) -> Self {
        self.min_pulse_us = min_us;
        self.max_pulse_us = max_us;
        self
    }

    /// Set the rest and fire endpoints.
    pub fn with_endpoints_deg(mut self, rest: f32, fire: f32) -> Self {
        self.rest_deg = rest;
        self.fire_deg = fire;
        self
    }

    /// Reject calibration outside the physical travel or pulse range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.travel_deg.is_finite() || self.travel_deg <= 0.0 {
            return Err(ConfigError::InvalidServoCalibration("travel"));
        }
        if self.min_pulse_us >= self.max_pulse_us {
            return Err(ConfigError::InvalidServoCalibration("pulse range"));
        }
        for angle in [self.rest_deg, self.fire_deg] {
            if !angle.is_finite() || angle < 0.0 || angle > self.travel_deg {
                return Err(ConfigError::InvalidServoCalibration("endpoint"));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Motor Config
// ============================================================================

/// Yaw motor limits.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorConfig {
    /// Maximum duty magnitude in percent; commands are clamped to ±this.
    pub max_duty: f32,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self { max_duty: 100.0 }
    }
}

impl MotorConfig {
    /// Set the duty saturation bound.
    pub fn with_max_duty(mut self, max_duty: f32) -> Self {
        self.max_duty = max_duty;
        self
    }

    /// Reject a non-positive saturation bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_duty.is_finite() || self.max_duty <= 0.0 || self.max_duty > 100.0 {
            return Err(ConfigError::InvalidLimit("max duty"));
        }
        Ok(())
    }
}

// ============================================================================
// Encoder Config
// ============================================================================

/// Encoder accumulation calibration.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncoderConfig {
    /// Counts per motor revolution before quadrature (datasheet CPR).
    pub cpr: u32,
    /// Largest plausible wrap-corrected delta between two reads.
    ///
    /// Anything larger is treated as a glitch and discarded.
    pub max_delta_per_read: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            cpr: 256,
            max_delta_per_read: 8_192,
        }
    }
}

impl EncoderConfig {
    /// Set the counts-per-revolution.
    pub fn with_cpr(mut self, cpr: u32) -> Self {
        self.cpr = cpr;
        self
    }

    /// Set the per-read plausibility bound.
    pub fn with_max_delta_per_read(mut self, counts: u32) -> Self {
        self.max_delta_per_read = counts;
        self
    }

    /// Reject zero calibration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cpr == 0 {
            return Err(ConfigError::InvalidLimit("encoder cpr"));
        }
        if self.max_delta_per_read == 0 {
            return Err(ConfigError::InvalidLimit("encoder max delta"));
        }
        Ok(())
    }
}

// ============================================================================
// Thermal Config
// ============================================================================

/// Thermal sensing and centroid extraction calibration.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThermalConfig {
    /// Minimum cell temperature that counts as a hotspot (°C).
    pub hotspot_threshold_c: f32,
    /// Horizontal field of view of the sensor (degrees).
    pub fov_deg: f32,
    /// Half-width of the centroid window around the peak cell (pixels).
    pub window_radius: usize,
    /// Oldest frame the extractor may still act on (ms).
    pub max_frame_age_ms: u64,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            hotspot_threshold_c: 30.0,
            fov_deg: 55.0,
            window_radius: 2,
            max_frame_age_ms: 1_000,
        }
    }
}

impl ThermalConfig {
    /// Set the hotspot threshold.
    pub fn with_hotspot_threshold_c(mut self, celsius: f32) -> Self {
        self.hotspot_threshold_c = celsius;
        self
    }

    /// Set the horizontal field of view.
    pub fn with_fov_deg(mut self, deg: f32) -> Self {
        self.fov_deg = deg;
        self
    }

    /// Set the centroid window radius.
    pub fn with_window_radius(mut self, pixels: usize) -> Self {
        self.window_radius = pixels;
        self
    }

    /// Set the frame staleness bound.
    pub fn with_max_frame_age_ms(mut self, ms: u64) -> Self {
        self.max_frame_age_ms = ms;
        self
    }

    /// Reject a degenerate field of view or staleness bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fov_deg.is_finite() || self.fov_deg <= 0.0 {
            return Err(ConfigError::InvalidGain("field of view"));
        }
        if !self.hotspot_threshold_c.is_finite() {
            return Err(ConfigError::InvalidGain("hotspot threshold"));
        }
        if self.max_frame_age_ms == 0 {
            return Err(ConfigError::ZeroDuration("frame age bound"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(TurretConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_window_rejected() {
        let cfg = TimingConfig::default().with_shoot_window_ms(0);
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroDuration("shoot window")));
    }

    #[test]
    fn zero_period_rejected() {
        let cfg = SchedulerConfig::default().with_shooting_period_ms(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn negative_gain_rejected() {
        let cfg = PidConfig::default().with_gains(-0.1, 0.0, 0.0);
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidGain("pid gain")));
    }

    #[test]
    fn nan_gain_rejected() {
        let cfg = PidConfig::default().with_gains(f32::NAN, 0.0, 0.0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn servo_endpoint_outside_travel_rejected() {
        let cfg = ServoConfig::default().with_endpoints_deg(300.0, 45.0);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidServoCalibration("endpoint"))
        );
    }

    #[test]
    fn servo_inverted_pulse_range_rejected() {
        let cfg = ServoConfig::default().with_pulse_range_us(2_500, 500);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn overdriven_max_duty_rejected() {
        let cfg = MotorConfig::default().with_max_duty(150.0);
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidLimit("max duty")));
    }

    #[test]
    fn builder_chain_keeps_other_sections() {
        let cfg = TurretConfig::default()
            .with_motor(MotorConfig::default().with_max_duty(60.0))
            .with_thermal(ThermalConfig::default().with_fov_deg(40.0));
        assert_eq!(cfg.motor.max_duty, 60.0);
        assert_eq!(cfg.thermal.fov_deg, 40.0);
        assert_eq!(cfg.timing.start_window_ms, 5_000);
    }

    #[cfg(feature = "std")]
    #[test]
    fn config_error_display() {
        let err = ConfigError::ZeroDuration("start window");
        assert_eq!(format!("{err}"), "start window must be nonzero");
    }
}
