//! Wrap-aware position accumulation over a raw quadrature counter.
//!
//! The hardware counter is a modulo register (typically 16 bits) fed by
//! encoder edges; it wraps many times during a single 180-degree slew. This
//! module turns successive raw reads into an unbounded signed count by
//! inferring wraps from half-range jumps, and guards against corrupted reads
//! with a plausibility bound.
//!
//! # Example
//!
//! ```rust
//! use rs_turret::encoder::EncoderReader;
//! use rs_turret::config::EncoderConfig;
//! use rs_turret::hal::MockCounter;
//!
//! let mut counter = MockCounter::new(65_536);
//! counter.raw = 10;
//! let mut reader = EncoderReader::new(counter, EncoderConfig::default()).unwrap();
//!
//! reader.counter_mut().raw = 50;
//! let sample = reader.sample(0);
//! assert_eq!(sample.count, 40);
//! ```

use crate::config::{ConfigError, EncoderConfig};
use crate::traits::QuadratureCounter;

/// One encoder reading: accumulated position plus when it was taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncoderSample {
    /// Accumulated signed position in counts.
    pub count: i64,
    /// Timestamp of the read (ms).
    pub timestamp_ms: u64,
}

/// Accumulates an unbounded signed position from a wrapping counter.
///
/// # Type Parameter
///
/// - `C`: the raw counter capability ([`QuadratureCounter`] trait)
pub struct EncoderReader<C: QuadratureCounter> {
    counter: C,
    cfg: EncoderConfig,
    prev_raw: u32,
    total: i64,
    glitch: bool,
}

impl<C: QuadratureCounter> EncoderReader<C> {
    /// Create a reader, taking the current raw value as the zero reference.
    pub fn new(mut counter: C, cfg: EncoderConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let prev_raw = counter.raw_count();
        Ok(Self {
            counter,
            cfg,
            prev_raw,
            total: 0,
            glitch: false,
        })
    }

    /// Read the counter and return the accumulated position. Non-blocking.
    ///
    /// A wrap is inferred whenever the raw delta exceeds half the counter
    /// modulus; the delta is corrected by the full modulus. A corrected
    /// delta beyond the configured plausibility bound sets the glitch flag
    /// and is discarded, holding the last good position.
    pub fn sample(&mut self, now_ms: u64) -> EncoderSample {
        let raw = self.counter.raw_count();
        let modulus = i64::from(self.counter.modulus());
        let half = modulus / 2;

        let mut delta = i64::from(raw) - i64::from(self.prev_raw);
        if delta <= -half {
            delta += modulus;
        } else if delta >= half {
            delta -= modulus;
        }
        self.prev_raw = raw;

        if delta.unsigned_abs() > u64::from(self.cfg.max_delta_per_read) {
            self.glitch = true;
        } else {
            self.total += delta;
        }

        EncoderSample {
            count: self.total,
            timestamp_ms: now_ms,
        }
    }

    /// Accumulated position without touching the hardware counter.
    pub fn count(&self) -> i64 {
        self.total
    }

    /// Accumulated position in radians, using the configured CPR at 4x
    /// quadrature decoding.
    pub fn position_rad(&self) -> f32 {
        let counts_per_rev = (self.cfg.cpr * 4) as f32;
        self.total as f32 * (2.0 * core::f32::consts::PI) / counts_per_rev
    }

    /// Re-reference the accumulated position to zero at the current spot.
    pub fn zero(&mut self) {
        self.total = 0;
    }

    /// Returns and clears the glitch flag.
    ///
    /// Reported, not fatal: the caller decides whether to freeze the motor
    /// output for the tick.
    pub fn take_glitch(&mut self) -> bool {
        core::mem::replace(&mut self.glitch, false)
    }

    /// Access the underlying counter (simulation and tests).
    pub fn counter_mut(&mut self) -> &mut C {
        &mut self.counter
    }
}
