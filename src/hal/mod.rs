//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits defined in
//! [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: test doubles for desktop development and unit tests
//! - `desktop`: std-backed implementations for the simulator and
//!   closed-loop integration tests (requires `std`)
//!
//! Real hardware backends (timer-capture counters, PWM peripherals, an I2C
//! thermal camera) live outside this crate and implement the same traits.

pub mod mock;

#[cfg(feature = "std")]
pub mod desktop;

pub use mock::*;

#[cfg(feature = "std")]
pub use desktop::*;
