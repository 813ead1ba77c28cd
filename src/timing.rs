//! Match-phase sequencing task.
//!
//! The timing machine owns the shootout's clock: it waits for the start
//! button, then walks through the start, shoot, stop, and return windows on
//! configured durations, publishing a [`MatchPhase`] snapshot that the
//! shooting task reads after this task has finished its pass. Single
//! writer, transitions only at tick boundaries.

use crate::config::{ConfigError, TimingConfig};
use crate::traits::StartInput;

/// The phase flags published to the shooting task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MatchPhase {
    /// No match running; waiting on the start button.
    #[default]
    WaitForInput,
    /// Start window: turret may pre-rotate and acquire, no firing.
    Starting,
    /// Shoot window: firing is allowed.
    Shooting,
    /// Shoot window closed; everything must stop.
    Stopped,
    /// Turret returns to its reference position.
    Returning,
}

impl MatchPhase {
    /// Returns the phase as a lowercase string for logs and displays.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MatchPhase::WaitForInput => "wait_for_input",
            MatchPhase::Starting => "starting",
            MatchPhase::Shooting => "shooting",
            MatchPhase::Stopped => "stopped",
            MatchPhase::Returning => "returning",
        }
    }
}

/// Internal state of the timing task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimingState {
    /// One-shot setup state.
    Init,
    /// Waiting for a rising edge on the start input.
    WaitForInput,
    /// Counting down the start window.
    WaitForStart,
    /// Counting down the shoot window.
    WaitForStop,
    /// Counting down the stop settling delay.
    Stopped,
    /// Counting down the return window.
    Return,
}

/// Match sequencer over a debounced start input.
///
/// # Type Parameter
///
/// - `B`: the start-button capability ([`StartInput`] trait)
pub struct TimingStateMachine<B: StartInput> {
    input: B,
    cfg: TimingConfig,
    state: TimingState,
    entered_ms: u64,
    prev_level: bool,
    phase: MatchPhase,
}

impl<B: StartInput> TimingStateMachine<B> {
    /// Create the sequencer in its init state.
    pub fn new(input: B, cfg: TimingConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            input,
            cfg,
            state: TimingState::Init,
            entered_ms: 0,
            prev_level: false,
            phase: MatchPhase::WaitForInput,
        })
    }

    /// Run one pass of the state machine. Never blocks.
    pub fn tick(&mut self, now_ms: u64) {
        match self.state {
            TimingState::Init => {
                // Baseline the edge detector so a button held across reset
                // can't auto-start a match.
                self.prev_level = self.input.is_active();
                self.enter(TimingState::WaitForInput, now_ms);
            }
            TimingState::WaitForInput => {
                let level = self.input.is_active();
                let rising = level && !self.prev_level;
                self.prev_level = level;
                if rising {
                    self.enter(TimingState::WaitForStart, now_ms);
                }
            }
            TimingState::WaitForStart => {
                if now_ms.saturating_sub(self.entered_ms) >= self.cfg.start_window_ms {
                    self.enter(TimingState::WaitForStop, now_ms);
                }
            }
            TimingState::WaitForStop => {
                if now_ms.saturating_sub(self.entered_ms) >= self.cfg.shoot_window_ms {
                    self.enter(TimingState::Stopped, now_ms);
                }
            }
            TimingState::Stopped => {
                if now_ms.saturating_sub(self.entered_ms) >= self.cfg.stop_delay_ms {
                    self.enter(TimingState::Return, now_ms);
                }
            }
            TimingState::Return => {
                if now_ms.saturating_sub(self.entered_ms) >= self.cfg.return_window_ms {
                    self.enter(TimingState::WaitForInput, now_ms);
                }
            }
        }
    }

    /// The currently published phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// The internal state (diagnostics and tests).
    pub fn state(&self) -> TimingState {
        self.state
    }

    /// Access the start input (simulation and tests).
    pub fn input_mut(&mut self) -> &mut B {
        &mut self.input
    }

    fn enter(&mut self, state: TimingState, now_ms: u64) {
        self.state = state;
        self.entered_ms = now_ms;
        if state == TimingState::WaitForInput {
            // Re-arm edge detection against a still-held button.
            self.prev_level = self.input.is_active();
        }
        self.phase = match state {
            TimingState::Init | TimingState::WaitForInput => MatchPhase::WaitForInput,
            TimingState::WaitForStart => MatchPhase::Starting,
            TimingState::WaitForStop => MatchPhase::Shooting,
            TimingState::Stopped => MatchPhase::Stopped,
            TimingState::Return => MatchPhase::Returning,
        };
    }
}
