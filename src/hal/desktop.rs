//! Std-backed implementations for the simulator and closed-loop tests.
//!
//! The `Shared*` types are cheaply clonable handles over one piece of
//! state, so a test or simulator can keep a handle to an input while the
//! machine owns the other clone. That is how a closed loop is built on the
//! desktop: read the commanded duty from the machine, integrate a little
//! plant model, and push the result back through a [`SharedCounter`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use crate::traits::{Clock, FrameCells, QuadratureCounter, StartInput, ThermalSensor};

/// Wall-clock time source over [`std::time::Instant`].
#[derive(Debug)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Creates a clock whose epoch is the moment of construction.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Clonable quadrature counter; all clones see the same register.
#[derive(Clone, Debug)]
pub struct SharedCounter {
    raw: Rc<Cell<u32>>,
    modulus: u32,
}

impl SharedCounter {
    /// Creates a counter with the given modulus, starting at zero.
    pub fn new(modulus: u32) -> Self {
        Self {
            raw: Rc::new(Cell::new(0)),
            modulus,
        }
    }

    /// Move the register by a signed delta, wrapping at the modulus.
    pub fn advance(&self, delta: i64) {
        let m = i64::from(self.modulus);
        let next = (i64::from(self.raw.get()) + delta).rem_euclid(m) as u32;
        self.raw.set(next);
    }

    /// Set the register directly.
    pub fn set(&self, raw: u32) {
        self.raw.set(raw % self.modulus);
    }
}

impl QuadratureCounter for SharedCounter {
    fn modulus(&self) -> u32 {
        self.modulus
    }

    fn raw_count(&mut self) -> u32 {
        self.raw.get()
    }
}

/// Clonable start button; all clones see the same level.
#[derive(Clone, Debug, Default)]
pub struct SharedButton {
    level: Rc<Cell<bool>>,
}

impl SharedButton {
    /// Creates a released button.
    pub fn new() -> Self {
        Self::default()
    }

    /// Press the button.
    pub fn press(&self) {
        self.level.set(true);
    }

    /// Release the button.
    pub fn release(&self) {
        self.level.set(false);
    }
}

impl StartInput for SharedButton {
    fn is_active(&self) -> bool {
        self.level.get()
    }
}

#[derive(Debug)]
struct SceneState {
    width: usize,
    height: usize,
    scene: Option<FrameCells>,
    interval_polls: u32,
    countdown: u32,
}

/// Clonable thermal sensor serving a settable scene.
///
/// Completes a copy of the current scene every `interval_polls` polls,
/// mimicking a camera that is slower than the control tick. Change the
/// scene mid-run through any clone to move the simulated heat source.
#[derive(Clone, Debug)]
pub struct SharedThermal {
    state: Rc<RefCell<SceneState>>,
}

impl SharedThermal {
    /// Creates a sensor with no scene; polls return no frame until one is
    /// set.
    pub fn new(width: usize, height: usize, interval_polls: u32) -> Self {
        Self {
            state: Rc::new(RefCell::new(SceneState {
                width,
                height,
                scene: None,
                interval_polls: interval_polls.max(1),
                countdown: interval_polls.max(1),
            })),
        }
    }

    /// Replace the scene the sensor keeps capturing.
    pub fn set_scene(&self, cells: FrameCells) {
        self.state.borrow_mut().scene = Some(cells);
    }

    /// Remove the scene; subsequent polls complete no frames.
    pub fn clear_scene(&self) {
        self.state.borrow_mut().scene = None;
    }
}

impl ThermalSensor for SharedThermal {
    type Error = ();

    fn resolution(&self) -> (usize, usize) {
        let state = self.state.borrow();
        (state.width, state.height)
    }

    fn poll_frame(&mut self) -> Result<Option<FrameCells>, ()> {
        let mut state = self.state.borrow_mut();
        if state.scene.is_none() {
            return Ok(None);
        }
        if state.countdown > 1 {
            state.countdown -= 1;
            return Ok(None);
        }
        state.countdown = state.interval_polls;
        Ok(state.scene.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_counter_clones_share_state() {
        let handle = SharedCounter::new(65_536);
        let mut reader_side = handle.clone();
        handle.advance(100);
        assert_eq!(reader_side.raw_count(), 100);
        handle.advance(-200);
        assert_eq!(reader_side.raw_count(), 65_436);
    }

    #[test]
    fn shared_button_clones_share_state() {
        let handle = SharedButton::new();
        let machine_side = handle.clone();
        handle.press();
        assert!(machine_side.is_active());
        handle.release();
        assert!(!machine_side.is_active());
    }

    #[test]
    fn shared_thermal_completes_on_interval() {
        let handle = SharedThermal::new(1, 1, 3);
        let mut sensor = handle.clone();

        let mut cells = FrameCells::new();
        cells.push(36.0).unwrap();
        handle.set_scene(cells);

        assert!(sensor.poll_frame().unwrap().is_none());
        assert!(sensor.poll_frame().unwrap().is_none());
        assert!(sensor.poll_frame().unwrap().is_some());
        // Interval restarts.
        assert!(sensor.poll_frame().unwrap().is_none());
    }

    #[test]
    fn shared_thermal_without_scene_is_silent() {
        let mut sensor = SharedThermal::new(1, 1, 1);
        assert!(sensor.poll_frame().unwrap().is_none());
    }
}
