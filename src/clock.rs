//! Per-tick elapsed time sources.
//!
//! `ActionState::update` samples its clock once per external tick and uses
//! that delta to accumulate the time spent in the current state.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

/// Source of the elapsed seconds since the previous tick.
pub trait Clock {
    fn delta(&mut self) -> f32;
}

/// Wall clock measuring the time between consecutive samples.
///
/// The first sample measures from construction.
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FrameClock {
    fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt
    }
}

/// Constant delta, for fixed-step loops.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedClock(pub f32);

impl Clock for FixedClock {
    fn delta(&mut self) -> f32 {
        self.0
    }
}

/// Delta set by the host through a shared handle.
///
/// Clones share the same cell, so the host keeps one handle and gives another
/// to the machine.
#[derive(Clone, Default)]
pub struct ManualClock {
    delta: Rc<Cell<f32>>,
}

impl ManualClock {
    pub fn new(delta: f32) -> Self {
        Self {
            delta: Rc::new(Cell::new(delta)),
        }
    }

    pub fn set(&self, delta: f32) {
        self.delta.set(delta);
    }

    pub fn get(&self) -> f32 {
        self.delta.get()
    }
}

impl Clock for ManualClock {
    fn delta(&mut self) -> f32 {
        self.delta.get()
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ManualClock").field(&self.delta.get()).finish()
    }
}
