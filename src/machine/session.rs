//! The single live run of a machine.

use crate::core::{StateId, NONE_STATE};
use crate::runner::StateRunner;

/// Mutable record of the state in progress.
///
/// The active runner is taken out while its callback runs. `generation`
/// changes on every transition and on clear, which tells the dispatcher
/// whether the runner it took is still the active one.
pub(crate) struct Session {
    pub runner: Option<Box<dyn StateRunner>>,
    pub state: StateId,
    pub time: f32,
    pub count: u32,
    pub run_count: u32,
    pub stopped: bool,
    pub previous: StateId,
    pub on_destroy: Option<Box<dyn FnOnce()>>,
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self {
            runner: None,
            state: NONE_STATE,
            time: 0.0,
            count: 0,
            run_count: 0,
            stopped: false,
            previous: NONE_STATE,
            on_destroy: None,
            generation: 0,
        }
    }

    /// Install a new runner and reset the per-state counters.
    /// Returns the id of the state that was active before.
    pub fn begin(&mut self, runner: Box<dyn StateRunner>) -> StateId {
        let previous = self.state;
        self.dispose_runner();
        self.state = runner.state_id();
        self.runner = Some(runner);
        self.time = 0.0;
        self.count = 0;
        self.run_count += 1;
        self.stopped = false;
        self.previous = previous;
        self.generation += 1;
        previous
    }

    /// Take the active runner for dispatch.
    pub fn take_runner(&mut self) -> Option<(Box<dyn StateRunner>, u64)> {
        self.runner.take().map(|runner| (runner, self.generation))
    }

    /// Put a dispatched runner back, or recycle it if the session moved on.
    pub fn restore(&mut self, runner: Box<dyn StateRunner>, generation: u64) {
        if self.generation == generation && self.runner.is_none() {
            self.runner = Some(runner);
        } else {
            runner.recycle();
        }
    }

    /// Account for one tick: time first (zero on the first tick), then count.
    pub fn advance(&mut self, delta: f32) {
        self.time = if self.count > 0 {
            self.time + delta
        } else {
            0.0
        };
        self.count += 1;
    }

    /// Return the runner and reset every field to its initial value.
    pub fn clear(&mut self) {
        self.dispose_runner();
        self.state = NONE_STATE;
        self.time = 0.0;
        self.count = 0;
        self.run_count = 0;
        self.stopped = false;
        self.previous = NONE_STATE;
        self.on_destroy = None;
        self.generation += 1;
    }

    fn dispose_runner(&mut self) {
        if let Some(runner) = self.runner.take() {
            runner.recycle();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.dispose_runner();
    }
}
