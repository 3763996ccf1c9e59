//! Builder for configuring an action state.
//!
//! [`ActionState::new`](crate::ActionState::new) covers the common case; the
//! builder adds a name for logs, a choice of clock and transition history.
//!
//! # Example
//!
//! ```
//! use action_state::ActionState;
//!
//! let state = ActionState::builder()
//!     .name("spawner")
//!     .fixed_delta(1.0 / 60.0)
//!     .history_capacity(16)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(state.name(), Some("spawner"));
//! assert_eq!(state.history().capacity(), 16);
//! ```

pub mod error;

pub use error::BuildError;

use crate::clock::{Clock, FixedClock, FrameClock};
use crate::core::TransitionHistory;
use crate::machine::ActionState;

/// Fluent configuration for [`ActionState`].
#[derive(Default)]
pub struct ActionStateBuilder {
    name: Option<String>,
    clock: Option<Box<dyn Clock>>,
    fixed_delta: Option<f32>,
    history_capacity: usize,
}

impl ActionStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name reported in snapshots and debug output.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Clock sampled by `update`. Defaults to [`FrameClock`].
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Advance by a constant delta on every `update`.
    pub fn fixed_delta(mut self, delta: f32) -> Self {
        self.fixed_delta = Some(delta);
        self
    }

    /// Keep the most recent `capacity` transitions. `0` disables history.
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Build the action state.
    /// Returns an error if the clock configuration is invalid.
    pub fn build(self) -> Result<ActionState, BuildError> {
        let clock: Box<dyn Clock> = match (self.clock, self.fixed_delta) {
            (Some(_), Some(_)) => return Err(BuildError::ConflictingClock),
            (Some(clock), None) => clock,
            (None, Some(delta)) => {
                if !delta.is_finite() || delta < 0.0 {
                    return Err(BuildError::InvalidFixedDelta(delta));
                }
                Box::new(FixedClock(delta))
            }
            (None, None) => Box::new(FrameClock::new()),
        };

        let history = if self.history_capacity > 0 {
            TransitionHistory::with_capacity(self.history_capacity)
        } else {
            TransitionHistory::disabled()
        };

        Ok(ActionState::from_parts(self.name, clock, history))
    }
}
