//! Action State: a small per-object cooperative state machine.
//!
//! Each logical state is a callback run once per frame tick. The machine
//! tracks the elapsed time and tick count since the current state was
//! entered, supports immediate ([`ActionState::change`]) and deferred
//! ([`ActionState::next`]) transitions, passes up to two typed arguments into
//! state callbacks, and pools its per-transition runners so steady-state
//! transitions do not allocate.
//!
//! # Core Concepts
//!
//! - **State**: an integer id with a callback of zero, one or two arguments
//! - **Session**: the one active run, with its time, count and run count
//! - **Runner**: a pooled record binding a state to its arguments
//! - **Error state**: where a callback fault is redirected when a handler is set
//!
//! # Example
//!
//! ```rust
//! use action_state::{ActionState, ERROR_STATE};
//! use anyhow::anyhow;
//!
//! let mut state = ActionState::new();
//! state
//!     .define(0, |_| Err(anyhow!("lost target")))
//!     .on_error(|state, fault| {
//!         assert_eq!(fault.to_string(), "lost target");
//!         state.stop();
//!         Ok(())
//!     });
//!
//! state.next(0).unwrap();
//! state.update_by(0.016).unwrap();
//! assert_eq!(state.current(), ERROR_STATE);
//!
//! state.update_by(0.016).unwrap();
//! assert!(state.stopped());
//! ```

pub mod builder;
pub mod clock;
pub mod core;
pub mod machine;
pub mod runner;
pub mod snapshot;

// Re-export commonly used types
pub use builder::{ActionStateBuilder, BuildError};
pub use clock::{Clock, FixedClock, FrameClock, ManualClock};
pub use crate::core::{Arity, StateId, TransitionKind, ENTRY_STATE, ERROR_STATE, NONE_STATE};
pub use machine::{ActionState, ActionStateError, StateFault, StateResult};
pub use snapshot::{SessionSnapshot, SnapshotError};
