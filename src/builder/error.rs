//! Configuration errors for the action state builder.

use thiserror::Error;

/// Errors that can occur when building an action state.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("Fixed delta must be finite and non-negative, got {0}")]
    InvalidFixedDelta(f32),

    #[error("Both a clock and a fixed delta were configured. Call only one of .clock() or .fixed_delta()")]
    ConflictingClock,
}
