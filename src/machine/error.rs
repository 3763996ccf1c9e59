//! Errors returned by machine operations.

use crate::core::{Arity, StateId};
use thiserror::Error;

/// Fault raised by a state callback.
pub type StateFault = anyhow::Error;

/// Return type of every state callback.
pub type StateResult = Result<(), StateFault>;

/// Errors that can occur while driving an action state.
#[derive(Debug, Error)]
pub enum ActionStateError {
    /// Transition target was never defined
    #[error("No state definition exists ({0})")]
    UnknownState(StateId),

    /// Transition arguments do not match the callback's signature
    #[error("State {state} takes {arity} argument(s) of {expected}, got {found}")]
    SignatureMismatch {
        state: StateId,
        arity: Arity,
        expected: &'static str,
        found: &'static str,
    },

    /// `entry` called on a machine that is already running
    #[error("Action state has been entered already (current state {current})")]
    AlreadyEntered { current: StateId },

    /// A runner was dispatched without a binding
    #[error("State runner has no binding")]
    UnboundRunner,

    /// A callback fault that no error state handled
    #[error("State {state} failed: {source}")]
    Fault {
        state: StateId,
        #[source]
        source: StateFault,
    },
}

impl ActionStateError {
    /// Turn a callback fault into the error reported by `update`.
    ///
    /// Machine errors a callback propagated with `?` come back unchanged.
    pub(crate) fn from_fault(state: StateId, fault: StateFault) -> Self {
        match fault.downcast::<ActionStateError>() {
            Ok(error) => error,
            Err(source) => Self::Fault { state, source },
        }
    }

    /// State the error is attributed to, if any.
    pub fn state(&self) -> Option<StateId> {
        match self {
            Self::UnknownState(state) => Some(*state),
            Self::SignatureMismatch { state, .. } => Some(*state),
            Self::AlreadyEntered { current } => Some(*current),
            Self::UnboundRunner => None,
            Self::Fault { state, .. } => Some(*state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn foreign_fault_is_wrapped() {
        let error = ActionStateError::from_fault(3, anyhow!("boom"));

        match &error {
            ActionStateError::Fault { state, source } => {
                assert_eq!(*state, 3);
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("Expected Fault, got {other:?}"),
        }
        assert_eq!(error.to_string(), "State 3 failed: boom");
    }

    #[test]
    fn machine_error_passes_through() {
        let fault: StateFault = ActionStateError::UnknownState(12).into();
        let error = ActionStateError::from_fault(3, fault);

        assert!(matches!(error, ActionStateError::UnknownState(12)));
        assert_eq!(error.state(), Some(12));
    }

    #[test]
    fn signature_mismatch_names_both_sides() {
        let error = ActionStateError::SignatureMismatch {
            state: 4,
            arity: Arity::One,
            expected: "(u32,)",
            found: "()",
        };
        assert_eq!(
            error.to_string(),
            "State 4 takes 1 argument(s) of (u32,), got ()"
        );
    }
}
