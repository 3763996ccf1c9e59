//! Runners bind a state definition to concrete argument values for one
//! activation of a session.
//!
//! Runners are pooled per argument signature (see [`pool`]) so entering a
//! state does not allocate once the pool is warm.

pub mod pool;

use crate::core::{StateAction, StateDefinition, StateId, NONE_STATE};
use crate::machine::{ActionState, ActionStateError, StateResult};
use std::fmt;
use std::rc::Rc;

/// Type-erased view of a checked-out runner, held by the session.
pub(crate) trait StateRunner {
    /// Id of the bound state, [`NONE_STATE`] when unbound.
    fn state_id(&self) -> StateId;

    /// Invoke the bound callback.
    fn run(&self, machine: &mut ActionState) -> StateResult;

    /// Clear all bindings and hand the runner back to its pool.
    fn recycle(self: Box<Self>);
}

/// Dispatch record for states taking the argument tuple `A`.
pub struct Runner<A> {
    definition: Option<Rc<StateDefinition>>,
    action: Option<StateAction<A>>,
    args: Option<A>,
}

impl<A: 'static> Runner<A> {
    pub(crate) fn empty() -> Self {
        Self {
            definition: None,
            action: None,
            args: None,
        }
    }

    pub(crate) fn bind(
        &mut self,
        definition: Rc<StateDefinition>,
        action: StateAction<A>,
        args: A,
    ) {
        self.definition = Some(definition);
        self.action = Some(action);
        self.args = Some(args);
    }

    /// Drop every reference held from the last binding.
    pub(crate) fn clear(&mut self) {
        self.definition = None;
        self.action = None;
        self.args = None;
    }

    pub fn is_bound(&self) -> bool {
        self.definition.is_some()
    }

    pub fn args(&self) -> Option<&A> {
        self.args.as_ref()
    }

    pub fn definition(&self) -> Option<&StateDefinition> {
        self.definition.as_deref()
    }
}

impl<A: 'static> StateRunner for Runner<A> {
    fn state_id(&self) -> StateId {
        self.definition.as_ref().map_or(NONE_STATE, |d| d.id())
    }

    fn run(&self, machine: &mut ActionState) -> StateResult {
        match (&self.action, &self.args) {
            (Some(action), Some(args)) => action(machine, args),
            _ => Err(ActionStateError::UnboundRunner.into()),
        }
    }

    fn recycle(mut self: Box<Self>) {
        self.clear();
        pool::give_back(self);
    }
}

impl<A> fmt::Debug for Runner<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("definition", &self.definition)
            .field("has_args", &self.args.is_some())
            .finish()
    }
}
