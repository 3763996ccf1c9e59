//! State definitions and the registry that owns them.
//!
//! A definition pairs a caller-chosen [`StateId`] with a callback taking zero,
//! one or two typed arguments. All three shapes are stored as one action over
//! an argument tuple so the dispatch side only ever deals with `Runner<A>`.

use crate::machine::{ActionState, StateResult};
use serde::{Deserialize, Serialize};
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::rc::Rc;
use tracing::error;

/// Identifier of a state within one machine.
pub type StateId = i32;

/// Sentinel for "no state": reported by `current()` before entry and after destroy.
pub const NONE_STATE: StateId = -1;

/// Reserved slot populated by [`ActionState::on_error`].
pub const ERROR_STATE: StateId = -1001;

/// Reserved slot populated by [`ActionState::entry`].
pub const ENTRY_STATE: StateId = -1002;

/// Returns true for ids hosts may not register through `define`.
pub fn is_reserved(id: StateId) -> bool {
    matches!(id, NONE_STATE | ERROR_STATE | ENTRY_STATE)
}

/// Number of typed arguments a state callback receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arity {
    Zero,
    One,
    Two,
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = match self {
            Self::Zero => 0,
            Self::One => 1,
            Self::Two => 2,
        };
        write!(f, "{n}")
    }
}

/// A state callback normalised over its argument tuple.
pub(crate) type StateAction<A> = Rc<dyn Fn(&mut ActionState, &A) -> StateResult>;

/// One registered state. Never mutated after registration.
pub struct StateDefinition {
    id: StateId,
    arity: Arity,
    signature: TypeId,
    signature_name: &'static str,
    action: Rc<dyn Any>,
}

impl StateDefinition {
    pub(crate) fn new<A: 'static>(id: StateId, arity: Arity, action: StateAction<A>) -> Self {
        Self {
            id,
            arity,
            signature: TypeId::of::<A>(),
            signature_name: type_name::<A>(),
            action: Rc::new(action),
        }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Rust type name of the argument tuple, for diagnostics.
    pub fn signature_name(&self) -> &'static str {
        self.signature_name
    }

    /// Check whether this definition accepts arguments of tuple type `A`.
    pub fn accepts<A: 'static>(&self) -> bool {
        self.signature == TypeId::of::<A>()
    }

    /// Typed action for argument tuple `A`, or `None` on a signature mismatch.
    pub(crate) fn action<A: 'static>(&self) -> Option<StateAction<A>> {
        self.action.downcast_ref::<StateAction<A>>().cloned()
    }
}

impl fmt::Debug for StateDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDefinition")
            .field("id", &self.id)
            .field("arity", &self.arity)
            .field("signature", &self.signature_name)
            .finish()
    }
}

/// Ordered set of state definitions, at most one per id.
///
/// Lookups scan linearly; machines hold a handful of states.
#[derive(Default)]
pub struct StateRegistry {
    definitions: Vec<Rc<StateDefinition>>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. A duplicate id is logged and discarded,
    /// keeping the existing definition.
    pub fn insert(&mut self, definition: StateDefinition) -> bool {
        if self.find(definition.id()).is_some() {
            error!(state = definition.id(), "State definition exists already");
            return false;
        }
        self.definitions.push(Rc::new(definition));
        true
    }

    /// Register a definition, replacing any existing one with the same id.
    pub(crate) fn replace(&mut self, definition: StateDefinition) {
        let definition = Rc::new(definition);
        match self
            .definitions
            .iter_mut()
            .find(|d| d.id() == definition.id())
        {
            Some(slot) => *slot = definition,
            None => self.definitions.push(definition),
        }
    }

    /// Look up a definition without emitting diagnostics.
    pub fn find(&self, id: StateId) -> Option<&Rc<StateDefinition>> {
        self.definitions.iter().find(|d| d.id() == id)
    }

    /// Look up a definition; a miss is a caller bug and is logged.
    pub fn get(&self, id: StateId) -> Option<&Rc<StateDefinition>> {
        let found = self.find(id);
        if found.is_none() {
            error!(state = id, "No state definition exists");
        }
        found
    }

    pub fn contains(&self, id: StateId) -> bool {
        self.find(id).is_some()
    }

    /// Registered ids in insertion order.
    pub fn ids(&self) -> Vec<StateId> {
        self.definitions.iter().map(|d| d.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl fmt::Debug for StateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.definitions.iter()).finish()
    }
}
