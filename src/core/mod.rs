//! State identifiers, definitions, registry and transition history.
//!
//! This module holds the data the machine is built from:
//! - State ids and the reserved sentinels
//! - Typed state definitions and the registry that owns them
//! - Optional bounded history of transitions

mod definition;
mod history;

pub use definition::{
    is_reserved, Arity, StateDefinition, StateId, StateRegistry, ENTRY_STATE, ERROR_STATE,
    NONE_STATE,
};
pub(crate) use definition::StateAction;
pub use history::{TransitionHistory, TransitionKind, TransitionRecord};
