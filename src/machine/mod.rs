//! The action state: a per-object state machine ticked once per frame.
//!
//! Each state is a callback invoked once per [`ActionState::update`]. The
//! machine tracks the time and tick count since the current state was
//! entered, and callbacks steer it through the handle they receive:
//!
//! - [`change`](ActionState::change) switches state and runs the new state's
//!   first tick before returning
//! - [`next`](ActionState::next) switches state; the new state first runs on
//!   the following update
//! - [`stop`](ActionState::stop) suspends dispatch until the next transition
//!
//! # Example
//!
//! ```rust
//! use action_state::ActionState;
//!
//! const WAIT: i32 = 0;
//! const FIRE: i32 = 1;
//!
//! let mut state = ActionState::new();
//! state
//!     .define(WAIT, |state| {
//!         if state.count() >= 3 {
//!             state.change1(FIRE, 2u32)?;
//!         }
//!         Ok(())
//!     })
//!     .define1(FIRE, |state, shots: &u32| {
//!         assert_eq!(*shots, 2);
//!         state.next(WAIT)?;
//!         Ok(())
//!     });
//!
//! state.next(WAIT).unwrap();
//! for _ in 0..3 {
//!     state.update_by(0.1).unwrap();
//! }
//! assert_eq!(state.current(), WAIT);
//! assert_eq!(state.previous(), FIRE);
//! assert_eq!(state.count(), 0);
//! ```

mod error;
mod session;

pub use error::{ActionStateError, StateFault, StateResult};

use crate::builder::ActionStateBuilder;
use crate::clock::{Clock, FrameClock};
use crate::core::{
    is_reserved, Arity, StateAction, StateDefinition, StateId, StateRegistry, TransitionHistory,
    TransitionKind, TransitionRecord, ENTRY_STATE, ERROR_STATE, NONE_STATE,
};
use crate::runner::{pool, StateRunner};
use crate::snapshot::SessionSnapshot;
use chrono::Utc;
use session::Session;
use std::any::type_name;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Per-object cooperative state machine.
pub struct ActionState {
    id: Uuid,
    name: Option<String>,
    registry: StateRegistry,
    session: Session,
    clock: Box<dyn Clock>,
    frame_delta: f32,
    history: TransitionHistory,
}

impl ActionState {
    /// Machine on the wall clock with history disabled.
    pub fn new() -> Self {
        Self::from_parts(None, Box::new(FrameClock::new()), TransitionHistory::disabled())
    }

    pub fn builder() -> ActionStateBuilder {
        ActionStateBuilder::new()
    }

    pub(crate) fn from_parts(
        name: Option<String>,
        clock: Box<dyn Clock>,
        history: TransitionHistory,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            registry: StateRegistry::new(),
            session: Session::new(),
            clock,
            frame_delta: 0.0,
            history,
        }
    }

    // Define

    /// Define a state whose callback takes no arguments.
    ///
    /// A duplicate or reserved id is logged and the definition discarded.
    pub fn define<F>(&mut self, id: StateId, action: F) -> &mut Self
    where
        F: Fn(&mut ActionState) -> StateResult + 'static,
    {
        self.define_checked(nullary(id, action))
    }

    /// Define a state whose callback takes one argument.
    pub fn define1<T1, F>(&mut self, id: StateId, action: F) -> &mut Self
    where
        T1: 'static,
        F: Fn(&mut ActionState, &T1) -> StateResult + 'static,
    {
        self.define_checked(unary(id, action))
    }

    /// Define a state whose callback takes two arguments.
    pub fn define2<T1, T2, F>(&mut self, id: StateId, action: F) -> &mut Self
    where
        T1: 'static,
        T2: 'static,
        F: Fn(&mut ActionState, &T1, &T2) -> StateResult + 'static,
    {
        let action: StateAction<(T1, T2)> =
            Rc::new(move |machine: &mut ActionState, (arg1, arg2): &(T1, T2)| {
                action(machine, arg1, arg2)
            });
        self.define_checked(StateDefinition::new(id, Arity::Two, action))
    }

    /// Install the error handler, entered when a callback faults.
    pub fn on_error<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut ActionState, &StateFault) -> StateResult + 'static,
    {
        self.registry.insert(unary(ERROR_STATE, handler));
        self
    }

    /// Set the callback run once by [`destroy`](Self::destroy). Last write wins.
    pub fn on_destroy<F>(&mut self, on_destroy: F) -> &mut Self
    where
        F: FnOnce() + 'static,
    {
        self.session.on_destroy = Some(Box::new(on_destroy));
        self
    }

    fn define_checked(&mut self, definition: StateDefinition) -> &mut Self {
        if is_reserved(definition.id()) {
            error!(
                machine = %self.id,
                state = definition.id(),
                "State id is reserved"
            );
            return self;
        }
        self.registry.insert(definition);
        self
    }

    pub fn find(&self, id: StateId) -> Option<&StateDefinition> {
        self.registry.find(id).map(|d| d.as_ref())
    }

    pub fn get(&self, id: StateId) -> Option<&StateDefinition> {
        self.registry.get(id).map(|d| d.as_ref())
    }

    pub fn registry(&self) -> &StateRegistry {
        &self.registry
    }

    // Change

    /// Switch to `id` and run its first tick before returning.
    pub fn change(&mut self, id: StateId) -> Result<(), ActionStateError> {
        let runner = self.bind(id, ())?;
        self.restart(runner)
    }

    pub fn change1<T1: 'static>(&mut self, id: StateId, arg1: T1) -> Result<(), ActionStateError> {
        let runner = self.bind(id, (arg1,))?;
        self.restart(runner)
    }

    pub fn change2<T1: 'static, T2: 'static>(
        &mut self,
        id: StateId,
        arg1: T1,
        arg2: T2,
    ) -> Result<(), ActionStateError> {
        let runner = self.bind(id, (arg1, arg2))?;
        self.restart(runner)
    }

    // Next

    /// Switch to `id`; its first tick runs on the following update.
    pub fn next(&mut self, id: StateId) -> Result<(), ActionStateError> {
        let runner = self.bind(id, ())?;
        self.reset(runner, TransitionKind::Next);
        Ok(())
    }

    pub fn next1<T1: 'static>(&mut self, id: StateId, arg1: T1) -> Result<(), ActionStateError> {
        let runner = self.bind(id, (arg1,))?;
        self.reset(runner, TransitionKind::Next);
        Ok(())
    }

    pub fn next2<T1: 'static, T2: 'static>(
        &mut self,
        id: StateId,
        arg1: T1,
        arg2: T2,
    ) -> Result<(), ActionStateError> {
        let runner = self.bind(id, (arg1, arg2))?;
        self.reset(runner, TransitionKind::Next);
        Ok(())
    }

    /// First-time start: run `action` from the reserved entry state on the
    /// next update. Fails if the machine is already running.
    pub fn entry<F>(&mut self, action: F) -> Result<(), ActionStateError>
    where
        F: Fn(&mut ActionState) -> StateResult + 'static,
    {
        let current = self.current();
        if current != NONE_STATE {
            return Err(ActionStateError::AlreadyEntered { current });
        }
        self.registry.replace(nullary(ENTRY_STATE, action));
        self.next(ENTRY_STATE)
    }

    // Stop, Update, Destroy

    /// Suspend dispatch until the next transition.
    pub fn stop(&mut self) {
        self.session.stopped = true;
        debug!(machine = %self.id, state = self.session.state, "Action state stopped");
    }

    /// Run one tick, sampling the machine's clock for the elapsed time.
    pub fn update(&mut self) -> Result<(), ActionStateError> {
        self.frame_delta = self.clock.delta();
        self.update_session()
    }

    /// Run one tick with a host-supplied elapsed time in seconds.
    pub fn update_by(&mut self, delta: f32) -> Result<(), ActionStateError> {
        self.frame_delta = delta;
        self.update_session()
    }

    /// Run the destroy callback (once) and clear the session.
    pub fn destroy(&mut self) {
        if let Some(on_destroy) = self.session.on_destroy.take() {
            on_destroy();
        }
        self.session.clear();
        self.history.clear();
        debug!(machine = %self.id, "Action state destroyed");
    }

    // Accessors

    /// Active state id, [`NONE_STATE`] when not entered.
    pub fn current(&self) -> StateId {
        self.session.state
    }

    pub fn previous(&self) -> StateId {
        self.session.previous
    }

    /// Seconds since the current state was entered, zero on its first tick.
    pub fn time(&self) -> f32 {
        self.session.time
    }

    /// Ticks run since the current state was entered.
    pub fn count(&self) -> u32 {
        self.session.count
    }

    /// Transitions since creation or the last destroy.
    pub fn run_count(&self) -> u32 {
        self.session.run_count
    }

    pub fn stopped(&self) -> bool {
        self.session.stopped
    }

    pub fn is_entered(&self) -> bool {
        self.session.state != NONE_STATE
    }

    /// Whether the machine is currently in the error state.
    pub fn in_error(&self) -> bool {
        self.session.state == ERROR_STATE
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn history(&self) -> &TransitionHistory {
        &self.history
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(self)
    }

    // Dispatch

    fn bind<A: 'static>(
        &self,
        id: StateId,
        args: A,
    ) -> Result<Box<dyn StateRunner>, ActionStateError> {
        let definition = self
            .registry
            .get(id)
            .ok_or(ActionStateError::UnknownState(id))?;

        let Some(action) = definition.action::<A>() else {
            error!(
                machine = %self.id,
                state = id,
                expected = definition.signature_name(),
                found = type_name::<A>(),
                "State argument signature mismatch"
            );
            return Err(ActionStateError::SignatureMismatch {
                state: id,
                arity: definition.arity(),
                expected: definition.signature_name(),
                found: type_name::<A>(),
            });
        };

        let mut runner = pool::rent::<A>();
        runner.bind(Rc::clone(definition), action, args);
        let runner: Box<dyn StateRunner> = runner;
        Ok(runner)
    }

    fn restart(&mut self, runner: Box<dyn StateRunner>) -> Result<(), ActionStateError> {
        self.reset(runner, TransitionKind::Change);
        self.update_session()
    }

    fn reset(&mut self, runner: Box<dyn StateRunner>, kind: TransitionKind) {
        let to = runner.state_id();
        let from = self.session.begin(runner);
        let run = self.session.run_count;
        debug!(machine = %self.id, from, to, ?kind, run, "State transition");

        if self.history.is_enabled() {
            self.history.record(TransitionRecord {
                from,
                to,
                kind,
                run,
                timestamp: Utc::now(),
            });
        }
    }

    fn update_session(&mut self) -> Result<(), ActionStateError> {
        if self.session.stopped {
            return Ok(());
        }
        let Some((runner, generation)) = self.session.take_runner() else {
            return Ok(());
        };

        self.session.advance(self.frame_delta);
        let outcome = runner.run(self);
        self.session.restore(runner, generation);

        match outcome {
            Ok(()) => Ok(()),
            Err(fault) => self.recover(fault),
        }
    }

    /// Route a callback fault to the error state, or stop and report it.
    fn recover(&mut self, fault: StateFault) -> Result<(), ActionStateError> {
        let state = self.session.state;
        if state != ERROR_STATE && self.registry.contains(ERROR_STATE) {
            warn!(machine = %self.id, state, error = %fault, "State fault redirected to error state");
            let runner = self.bind(ERROR_STATE, (fault,))?;
            self.reset(runner, TransitionKind::Error);
            return Ok(());
        }

        self.session.stopped = true;
        error!(machine = %self.id, state, error = %fault, "State fault stopped the action state");
        Err(ActionStateError::from_fault(state, fault))
    }
}

impl Default for ActionState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionState")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("current", &self.session.state)
            .field("previous", &self.session.previous)
            .field("time", &self.session.time)
            .field("count", &self.session.count)
            .field("run_count", &self.session.run_count)
            .field("stopped", &self.session.stopped)
            .field("states", &self.registry.ids())
            .finish()
    }
}

fn nullary<F>(id: StateId, action: F) -> StateDefinition
where
    F: Fn(&mut ActionState) -> StateResult + 'static,
{
    let action: StateAction<()> =
        Rc::new(move |machine: &mut ActionState, _: &()| action(machine));
    StateDefinition::new(id, Arity::Zero, action)
}

fn unary<T1, F>(id: StateId, action: F) -> StateDefinition
where
    T1: 'static,
    F: Fn(&mut ActionState, &T1) -> StateResult + 'static,
{
    let action: StateAction<(T1,)> =
        Rc::new(move |machine: &mut ActionState, (arg1,): &(T1,)| action(machine, arg1));
    StateDefinition::new(id, Arity::One, action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::{Cell, RefCell};

    fn counter() -> Rc<Cell<u32>> {
        Rc::new(Cell::new(0))
    }

    #[test]
    fn next_defers_first_tick_to_update() {
        let calls = counter();
        let seen = Rc::clone(&calls);
        let mut state = ActionState::new();
        state.define(0, move |_| {
            seen.set(seen.get() + 1);
            Ok(())
        });

        state.next(0).unwrap();
        assert_eq!(calls.get(), 0);
        assert_eq!(state.current(), 0);
        assert_eq!(state.count(), 0);

        state.update_by(0.5).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(state.count(), 1);
        assert_eq!(state.time(), 0.0);
    }

    #[test]
    fn time_accumulates_after_first_tick() {
        let mut state = ActionState::new();
        state.define(0, |_| Ok(()));
        state.next(0).unwrap();

        state.update_by(0.25).unwrap();
        state.update_by(0.25).unwrap();
        state.update_by(0.5).unwrap();

        assert_eq!(state.count(), 3);
        assert_eq!(state.time(), 0.75);
    }

    #[test]
    fn change_runs_target_within_same_update() {
        let calls = counter();
        let (zero, one) = (Rc::clone(&calls), Rc::clone(&calls));
        let mut state = ActionState::new();
        state
            .define(0, move |state| {
                zero.set(zero.get() + 1);
                state.change(1)?;
                Ok(())
            })
            .define(1, move |state| {
                one.set(one.get() + 1);
                state.next(0)?;
                Ok(())
            });

        state.next(0).unwrap();
        state.update_by(0.016).unwrap();

        assert_eq!(calls.get(), 2);
        // State 1 deferred a move back to 0.
        assert_eq!(state.current(), 0);
        assert_eq!(state.previous(), 1);
        assert_eq!(state.count(), 0);
        assert_eq!(state.run_count(), 3);
    }

    #[test]
    fn typed_arguments_reach_callbacks() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (one, two) = (Rc::clone(&seen), Rc::clone(&seen));
        let mut state = ActionState::new();
        state
            .define1(0, move |_, name: &String| {
                one.borrow_mut().push(name.clone());
                Ok(())
            })
            .define2(1, move |_, name: &String, times: &u8| {
                two.borrow_mut().push(name.repeat(*times as usize));
                Ok(())
            });

        state.change1(0, "a".to_string()).unwrap();
        state.change2(1, "b".to_string(), 3u8).unwrap();

        assert_eq!(*seen.borrow(), vec!["a".to_string(), "bbb".to_string()]);
    }

    #[test]
    fn unknown_state_leaves_session_untouched() {
        let mut state = ActionState::new();
        state.define(0, |_| Ok(()));
        state.next(0).unwrap();
        state.update_by(0.1).unwrap();

        let error = state.next(9).unwrap_err();
        assert!(matches!(error, ActionStateError::UnknownState(9)));
        assert_eq!(state.current(), 0);
        assert_eq!(state.count(), 1);
        assert_eq!(state.run_count(), 1);
    }

    #[test]
    fn signature_mismatch_is_rejected() {
        let mut state = ActionState::new();
        state.define1(0, |_, _: &u32| Ok(()));

        let error = state.next(0).unwrap_err();
        assert!(matches!(
            error,
            ActionStateError::SignatureMismatch { state: 0, arity: Arity::One, .. }
        ));
        assert!(state.next1(0, 5i64).is_err());
        assert!(state.next1(0, 5u32).is_ok());
    }

    #[test]
    fn reserved_ids_cannot_be_defined() {
        let mut state = ActionState::new();
        state
            .define(ERROR_STATE, |_| Ok(()))
            .define(NONE_STATE, |_| Ok(()))
            .define(ENTRY_STATE, |_| Ok(()));

        assert!(state.registry().is_empty());
    }

    #[test]
    fn stop_suppresses_updates_until_next_transition() {
        let calls = counter();
        let seen = Rc::clone(&calls);
        let mut state = ActionState::new();
        state.define(0, move |_| {
            seen.set(seen.get() + 1);
            Ok(())
        });
        state.next(0).unwrap();
        state.update_by(0.1).unwrap();
        state.stop();

        for _ in 0..5 {
            state.update_by(0.1).unwrap();
        }
        assert!(state.stopped());
        assert_eq!(state.count(), 1);
        assert_eq!(calls.get(), 1);

        state.next(0).unwrap();
        assert!(!state.stopped());
        state.update_by(0.1).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn stop_from_callback_keeps_state() {
        let mut state = ActionState::new();
        state.define(0, |state| {
            state.stop();
            Ok(())
        });
        state.next(0).unwrap();
        state.update_by(0.1).unwrap();
        state.update_by(0.1).unwrap();

        assert_eq!(state.current(), 0);
        assert_eq!(state.count(), 1);
        assert!(state.stopped());
    }

    #[test]
    fn fault_routes_to_error_state() {
        let received = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&received);
        let mut state = ActionState::new();
        state
            .define(0, |_| Err(anyhow!("broken tick")))
            .on_error(move |_, fault| {
                *sink.borrow_mut() = Some(fault.to_string());
                Ok(())
            });

        state.next(0).unwrap();
        state.update_by(0.1).unwrap();
        assert_eq!(state.current(), ERROR_STATE);
        assert!(state.in_error());
        assert_eq!(state.previous(), 0);
        assert!(received.borrow().is_none());

        state.update_by(0.1).unwrap();
        assert_eq!(received.borrow().as_deref(), Some("broken tick"));
        assert_eq!(state.count(), 1);
    }

    #[test]
    fn unhandled_fault_stops_and_propagates() {
        let mut state = ActionState::new();
        state.define(0, |_| Err(anyhow!("no handler")));
        state.next(0).unwrap();

        let error = state.update_by(0.1).unwrap_err();
        match error {
            ActionStateError::Fault { state: id, source } => {
                assert_eq!(id, 0);
                assert_eq!(source.to_string(), "no handler");
            }
            other => panic!("Expected Fault, got {other:?}"),
        }
        assert!(state.stopped());
        assert_eq!(state.current(), 0);
    }

    #[test]
    fn fault_in_error_state_is_not_rerouted() {
        let mut state = ActionState::new();
        state
            .define(0, |_| Err(anyhow!("first")))
            .on_error(|_, _| Err(anyhow!("handler failed")));

        state.next(0).unwrap();
        state.update_by(0.1).unwrap();

        let error = state.update_by(0.1).unwrap_err();
        assert_eq!(error.state(), Some(ERROR_STATE));
        assert!(state.stopped());
    }

    #[test]
    fn destroy_calls_hook_once_and_clears() {
        let calls = counter();
        let seen = Rc::clone(&calls);
        let mut state = ActionState::new();
        state.define(0, |_| Ok(())).on_destroy(move || seen.set(seen.get() + 1));
        state.next(0).unwrap();
        state.update_by(0.1).unwrap();

        state.destroy();
        state.destroy();

        assert_eq!(calls.get(), 1);
        assert_eq!(state.current(), NONE_STATE);
        assert_eq!(state.previous(), NONE_STATE);
        assert_eq!(state.run_count(), 0);
        assert_eq!(state.count(), 0);

        state.update_by(0.1).unwrap();
        assert_eq!(state.count(), 0);
    }

    #[test]
    fn on_destroy_last_write_wins() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (first, second) = (Rc::clone(&log), Rc::clone(&log));
        let mut state = ActionState::new();
        state
            .on_destroy(move || first.borrow_mut().push("first"))
            .on_destroy(move || second.borrow_mut().push("second"));

        state.destroy();
        assert_eq!(*log.borrow(), vec!["second"]);
    }

    #[test]
    fn destroy_from_callback_is_safe() {
        let mut state = ActionState::new();
        state.define(0, |state| {
            state.destroy();
            Ok(())
        });
        state.next(0).unwrap();
        state.update_by(0.1).unwrap();

        assert!(!state.is_entered());
        state.update_by(0.1).unwrap();
        assert_eq!(state.count(), 0);
    }

    #[test]
    fn entry_guards_against_reentry() {
        let calls = counter();
        let seen = Rc::clone(&calls);
        let mut state = ActionState::new();
        state.entry(move |_| {
            seen.set(seen.get() + 1);
            Ok(())
        })
        .unwrap();
        assert_eq!(state.current(), ENTRY_STATE);

        let error = state.entry(|_| Ok(())).unwrap_err();
        assert!(matches!(
            error,
            ActionStateError::AlreadyEntered { current: ENTRY_STATE }
        ));

        state.update_by(0.1).unwrap();
        assert_eq!(calls.get(), 1);

        state.destroy();
        assert!(state.entry(|_| Ok(())).is_ok());
    }

    #[test]
    fn history_records_transitions_when_enabled() {
        let mut state = ActionState::builder().history_capacity(4).build().unwrap();
        state
            .define(0, |state| {
                state.change(1)?;
                Ok(())
            })
            .define(1, |_| Ok(()));

        state.next(0).unwrap();
        state.update_by(0.1).unwrap();

        let kinds: Vec<TransitionKind> = state.history().records().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![TransitionKind::Next, TransitionKind::Change]);
        assert_eq!(state.history().path(), vec![0, 1]);
        assert!(ActionState::new().history().is_empty());
    }
}
