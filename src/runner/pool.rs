//! Free lists of runners, one per argument signature.
//!
//! Pools live for the lifetime of the thread and are shared by every machine
//! on it. Each pool is a LIFO stack with no eviction; its size tracks the
//! number of signatures in use, not transition volume. Machines hold `Rc`
//! callbacks and never cross threads, so a thread-local pool needs no lock.

use super::Runner;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static POOLS: RefCell<HashMap<TypeId, Vec<Box<dyn Any>>>> = RefCell::new(HashMap::new());
}

/// Take a free runner for argument tuple `A`, or build a new one.
pub fn rent<A: 'static>() -> Box<Runner<A>> {
    let reused = POOLS
        .try_with(|pools| {
            pools
                .borrow_mut()
                .get_mut(&TypeId::of::<A>())
                .and_then(Vec::pop)
        })
        .ok()
        .flatten();

    match reused.map(|runner| runner.downcast::<Runner<A>>()) {
        Some(Ok(runner)) => runner,
        _ => Box::new(Runner::empty()),
    }
}

/// Push a runner onto its free list. Bindings must already be cleared.
pub fn give_back<A: 'static>(runner: Box<Runner<A>>) {
    debug_assert!(!runner.is_bound());
    // During thread teardown the pool may already be gone; the runner is dropped.
    let _ = POOLS.try_with(|pools| {
        pools
            .borrow_mut()
            .entry(TypeId::of::<A>())
            .or_default()
            .push(runner);
    });
}

/// Number of free runners for argument tuple `A` on this thread.
pub fn available<A: 'static>() -> usize {
    POOLS
        .try_with(|pools| {
            pools
                .borrow()
                .get(&TypeId::of::<A>())
                .map_or(0, Vec::len)
        })
        .unwrap_or(0)
}
