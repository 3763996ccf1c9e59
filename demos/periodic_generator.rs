//! Periodic Generator
//!
//! This example drives an action state from a fixed-step frame loop to spawn
//! an object every `delay` seconds.
//!
//! Key concepts:
//! - Deferred transitions with `next`
//! - Reading `time()` inside a state callback
//! - A destroy hook for teardown
//!
//! Run with: cargo run --example periodic_generator

use action_state::ActionState;
use std::cell::RefCell;
use std::rc::Rc;

const WAIT: i32 = 0;
const INTERVAL: i32 = 1;

struct Spawner {
    delay: f32,
    spawned: Rc<RefCell<Vec<u32>>>,
}

fn main() {
    println!("=== Periodic Generator Example ===\n");

    let spawner = Spawner {
        delay: 0.2,
        spawned: Rc::new(RefCell::new(Vec::new())),
    };

    let mut state = ActionState::builder()
        .name("periodic-generator")
        .fixed_delta(1.0 / 60.0)
        .build()
        .unwrap();

    let delay = spawner.delay;
    let spawned = Rc::clone(&spawner.spawned);
    let frames = Rc::new(RefCell::new(0u32));
    let frame = Rc::clone(&frames);

    state
        .define(WAIT, move |state| {
            if state.time() > delay {
                spawned.borrow_mut().push(*frame.borrow());
                state.next(INTERVAL)?;
            }
            Ok(())
        })
        .define(INTERVAL, |state| {
            state.next(WAIT)?;
            Ok(())
        })
        .on_destroy(|| println!("Generator destroyed"));

    state.next(WAIT).unwrap();

    for _ in 0..120 {
        *frames.borrow_mut() += 1;
        state.update().unwrap();
    }

    println!("Spawned on frames: {:?}", spawner.spawned.borrow());
    println!("Transitions: {}", state.run_count());

    state.destroy();

    println!("\n=== Example Complete ===");
}
