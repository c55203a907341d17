#![allow(dead_code)]

use std::{
    any::Any,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};
use toggled::{Context, Feature, Operations, Toggles, testing::RecordingListener};

// ============================================================================
// Test Features
// ============================================================================

/// Greets the context string. Can be switched off or made to panic.
#[derive(Clone, Default)]
pub struct Greeter {
    pub greeted: Arc<Mutex<Vec<String>>>,
    pub inactive: Arc<AtomicBool>,
    pub broken: Arc<AtomicBool>,
}

impl Greeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn greeted(&self) -> Vec<String> {
        self.greeted.lock().unwrap().clone()
    }

    pub fn deactivate(&self) {
        self.inactive.store(true, Ordering::SeqCst);
    }

    pub fn break_it(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    fn greet(&self, ctx: &str) {
        if self.broken.load(Ordering::SeqCst) {
            panic!("greeter is broken");
        }
        self.greeted.lock().unwrap().push(ctx.to_owned());
    }

    fn greet_both(&self, first: &i32, second: &i32) {
        self.greeted.lock().unwrap().push(format!("{first}+{second}"));
    }
}

impl Feature for Greeter {
    fn active_if(&self, _context: Context<'_>, _options: &[&dyn Any]) -> bool {
        !self.inactive.load(Ordering::SeqCst)
    }

    fn operations(ops: &mut Operations<Self>) {
        ops.add("greet", Greeter::greet)
            .add("greet_both", Greeter::greet_both);
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Toggles with a `Greeter` registered as "f" and a recording listener.
pub fn setup() -> (Toggles, Greeter, RecordingListener) {
    let greeter = Greeter::new();
    let recorder = RecordingListener::new();
    let toggles = Toggles::builder()
        .feature("f", greeter.clone())
        .listener(recorder.clone())
        .build();
    (toggles, greeter, recorder)
}
