//! Testing utilities for toggled.
//!
//! This module provides utilities to make testing features, fallbacks and
//! listeners easier.
//!
//! # Features
//!
//! - [`RecordingListener`]: A listener that records every event it receives
//! - [`FallbackCounter`]: A counter handing out fallbacks
//! - [`ScriptedFeature`]: A feature with a switchable predicate, a call log
//!   and operations of every supported shape

use std::{
    any::Any,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};
use toggled_core::{Context, Event, EventKind, Feature, Listener, Operations};

// ============================================================================
// Recording Listener
// ============================================================================

/// A listener that records all events it receives.
///
/// Clones share the same record, so keep one clone and hand the other to
/// the notifier.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingListener::new();
/// toggles.add_listener(recorder.clone());
///
/// toggles.invoke(Context::none(), "missing", "op", NO_FALLBACK, &[]);
/// toggles.wait();
/// assert_eq!(recorder.kinds(), [EventKind::FeatureNotRegistered]);
/// ```
#[derive(Clone, Default)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<Event>>>,
    delay: Option<Duration>,
}

impl RecordingListener {
    /// Create a new recording listener.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recording listener that sleeps before recording each event.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            events: Arc::default(),
            delay: Some(delay),
        }
    }

    /// Get a clone of the recorded events.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Get the kinds of the recorded events.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(Event::kind).collect()
    }

    /// Get the number of recorded events.
    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Clear all recorded events.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl Listener for RecordingListener {
    fn listen(&self, event: &Event) {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        self.events.lock().unwrap().push(event.clone());
    }
}

// ============================================================================
// Fallback Counter
// ============================================================================

/// Counts how many of its fallbacks ran.
///
/// # Example
///
/// ```rust,ignore
/// let counter = FallbackCounter::new();
/// toggles.invoke(Context::none(), "missing", "op", Some(counter.fallback()), &[]);
/// assert_eq!(counter.count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct FallbackCounter {
    count: Arc<AtomicUsize>,
}

impl FallbackCounter {
    /// Create a new counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fallback that bumps this counter.
    pub fn fallback(&self) -> impl FnOnce() + Send + 'static {
        let count = Arc::clone(&self.count);
        move || {
            count.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Get the number of fallbacks that ran.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Whether any fallback ran.
    pub fn ran(&self) -> bool {
        self.count() > 0
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

// ============================================================================
// Scripted Feature
// ============================================================================

#[derive(Default)]
struct Script {
    active: AtomicBool,
    calls: Mutex<Vec<String>>,
    activations: Mutex<Vec<String>>,
}

/// A feature whose activation can be switched at runtime and whose
/// operations record how they were called.
///
/// Clones share state, so a test can register one clone and inspect the
/// other.
///
/// | operation | shape | behavior |
/// |---|---|---|
/// | `record` | `&str` | logs `record:<ctx>` |
/// | `record_any` | `Context` | logs `record_any:<ctx>` |
/// | `maybe` | `Option<&str>` | logs `maybe:<ctx>` |
/// | `explode` | `&str` | panics with `"expected panic"` |
/// | `fail` | `&str` | returns `Err("expected failure")` |
/// | `nullary` | no argument | logs `nullary` |
/// | `pair` | `&i32, &i32` | logs `pair` |
#[derive(Clone, Default)]
pub struct ScriptedFeature {
    script: Arc<Script>,
}

impl ScriptedFeature {
    /// Create a feature with the given activation state.
    pub fn new(active: bool) -> Self {
        let feature = Self::default();
        feature.set_active(active);
        feature
    }

    /// Switch the activation predicate.
    pub fn set_active(&self, active: bool) {
        self.script.active.store(active, Ordering::SeqCst);
    }

    /// Operation calls, in order.
    pub fn calls(&self) -> Vec<String> {
        self.script.calls.lock().unwrap().clone()
    }

    /// Activation predicate calls, rendered as `context:[options]`.
    pub fn activations(&self) -> Vec<String> {
        self.script.activations.lock().unwrap().clone()
    }

    fn log(&self, call: String) {
        self.script.calls.lock().unwrap().push(call);
    }

    fn record(&self, context: &str) {
        self.log(format!("record:{context}"));
    }

    fn record_any(&self, context: Context<'_>) {
        self.log(format!("record_any:{}", describe_context(context)));
    }

    fn maybe(&self, context: Option<&str>) {
        self.log(format!("maybe:{}", context.unwrap_or("<none>")));
    }

    fn explode(&self, _context: &str) {
        panic!("expected panic");
    }

    fn fail(&self, _context: &str) -> Result<(), String> {
        Err("expected failure".to_owned())
    }

    fn nullary(&self) {
        self.log("nullary".to_owned());
    }

    fn pair(&self, _first: &i32, _second: &i32) {
        self.log("pair".to_owned());
    }
}

impl Feature for ScriptedFeature {
    fn active_if(&self, context: Context<'_>, options: &[&dyn Any]) -> bool {
        let options: Vec<_> = options.iter().map(|opt| describe(*opt)).collect();
        self.script.activations.lock().unwrap().push(format!(
            "{}:[{}]",
            describe_context(context),
            options.join(" ")
        ));
        self.script.active.load(Ordering::SeqCst)
    }

    fn operations(ops: &mut Operations<Self>) {
        ops.add("record", Self::record)
            .add("record_any", Self::record_any)
            .add("maybe", Self::maybe)
            .add("explode", Self::explode)
            .add("fail", Self::fail)
            .add("nullary", Self::nullary)
            .add("pair", Self::pair);
    }
}

/// Render a context for call logs.
pub fn describe_context(context: Context<'_>) -> String {
    if let Some(value) = context.as_str() {
        value.to_owned()
    } else if let Some(value) = context.downcast_ref::<i32>() {
        value.to_string()
    } else if let Some(value) = context.downcast_ref::<bool>() {
        value.to_string()
    } else {
        format!("<{}>", context.type_name())
    }
}

/// Render an option for call logs.
pub fn describe(value: &dyn Any) -> String {
    if let Some(value) = value.downcast_ref::<&'static str>() {
        (*value).to_owned()
    } else if let Some(value) = value.downcast_ref::<String>() {
        value.clone()
    } else if let Some(value) = value.downcast_ref::<i32>() {
        value.to_string()
    } else if let Some(value) = value.downcast_ref::<bool>() {
        value.to_string()
    } else {
        "?".to_owned()
    }
}
