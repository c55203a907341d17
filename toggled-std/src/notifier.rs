//! Concurrent event fan-out.
//!
//! [`Notifier::notify_all`] hands every registered listener its own
//! delivery thread and returns immediately. [`Notifier::wait`] is the only
//! synchronization point: it blocks until every delivery scheduled so far,
//! by any caller, has finished.
//!
//! The listener list and the in-flight counter are guarded separately. The
//! list lock is only held long enough to snapshot the listeners, so a
//! listener may itself add listeners or notify without deadlocking.

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Condvar, Mutex, PoisonError},
    thread,
};
use toggled_core::{Event, Fault, Listener};

/// Default name of delivery threads.
pub const DEFAULT_THREAD_NAME: &str = "toggled-notify";

/// Notifier configuration.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Name given to every delivery thread.
    pub thread_name: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
        }
    }
}

/// Counter of deliveries that have been scheduled but not finished.
#[derive(Default)]
struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
}

impl InFlight {
    fn begin(self: &Arc<Self>) -> DeliveryGuard {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        DeliveryGuard {
            in_flight: Arc::clone(self),
        }
    }

    fn finish(&self) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count -= 1;
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn current(&self) -> usize {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait(&self) {
        let count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        let _idle = self
            .idle
            .wait_while(count, |count| *count > 0)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

/// Marks one delivery as finished when dropped, including by unwinding.
struct DeliveryGuard {
    in_flight: Arc<InFlight>,
}

impl Drop for DeliveryGuard {
    fn drop(&mut self) {
        self.in_flight.finish();
    }
}

/// Fans events out to listeners.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
/// use toggled_core::{Event, EventKind};
/// use toggled_std::Notifier;
///
/// let notifier = Notifier::new();
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&seen);
/// notifier.add_listener(move |_: &Event| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// notifier.notify_all(Event::new(EventKind::OperationFaulted, "boom"));
/// notifier.wait();
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
pub struct Notifier {
    listeners: Mutex<Vec<Arc<dyn Listener>>>,
    in_flight: Arc<InFlight>,
    config: NotifierConfig,
}

impl Notifier {
    /// Create a notifier with the default configuration.
    pub fn new() -> Self {
        Self::with_config(NotifierConfig::default())
    }

    /// Create a notifier with the given configuration.
    pub fn with_config(config: NotifierConfig) -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            in_flight: Arc::new(InFlight::default()),
            config,
        }
    }

    /// Append a listener. Listeners are never removed.
    pub fn add_listener<L: Listener>(&self, listener: L) {
        self.add_shared(Arc::new(listener));
    }

    /// Append an already shared listener.
    pub fn add_shared(&self, listener: Arc<dyn Listener>) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.push(listener);
        tracing::debug!(listeners = listeners.len(), "listener added");
    }

    /// Schedule one delivery of `event` per registered listener.
    ///
    /// Returns without waiting for the deliveries.
    pub fn notify_all(&self, event: Event) {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        tracing::trace!(kind = %event.kind(), listeners = listeners.len(), "notifying");

        for listener in listeners {
            let guard = self.in_flight.begin();
            let job = {
                let listener = Arc::clone(&listener);
                let event = event.clone();
                move || {
                    let _guard = guard;
                    deliver(&*listener, &event);
                }
            };

            let spawned = thread::Builder::new()
                .name(self.config.thread_name.clone())
                .spawn(job);
            if let Err(err) = spawned {
                tracing::warn!(error = %err, "failed to spawn delivery thread, delivering inline");
                let _guard = self.in_flight.begin();
                deliver(&*listener, &event);
            }
        }
    }

    /// Block until every delivery scheduled so far has finished.
    pub fn wait(&self) {
        self.in_flight.wait();
    }

    /// Get the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Get the number of deliveries still running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.current()
    }

    /// The configuration this notifier was built with.
    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listener_count())
            .field("in_flight", &self.in_flight())
            .field("config", &self.config)
            .finish()
    }
}

fn deliver(listener: &dyn Listener, event: &Event) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener.listen(event))) {
        let fault = Fault::from_panic(payload);
        tracing::warn!(kind = %event.kind(), %fault, "listener panicked");
    }
}
