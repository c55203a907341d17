//! # Event Listener
//!
//! A Listener is an external observer of dispatch [`Event`]s. Every
//! registered listener receives every event exactly once, on its own
//! delivery task, independently of every other listener.
//!
//! Listeners are the only way an operator learns that a feature is missing
//! or broken: the caller of an invocation only ever sees its fallback run.

use crate::event::Event;

/// An observer of dispatch events.
///
/// Implemented for every `Fn(&Event) + Send + Sync + 'static` closure.
///
/// # Example
///
/// ```rust
/// use toggled_core::{Event, Listener};
///
/// struct Stderr;
///
/// impl Listener for Stderr {
///     fn listen(&self, event: &Event) {
///         eprintln!("{event}");
///     }
/// }
///
/// fn accepts(_: impl Listener) {}
/// accepts(Stderr);
/// accepts(|event: &Event| eprintln!("{}", event.kind()));
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Listener`",
    label = "missing `Listener` implementation",
    note = "Listeners must implement `listen(&self, event: &Event)` and be `Send + Sync + 'static`."
)]
pub trait Listener: Send + Sync + 'static {
    /// Called once per delivered event.
    fn listen(&self, event: &Event);
}

// Blanket impl for closures
impl<F> Listener for F
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    fn listen(&self, event: &Event) {
        (self)(event)
    }
}
