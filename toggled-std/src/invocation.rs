//! Builder-style invocation.

use crate::invoker::{Invoker, Outcome};
use std::{any::Any, fmt};
use toggled_core::Context;

/// A pending invocation.
///
/// Built by [`Toggles::call`](crate::Toggles::call); nothing happens until
/// [`Invocation::run`].
///
/// # Example
///
/// ```rust,ignore
/// let name = String::from("hi");
/// let outcome = toggles
///     .call("greeter", "greet")
///     .context(&name)
///     .options(&[&"loud"])
///     .fallback(|| println!("greeter unavailable"))
///     .run();
/// ```
#[must_use = "an invocation does nothing until `run` is called"]
pub struct Invocation<'a> {
    invoker: &'a Invoker,
    feature: &'a str,
    operation: &'a str,
    context: Context<'a>,
    options: &'a [&'a dyn Any],
    fallback: Option<Box<dyn FnOnce() + 'a>>,
}

impl<'a> Invocation<'a> {
    pub(crate) fn new(invoker: &'a Invoker, feature: &'a str, operation: &'a str) -> Self {
        Self {
            invoker,
            feature,
            operation,
            context: Context::none(),
            options: &[],
            fallback: None,
        }
    }

    /// Set the context. Defaults to [`Context::none`].
    pub fn context(mut self, context: impl Into<Context<'a>>) -> Self {
        self.context = context.into();
        self
    }

    /// Set the options forwarded to the activation predicate.
    pub fn options(mut self, options: &'a [&'a dyn Any]) -> Self {
        self.options = options;
        self
    }

    /// Set the fallback.
    pub fn fallback(mut self, fallback: impl FnOnce() + 'a) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// Dispatch the invocation.
    pub fn run(self) -> Outcome {
        self.invoker.try_invoke(
            self.context,
            self.feature,
            self.operation,
            self.fallback,
            self.options,
        )
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("feature", &self.feature)
            .field("operation", &self.operation)
            .field("context", &self.context)
            .field("options", &self.options.len())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
