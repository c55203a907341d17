//! The process-wide default [`Toggles`].
//!
//! Created on first use. With the `inventory` feature, every statically
//! submitted feature is registered at that point. Static constructors may
//! call back into this module; on the registering thread they see the
//! default toggles while registration is still in progress.

use crate::{invoker::Outcome, toggles::Toggles};
use std::{any::Any, sync::OnceLock};
use toggled_core::{Context, Event, Feature, Listener};

static TOGGLES: OnceLock<Toggles> = OnceLock::new();

/// The process-wide default toggles.
pub fn toggles() -> &'static Toggles {
    let toggles = TOGGLES.get_or_init(|| {
        tracing::debug!("default toggles created");
        Toggles::new()
    });
    #[cfg(feature = "inventory")]
    init::register_once(toggles);
    toggles
}

#[cfg(feature = "inventory")]
mod init {
    use crate::toggles::Toggles;
    use std::{cell::Cell, sync::Once};

    static REGISTERED: Once = Once::new();

    thread_local! {
        static REGISTERING: Cell<bool> = const { Cell::new(false) };
    }

    struct Registering;

    impl Registering {
        fn enter() -> Self {
            REGISTERING.set(true);
            Registering
        }
    }

    impl Drop for Registering {
        fn drop(&mut self) {
            REGISTERING.set(false);
        }
    }

    /// Register the submitted features into the default toggles.
    ///
    /// Other threads block until registration finishes. The registering
    /// thread itself passes straight through, so constructors may use the
    /// default toggles.
    pub(super) fn register_once(toggles: &Toggles) {
        if REGISTERING.get() {
            return;
        }
        REGISTERED.call_once(|| {
            let _registering = Registering::enter();
            crate::statics::register_all(toggles.registry());
            tracing::debug!(
                features = toggles.registry().len(),
                "static features registered"
            );
        });
    }
}

/// See [`Toggles::register`].
pub fn register<F: Feature>(name: impl Into<String>, feature: F) {
    toggles().register(name, feature);
}

/// See [`Toggles::invoke`].
pub fn invoke<'c, B>(
    context: impl Into<Context<'c>>,
    feature: &str,
    operation: &str,
    fallback: Option<B>,
    options: &[&dyn Any],
) where
    B: FnOnce(),
{
    toggles().invoke(context, feature, operation, fallback, options);
}

/// See [`Toggles::try_invoke`].
pub fn try_invoke<'c, B>(
    context: impl Into<Context<'c>>,
    feature: &str,
    operation: &str,
    fallback: Option<B>,
    options: &[&dyn Any],
) -> Outcome
where
    B: FnOnce(),
{
    toggles().try_invoke(context, feature, operation, fallback, options)
}

/// See [`Toggles::is_active`].
pub fn is_active(name: &str) -> bool {
    toggles().is_active(name)
}

/// See [`Toggles::active_if`].
pub fn active_if(name: &str, context: Context<'_>, options: &[&dyn Any]) -> bool {
    toggles().active_if(name, context, options)
}

/// See [`Toggles::add_listener`].
pub fn add_listener<L: Listener>(listener: L) {
    toggles().add_listener(listener);
}

/// See [`Toggles::notify_all`].
pub fn notify_all(event: Event) {
    toggles().notify_all(event);
}

/// See [`Toggles::wait`].
pub fn wait() {
    toggles().wait();
}
