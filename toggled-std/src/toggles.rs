//! The toggles context object.
//!
//! [`Toggles`] owns a [`Registry`] and a [`Notifier`] and exposes the whole
//! public surface: registration, invocation, activation checks and event
//! delivery. Clones share the same registry and notifier.

use crate::{
    invocation::Invocation,
    invoker::{Invoker, Outcome},
    notifier::{Notifier, NotifierConfig},
    registry::Registry,
};
use std::{any::Any, fmt, sync::Arc};
use toggled_core::{Context, Event, Feature, Listener};

type Registration = Box<dyn FnOnce(&Registry) + Send>;

/// A registry of features, an invoker over it and a notifier for its
/// events.
///
/// # Example
///
/// ```rust
/// use std::any::Any;
/// use toggled_core::{Context, Feature, Operations};
/// use toggled_std::{NO_FALLBACK, Toggles};
///
/// struct Greeter;
///
/// impl Greeter {
///     fn greet(&self, name: &str) {
///         println!("hello {name}");
///     }
/// }
///
/// impl Feature for Greeter {
///     fn active_if(&self, _: Context<'_>, _: &[&dyn Any]) -> bool {
///         true
///     }
///
///     fn operations(ops: &mut Operations<Self>) {
///         ops.add("greet", Greeter::greet);
///     }
/// }
///
/// let toggles = Toggles::new();
/// toggles.register("greeter", Greeter);
///
/// let name = String::from("world");
/// toggles.invoke(&name, "greeter", "greet", NO_FALLBACK, &[]);
/// toggles.invoke(&name, "missing", "greet", Some(|| println!("fallback")), &[]);
/// toggles.wait();
/// ```
#[derive(Clone, Debug)]
pub struct Toggles {
    invoker: Invoker,
}

impl Toggles {
    /// Create toggles with an empty registry and no listeners.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start building toggles.
    pub fn builder() -> TogglesBuilder {
        TogglesBuilder::new()
    }

    /// Create toggles with every statically submitted feature registered.
    #[cfg(feature = "inventory")]
    pub fn with_static_features() -> Self {
        Self::builder().static_features().build()
    }

    /// Register a feature under `name`, replacing any previous one.
    ///
    /// # Panics
    ///
    /// Panics if the feature defines two operations with the same name.
    pub fn register<F: Feature>(&self, name: impl Into<String>, feature: F) {
        self.registry().register(name, feature);
    }

    /// Invoke `operation` on `feature`, running `fallback` if it doesn't
    /// execute. See [`Invoker::invoke`].
    pub fn invoke<'c, B>(
        &self,
        context: impl Into<Context<'c>>,
        feature: &str,
        operation: &str,
        fallback: Option<B>,
        options: &[&dyn Any],
    ) where
        B: FnOnce(),
    {
        self.invoker
            .invoke(context, feature, operation, fallback, options);
    }

    /// Like [`Toggles::invoke`], returning the path the invocation took.
    pub fn try_invoke<'c, B>(
        &self,
        context: impl Into<Context<'c>>,
        feature: &str,
        operation: &str,
        fallback: Option<B>,
        options: &[&dyn Any],
    ) -> Outcome
    where
        B: FnOnce(),
    {
        self.invoker
            .try_invoke(context, feature, operation, fallback, options)
    }

    /// Start a builder-style invocation.
    pub fn call<'a>(&'a self, feature: &'a str, operation: &'a str) -> Invocation<'a> {
        Invocation::new(&self.invoker, feature, operation)
    }

    /// See [`Registry::is_active`].
    pub fn is_active(&self, name: &str) -> bool {
        self.registry().is_active(name)
    }

    /// See [`Registry::active_if`].
    pub fn active_if(&self, name: &str, context: Context<'_>, options: &[&dyn Any]) -> bool {
        self.registry().active_if(name, context, options)
    }

    /// Append a listener.
    pub fn add_listener<L: Listener>(&self, listener: L) {
        self.notifier().add_listener(listener);
    }

    /// Deliver an event to every listener.
    pub fn notify_all(&self, event: Event) {
        self.notifier().notify_all(event);
    }

    /// Block until every scheduled delivery has finished.
    pub fn wait(&self) {
        self.notifier().wait();
    }

    /// The feature registry.
    pub fn registry(&self) -> &Registry {
        self.invoker.registry()
    }

    /// The event notifier.
    pub fn notifier(&self) -> &Notifier {
        self.invoker.notifier()
    }

    /// The invoker.
    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }
}

impl Default for Toggles {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TogglesBuilder
// ============================================================================

/// Builder for [`Toggles`].
///
/// # Example
///
/// ```rust,ignore
/// let toggles = Toggles::builder()
///     .thread_name("app-notify")
///     .listener(LoggingListener::new())
///     .feature("greeter", Greeter)
///     .build();
/// ```
#[must_use = "a builder does nothing until `build` is called"]
pub struct TogglesBuilder {
    config: NotifierConfig,
    listeners: Vec<Arc<dyn Listener>>,
    features: Vec<Registration>,
    #[cfg(feature = "inventory")]
    static_features: bool,
}

impl TogglesBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self {
            config: NotifierConfig::default(),
            listeners: Vec::new(),
            features: Vec::new(),
            #[cfg(feature = "inventory")]
            static_features: false,
        }
    }

    /// Name the notifier's delivery threads.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Replace the notifier configuration.
    pub fn notifier_config(mut self, config: NotifierConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a listener.
    pub fn listener<L: Listener>(mut self, listener: L) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Register a feature on build.
    pub fn feature<F: Feature>(mut self, name: impl Into<String>, feature: F) -> Self {
        let name = name.into();
        self.features
            .push(Box::new(move |registry: &Registry| registry.register(name, feature)));
        self
    }

    /// Register every statically submitted feature on build.
    ///
    /// Static features are registered first, so features added with
    /// [`TogglesBuilder::feature`] replace them.
    #[cfg(feature = "inventory")]
    pub fn static_features(mut self) -> Self {
        self.static_features = true;
        self
    }

    /// Build the toggles.
    pub fn build(self) -> Toggles {
        let registry = Arc::new(Registry::new());
        #[cfg(feature = "inventory")]
        if self.static_features {
            crate::statics::register_all(&registry);
        }
        for register in self.features {
            register(&registry);
        }

        let notifier = Arc::new(Notifier::with_config(self.config));
        for listener in self.listeners {
            notifier.add_shared(listener);
        }

        Toggles {
            invoker: Invoker::new(registry, notifier),
        }
    }
}

impl Default for TogglesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TogglesBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TogglesBuilder")
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .field("features", &self.features.len())
            .finish_non_exhaustive()
    }
}
