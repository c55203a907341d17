//! Feature registry with a per-entry fault latch.
//!
//! The registry maps feature names to [`RegistryEntry`] values. Entries are
//! handed out as `Arc`s so that no lock is held while feature code runs;
//! re-registering a name swaps in a fresh entry and leaves in-flight
//! invocations holding the old one.

use std::{
    any::Any,
    collections::HashMap,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};
use toggled_core::{BoundFeature, Context, ErasedFeature, Fault, Feature, Signature};

/// A registered feature and its fault latch.
pub struct RegistryEntry {
    name: String,
    feature: Box<dyn ErasedFeature>,
    faulted: AtomicBool,
}

impl RegistryEntry {
    fn new(name: String, feature: Box<dyn ErasedFeature>) -> Self {
        Self {
            name,
            feature,
            faulted: AtomicBool::new(false),
        }
    }

    /// The name the feature was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type-erased feature.
    pub fn feature(&self) -> &dyn ErasedFeature {
        &*self.feature
    }

    /// The signature of a named operation.
    pub fn signature(&self, operation: &str) -> Option<&Signature> {
        self.feature.signature(operation)
    }

    /// Operation names, sorted.
    pub fn operation_names(&self) -> Vec<&str> {
        self.feature.operation_names()
    }

    /// Whether the latch has been set.
    pub fn is_faulted(&self) -> bool {
        self.faulted.load(Ordering::Acquire)
    }

    /// Set the latch.
    ///
    /// Returns `true` only for the call that flipped it, so that a fault is
    /// reported once per entry however many invocations race on it.
    pub(crate) fn latch(&self) -> bool {
        !self.faulted.swap(true, Ordering::AcqRel)
    }

    /// Evaluate the activation predicate without touching the latch.
    fn check_active(&self, context: Context<'_>, options: &[&dyn Any]) -> bool {
        if self.is_faulted() {
            return false;
        }
        match catch_unwind(AssertUnwindSafe(|| self.feature.active_if(context, options))) {
            Ok(active) => active,
            Err(payload) => {
                let fault = Fault::from_panic(payload);
                tracing::warn!(feature = %self.name, %fault, "activation predicate panicked");
                false
            }
        }
    }
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("name", &self.name)
            .field("feature", &self.feature.type_name())
            .field("faulted", &self.is_faulted())
            .finish()
    }
}

/// Thread-safe map of feature name to [`RegistryEntry`].
///
/// # Example
///
/// ```rust
/// use std::any::Any;
/// use toggled_core::{Context, Feature, Operations};
/// use toggled_std::Registry;
///
/// struct Always;
///
/// impl Feature for Always {
///     fn active_if(&self, _: Context<'_>, _: &[&dyn Any]) -> bool {
///         true
///     }
///
///     fn operations(_: &mut Operations<Self>) {}
/// }
///
/// let registry = Registry::new();
/// registry.register("always", Always);
/// assert!(registry.is_active("always"));
/// assert!(!registry.is_active("never"));
/// ```
#[derive(Default)]
pub struct Registry {
    entries: RwLock<HashMap<String, Arc<RegistryEntry>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a feature under `name`.
    ///
    /// An existing entry with the same name is replaced, which also clears
    /// its fault latch.
    ///
    /// # Panics
    ///
    /// Panics if the feature defines two operations with the same name.
    pub fn register<F: Feature>(&self, name: impl Into<String>, feature: F) {
        let name = name.into();
        let entry = Arc::new(RegistryEntry::new(
            name.clone(),
            Box::new(BoundFeature::new(feature)),
        ));
        let operations = entry.operation_names().join(",");

        let previous = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), entry);

        match previous {
            Some(previous) => tracing::info!(
                feature = %name,
                was_faulted = previous.is_faulted(),
                %operations,
                "feature replaced"
            ),
            None => tracing::debug!(feature = %name, %operations, "feature registered"),
        }
    }

    /// Look up an entry.
    pub fn lookup(&self, name: &str) -> Option<Arc<RegistryEntry>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Check if a feature is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Coarse liveness check.
    ///
    /// `false` if the feature is absent or faulted, otherwise its activation
    /// predicate evaluated against the absent context and no options.
    /// Never latches: a panicking predicate reads as inactive.
    pub fn is_active(&self, name: &str) -> bool {
        self.active_if(name, Context::none(), &[])
    }

    /// Like [`Registry::is_active`], with a caller-supplied context and
    /// options.
    pub fn active_if(&self, name: &str, context: Context<'_>, options: &[&dyn Any]) -> bool {
        self.lookup(name)
            .is_some_and(|entry| entry.check_active(context, options))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort_unstable();
        names
    }

    /// Get the number of registered features.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names())
            .finish()
    }
}
