//! # Feature Contract
//!
//! A Feature is a named, swappable unit of optional behavior. It has an
//! activation predicate and a table of named operations.
//!
//! Callers never depend on a feature's concrete type: the registry stores
//! features behind [`ErasedFeature`], and operations are resolved by name
//! at invocation time.

use crate::{
    context::Context,
    error::BoxError,
    operation::{Operations, Signature},
};
use std::any::{Any, type_name};

/// A unit of optional behavior.
///
/// # Example
///
/// ```rust
/// use std::any::Any;
/// use toggled_core::{Context, Feature, Operations};
///
/// struct Hello;
///
/// impl Hello {
///     fn say(&self, loud: &bool) {
///         if *loud {
///             println!("HELLO");
///         } else {
///             println!("hello");
///         }
///     }
/// }
///
/// impl Feature for Hello {
///     fn active_if(&self, context: Context<'_>, _options: &[&dyn Any]) -> bool {
///         context.downcast_ref::<bool>().is_some()
///     }
///
///     fn operations(ops: &mut Operations<Self>) {
///         ops.add("say", Hello::say);
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Feature`",
    label = "missing `Feature` implementation",
    note = "Implement `Feature` by hand or annotate an inherent impl block with `#[toggled::feature]`."
)]
pub trait Feature: Send + Sync + 'static {
    /// Whether the feature is active for this context and options.
    fn active_if(&self, context: Context<'_>, options: &[&dyn Any]) -> bool;

    /// Fill the operation table. Called once per registration.
    fn operations(ops: &mut Operations<Self>)
    where
        Self: Sized;
}

/// Object-safe view of a feature bound to its operation table.
pub trait ErasedFeature: Send + Sync + 'static {
    /// Evaluate the activation predicate.
    fn active_if(&self, context: Context<'_>, options: &[&dyn Any]) -> bool;

    /// The signature of a named operation.
    fn signature(&self, operation: &str) -> Option<&Signature>;

    /// Run a named operation.
    ///
    /// An unknown name yields an error rather than a panic.
    fn call(&self, operation: &str, context: Context<'_>) -> Result<(), BoxError>;

    /// Operation names, sorted.
    fn operation_names(&self) -> Vec<&str>;

    /// Name of the concrete feature type.
    fn type_name(&self) -> &'static str;
}

/// A feature together with the operation table it declared.
pub struct BoundFeature<F> {
    feature: F,
    operations: Operations<F>,
}

impl<F: Feature> BoundFeature<F> {
    /// Build the operation table for `feature`.
    pub fn new(feature: F) -> Self {
        let mut operations = Operations::new();
        F::operations(&mut operations);
        Self {
            feature,
            operations,
        }
    }

    /// The wrapped feature.
    pub fn feature(&self) -> &F {
        &self.feature
    }

    /// The operation table.
    pub fn operations(&self) -> &Operations<F> {
        &self.operations
    }
}

impl<F: Feature> ErasedFeature for BoundFeature<F> {
    fn active_if(&self, context: Context<'_>, options: &[&dyn Any]) -> bool {
        self.feature.active_if(context, options)
    }

    fn signature(&self, operation: &str) -> Option<&Signature> {
        self.operations.signature(operation)
    }

    fn call(&self, operation: &str, context: Context<'_>) -> Result<(), BoxError> {
        match self.operations.get(operation) {
            Some(op) => op.call(&self.feature, context),
            None => Err(format!("operation `{operation}` is not defined").into()),
        }
    }

    fn operation_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.operations.names().collect();
        names.sort_unstable();
        names
    }

    fn type_name(&self) -> &'static str {
        type_name::<F>()
    }
}
