//! Gated, panic-safe dispatch of named operations.
//!
//! An invocation is a single pass through ordered gates. The first gate
//! that fails short-circuits to the fallback; passing every gate runs the
//! operation exactly once.
//!
//! | # | gate | on failure |
//! |---|---|---|
//! | 1 | feature is registered | report `FeatureNotRegistered` |
//! | 2 | feature is not faulted | silent |
//! | 3 | operation exists | report `OperationNotFound` |
//! | 4 | operation takes one argument | report `OperationArityInvalid` |
//! | 5 | context fits the parameter | report `OperationSignatureMismatch` |
//! | 6 | feature is active | silent |
//! | 7 | operation runs to completion | latch, report `OperationFaulted` |
//!
//! Gates 6 and 7 run feature code. A panic there, or an `Err` returned by
//! the operation, latches the feature's fault flag; a faulted feature is
//! bypassed until it is registered again.

use crate::{
    notifier::Notifier,
    registry::{Registry, RegistryEntry},
};
use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};
use toggled_core::{Context, DispatchError, Event, EventKind, Fault};

/// A fallback slot holding nothing, for call sites that don't need one.
pub const NO_FALLBACK: Option<fn()> = None;

/// The path an invocation took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operation ran to completion.
    Executed,
    /// The feature was already faulted.
    Bypassed,
    /// The activation predicate returned `false`.
    Inactive,
    /// A gate rejected the call and reported an event of this kind.
    Rejected(EventKind),
    /// Feature code faulted during this call.
    Faulted,
}

impl Outcome {
    /// Returns `true` if the operation ran to completion.
    pub fn is_executed(&self) -> bool {
        matches!(self, Outcome::Executed)
    }

    /// Returns `true` if the fallback slot was used.
    pub fn fell_back(&self) -> bool {
        !self.is_executed()
    }
}

/// Why a gate stopped an invocation.
#[derive(Debug)]
enum ShortCircuit {
    /// Fall back without an event.
    Silent(Outcome),
    /// Fall back and notify listeners.
    Reported(DispatchError),
}

/// Dispatches invocations against a registry and reports through a
/// notifier.
#[derive(Clone, Debug)]
pub struct Invoker {
    registry: Arc<Registry>,
    notifier: Arc<Notifier>,
}

impl Invoker {
    /// Create an invoker over a registry and a notifier.
    pub fn new(registry: Arc<Registry>, notifier: Arc<Notifier>) -> Self {
        Self { registry, notifier }
    }

    /// The registry features are resolved from.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The notifier events are reported through.
    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    /// Invoke `operation` on `feature`, running `fallback` if it doesn't
    /// execute.
    ///
    /// Never panics because of feature code. A panic raised by `fallback`
    /// itself propagates.
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
        let _ = self.try_invoke(context, feature, operation, fallback, options);
    }

    /// Like [`Invoker::invoke`], returning the path the invocation took.
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
        let context = context.into();
        tracing::trace!(feature, operation, context = context.type_name(), "invoking");

        let outcome = match self.dispatch(context, feature, operation, options) {
            Ok(()) => return Outcome::Executed,
            Err(ShortCircuit::Silent(outcome)) => {
                tracing::debug!(feature, operation, ?outcome, "falling back");
                outcome
            }
            Err(ShortCircuit::Reported(err)) => {
                let kind = err.kind();
                if kind == EventKind::OperationFaulted {
                    tracing::error!(feature, operation, error = %err, "feature faulted");
                } else {
                    tracing::warn!(feature, operation, %kind, error = %err, "invocation rejected");
                }
                self.notifier.notify_all(Event::from(err));
                match kind {
                    EventKind::OperationFaulted => Outcome::Faulted,
                    kind => Outcome::Rejected(kind),
                }
            }
        };

        if let Some(fallback) = fallback {
            fallback();
        }
        outcome
    }

    fn dispatch(
        &self,
        context: Context<'_>,
        feature: &str,
        operation: &str,
        options: &[&dyn Any],
    ) -> Result<(), ShortCircuit> {
        let entry = self.registry.lookup(feature).ok_or_else(|| {
            ShortCircuit::Reported(DispatchError::FeatureNotRegistered {
                feature: feature.to_owned(),
            })
        })?;

        if entry.is_faulted() {
            return Err(ShortCircuit::Silent(Outcome::Bypassed));
        }

        let signature = entry.signature(operation).ok_or_else(|| {
            ShortCircuit::Reported(DispatchError::OperationNotFound {
                feature: feature.to_owned(),
                operation: operation.to_owned(),
            })
        })?;

        let [param] = signature.params() else {
            return Err(ShortCircuit::Reported(
                DispatchError::OperationArityInvalid {
                    feature: feature.to_owned(),
                    operation: operation.to_owned(),
                    arity: signature.arity(),
                },
            ));
        };

        if !param.accepts(&context) {
            return Err(ShortCircuit::Reported(
                DispatchError::OperationSignatureMismatch {
                    feature: feature.to_owned(),
                    operation: operation.to_owned(),
                    expected: param.type_name(),
                    found: context.type_name(),
                },
            ));
        }

        match guarded(|| entry.feature().active_if(context, options)) {
            Ok(true) => {}
            Ok(false) => return Err(ShortCircuit::Silent(Outcome::Inactive)),
            Err(fault) => return Err(latch(&entry, operation, fault)),
        }

        match guarded(|| entry.feature().call(operation, context)) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(latch(&entry, operation, Fault::from(err))),
            Err(fault) => Err(latch(&entry, operation, fault)),
        }
    }
}

/// Run feature code, converting a panic into a [`Fault`].
fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, Fault> {
    catch_unwind(AssertUnwindSafe(f)).map_err(Fault::from_panic)
}

/// Latch the entry. Only the call that flips the latch reports the fault.
fn latch(entry: &RegistryEntry, operation: &str, fault: Fault) -> ShortCircuit {
    if entry.latch() {
        ShortCircuit::Reported(DispatchError::OperationFaulted {
            feature: entry.name().to_owned(),
            operation: operation.to_owned(),
            fault,
        })
    } else {
        tracing::debug!(feature = entry.name(), operation, %fault, "fault already latched");
        ShortCircuit::Silent(Outcome::Faulted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FallbackCounter, RecordingListener, ScriptedFeature};
    use std::thread;
    use toggled_core::{Feature, Operations};

    fn setup() -> (Invoker, ScriptedFeature, RecordingListener) {
        let registry = Arc::new(Registry::new());
        let notifier = Arc::new(Notifier::new());
        let feature = ScriptedFeature::new(true);
        registry.register("f", feature.clone());
        let recorder = RecordingListener::new();
        notifier.add_listener(recorder.clone());
        (Invoker::new(registry, notifier), feature, recorder)
    }

    #[test]
    fn test_executes_active_operation() {
        let (invoker, feature, recorder) = setup();
        let counter = FallbackCounter::new();
        let hi = String::from("hi");

        let outcome = invoker.try_invoke(&hi, "f", "record", Some(counter.fallback()), &[]);
        invoker.notifier().wait();

        assert_eq!(outcome, Outcome::Executed);
        assert_eq!(feature.calls(), ["record:hi"]);
        assert_eq!(counter.count(), 0);
        assert_eq!(recorder.count(), 0);
    }

    #[test]
    fn test_literal_and_owned_text_contexts() {
        let (invoker, feature, recorder) = setup();
        let owned = String::from("owned");

        let outcomes = [
            invoker.try_invoke(&"hi", "f", "record", NO_FALLBACK, &[]),
            invoker.try_invoke(&owned, "f", "record", NO_FALLBACK, &[]),
            invoker.try_invoke(&"there", "f", "maybe", NO_FALLBACK, &[]),
        ];
        invoker.notifier().wait();

        assert!(outcomes.iter().all(Outcome::is_executed));
        assert_eq!(feature.calls(), ["record:hi", "record:owned", "maybe:there"]);
        assert_eq!(feature.activations()[0], "hi:[]");
        assert_eq!(recorder.count(), 0);
    }

    #[test]
    fn test_unregistered_feature_falls_back_and_reports() {
        let (invoker, _, recorder) = setup();
        let counter = FallbackCounter::new();

        let outcome = invoker.try_invoke(
            Context::none(),
            "missing",
            "record",
            Some(counter.fallback()),
            &[],
        );
        invoker.invoke(Context::none(), "missing", "record", NO_FALLBACK, &[]);
        invoker.notifier().wait();

        assert_eq!(outcome, Outcome::Rejected(EventKind::FeatureNotRegistered));
        assert_eq!(counter.count(), 1);
        assert_eq!(
            recorder.kinds(),
            [EventKind::FeatureNotRegistered, EventKind::FeatureNotRegistered]
        );
        let event = &recorder.events()[0];
        assert_eq!(event.dispatch_error().unwrap().feature(), "missing");
    }

    #[test]
    fn test_inactive_feature_falls_back_silently() {
        let (invoker, feature, recorder) = setup();
        feature.set_active(false);
        let counter = FallbackCounter::new();
        let hi = String::from("hi");

        let outcome = invoker.try_invoke(&hi, "f", "record", Some(counter.fallback()), &[]);
        invoker.notifier().wait();

        assert_eq!(outcome, Outcome::Inactive);
        assert!(feature.calls().is_empty());
        assert_eq!(counter.count(), 1);
        assert_eq!(recorder.count(), 0);
    }

    #[test]
    fn test_options_reach_the_predicate() {
        let (invoker, feature, _) = setup();
        let hi = String::from("hi");

        invoker.invoke(&hi, "f", "record", NO_FALLBACK, &[&"opt1", &"opt2"]);

        assert_eq!(feature.activations(), ["hi:[opt1 opt2]"]);
    }

    #[test]
    fn test_panic_latches_and_reports_once() {
        let (invoker, feature, recorder) = setup();
        let counter = FallbackCounter::new();
        let hi = String::from("hi");

        let first = invoker.try_invoke(&hi, "f", "explode", Some(counter.fallback()), &[]);
        let second = invoker.try_invoke(&hi, "f", "explode", Some(counter.fallback()), &[]);
        let third = invoker.try_invoke(&hi, "f", "record", Some(counter.fallback()), &[]);
        invoker.notifier().wait();

        assert_eq!(first, Outcome::Faulted);
        assert_eq!(second, Outcome::Bypassed);
        assert_eq!(third, Outcome::Bypassed);
        assert_eq!(counter.count(), 3);
        assert!(feature.calls().is_empty());
        assert_eq!(recorder.kinds(), [EventKind::OperationFaulted]);
        assert!(recorder.events()[0].to_string().contains("expected panic"));

        assert!(invoker.registry().lookup("f").unwrap().is_faulted());
        assert!(!invoker.registry().is_active("f"));
    }

    #[test]
    fn test_error_outcome_is_a_fault() {
        let (invoker, _, recorder) = setup();
        let hi = String::from("hi");

        let outcome = invoker.try_invoke(&hi, "f", "fail", NO_FALLBACK, &[]);
        invoker.notifier().wait();

        assert_eq!(outcome, Outcome::Faulted);
        let events = recorder.events();
        let Some(DispatchError::OperationFaulted { fault, .. }) = events[0].dispatch_error() else {
            panic!("expected a fault event");
        };
        assert!(!fault.is_panic());
        assert_eq!(fault.to_string(), "expected failure");
    }

    #[test]
    fn test_reregistration_heals() {
        let (invoker, feature, _) = setup();
        let hi = String::from("hi");

        invoker.invoke(&hi, "f", "explode", NO_FALLBACK, &[]);
        assert!(invoker.registry().lookup("f").unwrap().is_faulted());

        invoker.registry().register("f", feature.clone());
        let outcome = invoker.try_invoke(&hi, "f", "record", NO_FALLBACK, &[]);

        assert_eq!(outcome, Outcome::Executed);
        assert_eq!(feature.calls(), ["record:hi"]);
    }

    #[test]
    fn test_unknown_operation_is_reported() {
        let (invoker, _, recorder) = setup();
        let counter = FallbackCounter::new();
        let hi = String::from("hi");

        let outcome = invoker.try_invoke(&hi, "f", "Record", Some(counter.fallback()), &[]);
        invoker.notifier().wait();

        assert_eq!(outcome, Outcome::Rejected(EventKind::OperationNotFound));
        assert_eq!(counter.count(), 1);
        assert_eq!(recorder.kinds(), [EventKind::OperationNotFound]);
        assert!(!invoker.registry().lookup("f").unwrap().is_faulted());
    }

    #[test]
    fn test_wrong_arity_is_reported_every_call() {
        let (invoker, feature, recorder) = setup();
        let counter = FallbackCounter::new();
        let hi = String::from("hi");

        for operation in ["nullary", "pair", "nullary"] {
            let outcome = invoker.try_invoke(&hi, "f", operation, Some(counter.fallback()), &[]);
            assert_eq!(outcome, Outcome::Rejected(EventKind::OperationArityInvalid));
        }
        invoker.notifier().wait();

        assert!(feature.calls().is_empty());
        assert_eq!(counter.count(), 3);
        assert_eq!(recorder.count(), 3);
        assert!(!invoker.registry().lookup("f").unwrap().is_faulted());

        let arities: Vec<_> = recorder
            .events()
            .iter()
            .filter_map(|event| match event.dispatch_error() {
                Some(DispatchError::OperationArityInvalid { arity, .. }) => Some(*arity),
                _ => None,
            })
            .collect();
        assert_eq!(arities.len(), 3);
        assert!(arities.contains(&0) && arities.contains(&2));
    }

    #[test]
    fn test_signature_mismatch_does_not_enter_operation() {
        let (invoker, feature, recorder) = setup();
        let counter = FallbackCounter::new();

        let outcome = invoker.try_invoke(&42_i32, "f", "record", Some(counter.fallback()), &[]);
        invoker.notifier().wait();

        assert_eq!(
            outcome,
            Outcome::Rejected(EventKind::OperationSignatureMismatch)
        );
        assert!(feature.calls().is_empty());
        assert!(feature.activations().is_empty());
        assert_eq!(counter.count(), 1);

        let events = recorder.events();
        let Some(DispatchError::OperationSignatureMismatch {
            expected, found, ..
        }) = events[0].dispatch_error()
        else {
            panic!("expected a mismatch event");
        };
        assert_eq!(*expected, "str");
        assert_eq!(*found, "i32");
    }

    #[test]
    fn test_absent_context_compatibility() {
        let (invoker, feature, recorder) = setup();

        let by_ref = invoker.try_invoke(Context::none(), "f", "record", NO_FALLBACK, &[]);
        let nullable = invoker.try_invoke(Context::none(), "f", "maybe", NO_FALLBACK, &[]);
        let untyped = invoker.try_invoke(Context::none(), "f", "record_any", NO_FALLBACK, &[]);
        invoker.notifier().wait();

        assert_eq!(
            by_ref,
            Outcome::Rejected(EventKind::OperationSignatureMismatch)
        );
        assert_eq!(nullable, Outcome::Executed);
        assert_eq!(untyped, Outcome::Executed);
        assert_eq!(feature.calls(), ["maybe:<none>", "record_any:<<none>>"]);
        assert_eq!(recorder.count(), 1);
    }

    struct PanickyPredicate;

    impl PanickyPredicate {
        fn run(&self, _: &str) {}
    }

    impl Feature for PanickyPredicate {
        fn active_if(&self, _: Context<'_>, _: &[&dyn Any]) -> bool {
            panic!("predicate exploded")
        }

        fn operations(ops: &mut Operations<Self>) {
            ops.add("run", Self::run);
        }
    }

    #[test]
    fn test_panicking_predicate_is_a_fault() {
        let (invoker, _, recorder) = setup();
        invoker.registry().register("panicky", PanickyPredicate);
        let counter = FallbackCounter::new();
        let hi = String::from("hi");

        let outcome = invoker.try_invoke(&hi, "panicky", "run", Some(counter.fallback()), &[]);
        invoker.notifier().wait();

        assert_eq!(outcome, Outcome::Faulted);
        assert_eq!(counter.count(), 1);
        assert_eq!(recorder.kinds(), [EventKind::OperationFaulted]);
        assert!(invoker.registry().lookup("panicky").unwrap().is_faulted());
    }

    #[test]
    fn test_concurrent_faults_report_once() {
        let (invoker, _, recorder) = setup();
        let counter = FallbackCounter::new();

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let hi = String::from("hi");
                    invoker.invoke(&hi, "f", "explode", Some(counter.fallback()), &[]);
                });
            }
        });
        invoker.notifier().wait();

        assert_eq!(counter.count(), 8);
        assert_eq!(recorder.kinds(), [EventKind::OperationFaulted]);
    }

    fn exploding_fallback() {
        panic!("fallback exploded");
    }

    #[test]
    fn test_fallback_panic_propagates() {
        let (invoker, _, _) = setup();

        let result = catch_unwind(AssertUnwindSafe(|| {
            invoker.invoke(Context::none(), "missing", "op", Some(exploding_fallback), &[]);
        }));

        assert!(result.is_err());
        invoker.notifier().wait();
    }
}
